//! Guaranteed resource group removal
//!
//! Deleting the group deletes the plan and every site with it. Failures
//! are logged and reported in the outcome but never escalated.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::{ResourceGroupHandle, TeardownOutcome};
use crate::error::TeardownError;
use crate::infrastructure::CloudProvider;

pub struct TeardownGuarantor {
    provider: Arc<dyn CloudProvider>,
}

impl TeardownGuarantor {
    pub fn new(provider: Arc<dyn CloudProvider>) -> Self {
        Self { provider }
    }

    pub async fn teardown(&self, group: Option<&ResourceGroupHandle>) -> TeardownOutcome {
        let Some(group) = group else {
            info!("Resource group was never created, nothing to clean up");
            return TeardownOutcome::NothingToCleanUp;
        };

        info!(resource_group = %group.name, "Deleting resource group");

        match self.provider.delete_resource_group(group).await {
            Ok(()) => {
                info!(resource_group = %group.name, "Resource group deleted");
                TeardownOutcome::Deleted {
                    name: group.name.clone(),
                }
            }
            Err(source) => {
                let err = TeardownError {
                    name: group.name.clone(),
                    source,
                };
                error!("{}", err);
                TeardownOutcome::Failed(err)
            }
        }
    }
}
