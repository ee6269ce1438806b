//! HTTP readiness probe
//!
//! A site counts as ready once its public URL answers with any status
//! below 400. Connection errors, timeouts and error statuses are all
//! "not ready yet" and described for the eventual timeout warning.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{ProbeOutcome, ReadinessProbe};

pub struct HttpReadinessProbe {
    client: Client,
}

impl HttpReadinessProbe {
    pub fn new(request_timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client for readiness probes")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ReadinessProbe for HttpReadinessProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!("{} answered HTTP {}", url, status.as_u16());

                if status.as_u16() < 400 {
                    ProbeOutcome::Ready {
                        status: status.as_u16(),
                    }
                } else {
                    ProbeOutcome::NotReady {
                        observation: format!("HTTP {}", status.as_u16()),
                    }
                }
            }
            Err(e) if e.is_timeout() => ProbeOutcome::NotReady {
                observation: "request timed out".to_string(),
            },
            Err(e) if e.is_connect() => ProbeOutcome::NotReady {
                observation: format!("connection failed: {}", e),
            },
            Err(e) => ProbeOutcome::NotReady {
                observation: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> HttpReadinessProbe {
        HttpReadinessProbe::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_success_status_is_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/helloworld"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Hello World!"))
            .mount(&server)
            .await;

        let outcome = probe()
            .probe(&format!("{}/helloworld", server.uri()))
            .await;
        assert_eq!(outcome, ProbeOutcome::Ready { status: 200 });
    }

    #[tokio::test]
    async fn test_error_status_is_not_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let outcome = probe().probe(&server.uri()).await;
        assert_eq!(
            outcome,
            ProbeOutcome::NotReady {
                observation: "HTTP 503".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_ready() {
        // Port 9 (discard) on localhost is closed in test environments
        let outcome = probe().probe("http://127.0.0.1:9/").await;
        assert!(matches!(outcome, ProbeOutcome::NotReady { .. }));
    }
}
