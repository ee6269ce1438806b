// Terminal UI utilities

use colored::Colorize;

use crate::domain::{DeployReport, Readiness, RunSummary, TeardownOutcome};

pub fn print_header(title: &str) {
    println!();
    println!(
        "{}",
        "╔════════════════════════════════════════════════════════════╗".bright_blue()
    );
    println!("{}", format!("║  {:<58}║", title).bright_blue());
    println!(
        "{}",
        "╚════════════════════════════════════════════════════════════╝".bright_blue()
    );
    println!();
}

pub fn print_success(message: &str) {
    println!("{}", format!("✅ {}", message).bright_green().bold());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("❌ {}", message).bright_red().bold());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ️  {}", message).bright_cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("⚠️  {}", message).bright_yellow());
}

/// One line per deployed site
pub fn print_site(report: &DeployReport) {
    let status = match &report.readiness {
        Readiness::Ready { status, .. } => format!("ready (HTTP {})", status).bright_green(),
        Readiness::TimedOut(_) => "not ready".bright_yellow(),
        Readiness::Cancelled => "cancelled".bright_red(),
    };

    println!(
        "  {} {:<28} {:<40} {}",
        "•".bright_blue(),
        report.site.bold(),
        report.url,
        status
    );
    println!(
        "    {} in {}",
        report.strategy.name().dimmed(),
        humantime::format_duration(std::time::Duration::from_secs(report.duration.as_secs()))
    );
}

pub fn print_summary(summary: &RunSummary) {
    print_header("Run Summary");

    match &summary.resource_group {
        Some(group) => print_info(&format!("Resource group: {}", group)),
        None => print_info("Resource group: not created"),
    }
    if let Some(plan) = &summary.hosting_plan {
        print_info(&format!("Hosting plan:   {}", plan));
    }
    print_info(&format!(
        "Sites created:  {} ({} deployed)",
        summary.sites_created.len(),
        summary.reports.len()
    ));

    if !summary.reports.is_empty() {
        println!();
        for report in &summary.reports {
            print_site(report);
        }
        println!();
    }

    for warning in summary.readiness_warnings() {
        print_warning(&warning.to_string());
    }

    match &summary.teardown {
        TeardownOutcome::NothingToCleanUp => print_info("Teardown: nothing to clean up"),
        TeardownOutcome::Deleted { name } => {
            print_success(&format!("Teardown: resource group {} deleted", name))
        }
        TeardownOutcome::Failed(e) => {
            print_error(&format!("Teardown: {}", e));
            print_warning("Delete the resource group manually to stop billing");
        }
    }
}
