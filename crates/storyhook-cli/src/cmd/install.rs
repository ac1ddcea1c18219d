use anyhow::{bail, Result};
use std::path::Path;
use storyhook_server::install::InstallReport;

use super::settings::{check, Settings};

pub fn run(
    config_path: Option<&Path>,
    settings: &Settings,
    org: Option<&str>,
    webhook_url: &str,
    json: bool,
) -> Result<()> {
    let config = settings.resolve(config_path)?;
    check(&config)?;

    let org = match org {
        Some(org) => org.to_string(),
        None => config.story_owner()?.to_string(),
    };
    let client = storyhook_server::github_client(&config)?;
    let secret = config.secret.as_deref().filter(|s| !s.is_empty());

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(storyhook_server::install::install_webhooks(
        &client,
        &org,
        webhook_url,
        secret,
    ))?;

    if json {
        print_json(&org, &report)?;
    } else {
        print_summary(&org, &report);
    }

    if !report.is_clean() {
        bail!(
            "{} repositor{} in '{org}' could not be configured",
            report.failed.len(),
            if report.failed.len() == 1 { "y" } else { "ies" }
        );
    }
    Ok(())
}

fn print_summary(org: &str, report: &InstallReport) {
    for repo in &report.installed {
        println!("installed  {repo}");
    }
    for repo in &report.already_installed {
        println!("present    {repo}");
    }
    for (repo, reason) in &report.failed {
        println!("failed     {repo}: {reason}");
    }
    println!(
        "{org}: {} installed, {} already present, {} failed",
        report.installed.len(),
        report.already_installed.len(),
        report.failed.len()
    );
}

fn print_json(org: &str, report: &InstallReport) -> Result<()> {
    let failed: Vec<_> = report
        .failed
        .iter()
        .map(|(repo, reason)| serde_json::json!({ "repo": repo, "reason": reason }))
        .collect();
    let out = serde_json::json!({
        "org": org,
        "installed": report.installed,
        "already_installed": report.already_installed,
        "failed": failed,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
