use anyhow::Result;
use std::path::Path;

use super::settings::{check, Settings};

pub fn run(
    config_path: Option<&Path>,
    settings: &Settings,
    port: Option<u16>,
    path: Option<String>,
    install_webhook: Option<&str>,
) -> Result<()> {
    let mut config = settings.resolve(config_path)?;
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(path) = path {
        config.webhook_path = path;
    }
    check(&config)?;

    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        if let Some(url) = install_webhook {
            install_before_serving(&config, url).await;
        }

        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;

        tokio::select! {
            res = storyhook_server::serve_on(config, listener) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}

/// Startup installation is best effort: failures are logged and the server
/// still starts.
async fn install_before_serving(config: &storyhook_core::config::Config, url: &str) {
    let org = match config.story_owner() {
        Ok(org) => org,
        Err(e) => {
            tracing::error!("webhook install skipped: {e}");
            return;
        }
    };
    let client = match storyhook_server::github_client(config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("webhook install skipped: {e:#}");
            return;
        }
    };

    let secret = config.secret.as_deref().filter(|s| !s.is_empty());
    match storyhook_server::install::install_webhooks(&client, org, url, secret).await {
        Ok(report) => tracing::info!(
            org,
            installed = report.installed.len(),
            already_installed = report.already_installed.len(),
            failed = report.failed.len(),
            "webhook install finished"
        ),
        Err(e) => tracing::error!(org, "webhook install failed: {e}"),
    }
}
