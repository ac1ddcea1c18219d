//! Install the `issues` webhook on every repository of an organization.

use storyhook_core::types::Hook;

use crate::github::{GithubError, IssueClient};

#[derive(Debug, Default, PartialEq)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub already_installed: Vec<String>,
    /// `(repository, reason)` for repositories that could not be handled.
    pub failed: Vec<(String, String)>,
}

impl InstallReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Make sure every repository in `org` delivers `issues` events to
/// `webhook_url`.
///
/// A repository that already has a hook pointing at `webhook_url` is left
/// alone. Errors on one repository are recorded and the loop moves on; only a
/// failure to list the organization's repositories aborts.
pub async fn install_webhooks(
    client: &dyn IssueClient,
    org: &str,
    webhook_url: &str,
    secret: Option<&str>,
) -> Result<InstallReport, GithubError> {
    let repos = client.list_repositories(org).await?;
    let hook = Hook::issues_webhook(webhook_url, secret);
    let mut report = InstallReport::default();

    for repo in repos {
        if repo.hooks_url.is_empty() {
            report
                .failed
                .push((repo.full_name, "repository has no hooks_url".to_string()));
            continue;
        }

        let hooks = match client.list_hooks(&repo.hooks_url).await {
            Ok(hooks) => hooks,
            Err(e) => {
                tracing::warn!(repo = %repo.full_name, error = %e, "could not list webhooks");
                report.failed.push((repo.full_name, e.to_string()));
                continue;
            }
        };

        if hooks.iter().any(|h| h.config.url == webhook_url) {
            tracing::info!(repo = %repo.full_name, "webhook already installed");
            report.already_installed.push(repo.full_name);
            continue;
        }

        tracing::info!(repo = %repo.full_name, "installing webhook");
        match client.create_hook(&repo.hooks_url, &hook).await {
            Ok(()) => report.installed.push(repo.full_name),
            Err(e) => {
                tracing::warn!(repo = %repo.full_name, error = %e, "could not install webhook");
                report.failed.push((repo.full_name, e.to_string()));
            }
        }
    }

    Ok(report)
}
