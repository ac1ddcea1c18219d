use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;
use storyhook_core::config::{Config, WarnLevel};

/// Settings shared by the commands that talk to GitHub.
#[derive(Args, Debug, Default)]
pub struct Settings {
    /// Story repository, owner/name
    #[arg(long, env = "STORY_REPO")]
    pub story_repo: Option<String>,

    /// Webhook signing secret (unset = signatures are not checked)
    #[arg(long, env = "GITHUB_WEBHOOK_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, env = "GITHUB_API_BASE")]
    pub api_base: Option<String>,
}

impl Settings {
    /// Load the config file (if any) and apply flag/env overrides on top.
    pub fn resolve(&self, config_path: Option<&Path>) -> Result<Config> {
        let mut config = match config_path {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(v) = &self.story_repo {
            config.story_repo = v.clone();
        }
        if let Some(v) = &self.secret {
            config.secret = Some(v.clone());
        }
        if let Some(v) = &self.token {
            config.token = Some(v.clone());
        }
        if let Some(v) = &self.api_base {
            config.api_base = v.clone();
        }
        Ok(config)
    }
}

/// Log every validation finding and fail on the first error.
pub fn check(config: &Config) -> Result<()> {
    for w in config.validate() {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }
    config.ensure_valid()?;
    Ok(())
}
