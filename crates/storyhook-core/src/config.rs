use crate::error::{Result, StoryhookError};
use crate::types::split_full_name;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Process-wide settings. Built once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `owner/name` of the repository holding story issues.
    #[serde(default)]
    pub story_repo: String,
    /// Webhook signing secret. `None` (or empty) runs in open mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// GitHub access token used for the REST API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            story_repo: String::new(),
            secret: None,
            token: None,
            api_base: default_api_base(),
            port: default_port(),
            webhook_path: default_webhook_path(),
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    pub fn new(story_repo: impl Into<String>) -> Self {
        Self {
            story_repo: story_repo.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml(&data)
    }

    pub fn from_yaml(data: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(data)?)
    }

    /// Signing secret as bytes, or `None` in open mode.
    pub fn secret_bytes(&self) -> Option<&[u8]> {
        self.secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::as_bytes)
    }

    pub fn require_token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(StoryhookError::MissingSetting("GITHUB_TOKEN"))
    }

    /// Owner half of `story_repo`; the organization webhooks are installed into.
    pub fn story_owner(&self) -> Result<&str> {
        split_full_name(&self.story_repo)
            .map(|(owner, _)| owner)
            .ok_or_else(|| StoryhookError::InvalidRepoName(self.story_repo.clone()))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut error = |message: String| {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message,
            })
        };

        if self.story_repo.is_empty() {
            error("story_repo is not set (STORY_REPO)".to_string());
        } else if split_full_name(&self.story_repo).is_none() {
            error(format!(
                "story_repo '{}' must be of the form owner/name",
                self.story_repo
            ));
        }

        if !self.webhook_path.starts_with('/') {
            error(format!(
                "webhook_path '{}' must start with '/'",
                self.webhook_path
            ));
        }

        if self.workers == 0 {
            error("workers must be at least 1".to_string());
        }

        if self.queue_capacity == 0 {
            error("queue_capacity must be at least 1".to_string());
        }

        if self.secret_bytes().is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no webhook secret configured: signatures will not be verified"
                    .to_string(),
            });
        }

        warnings
    }

    /// Fail with the first error-level validation message, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        match self
            .validate()
            .into_iter()
            .find(|w| w.level == WarnLevel::Error)
        {
            Some(w) => Err(StoryhookError::InvalidConfig(w.message)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
