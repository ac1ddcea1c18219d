use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryhookError {
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("invalid repository name '{0}': expected owner/name")]
    InvalidRepoName(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoryhookError>;
