use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use storyhook_core::types::{Hook, Issue, IssueUpdate, Repository};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("github {operation} request to {url} failed: {source}")]
    Transport {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("github {operation} at {url} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode github {operation} response from {url}: {source}")]
    Decode {
        operation: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

// ---------------------------------------------------------------------------
// IssueClient
// ---------------------------------------------------------------------------

/// The slice of the GitHub REST API the service talks to.
///
/// Calls are never retried; a failure is reported to the caller as-is.
#[async_trait]
pub trait IssueClient: Send + Sync {
    async fn get_issue(&self, url: &str) -> Result<Issue, GithubError>;

    async fn update_issue(&self, url: &str, update: &IssueUpdate) -> Result<(), GithubError>;

    async fn list_repositories(&self, org: &str) -> Result<Vec<Repository>, GithubError>;

    async fn list_hooks(&self, hooks_url: &str) -> Result<Vec<Hook>, GithubError>;

    async fn create_hook(&self, hooks_url: &str, hook: &Hook) -> Result<(), GithubError>;
}

// ---------------------------------------------------------------------------
// GithubClient
// ---------------------------------------------------------------------------

const USER_AGENT: &str = "storyhook";
const ACCEPT: &str = "application/vnd.github+json";
const PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static(ACCEPT),
        );
        let auth = format!("Bearer {}", token.trim());
        let mut auth = reqwest::header::HeaderValue::from_str(&auth)
            .context("invalid github authorization header")?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("failed to create github api client")?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn send(
        &self,
        operation: &'static str,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GithubError> {
        let response = request.send().await.map_err(|source| GithubError::Transport {
            operation,
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(GithubError::Status {
            operation,
            url: url.to_string(),
            status: status.as_u16(),
            body: truncate_for_error(&body, 400),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, GithubError> {
        let response = self
            .send(operation, url, self.http.get(url).query(query))
            .await?;
        response.json::<T>().await.map_err(|source| GithubError::Decode {
            operation,
            url: url.to_string(),
            source,
        })
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
        url: &str,
        body: &B,
    ) -> Result<(), GithubError> {
        self.send(operation, url, request.json(body)).await?;
        Ok(())
    }
}

#[async_trait]
impl IssueClient for GithubClient {
    async fn get_issue(&self, url: &str) -> Result<Issue, GithubError> {
        self.get_json("get issue", url, &[]).await
    }

    async fn update_issue(&self, url: &str, update: &IssueUpdate) -> Result<(), GithubError> {
        self.send_json("update issue", self.http.patch(url), url, update)
            .await
    }

    async fn list_repositories(&self, org: &str) -> Result<Vec<Repository>, GithubError> {
        let url = format!("{}/orgs/{org}/repos", self.api_base);
        let mut page = 1_u32;
        let mut repos = Vec::new();
        loop {
            let chunk: Vec<Repository> = self
                .get_json(
                    "list repositories",
                    &url,
                    &[
                        ("per_page", PAGE_SIZE.to_string()),
                        ("page", page.to_string()),
                    ],
                )
                .await?;
            let chunk_len = chunk.len();
            repos.extend(chunk);
            if chunk_len < PAGE_SIZE {
                break;
            }
            page = page.saturating_add(1);
        }
        Ok(repos)
    }

    async fn list_hooks(&self, hooks_url: &str) -> Result<Vec<Hook>, GithubError> {
        self.get_json("list hooks", hooks_url, &[]).await
    }

    async fn create_hook(&self, hooks_url: &str, hook: &Hook) -> Result<(), GithubError> {
        self.send_json("create hook", self.http.post(hooks_url), hooks_url, hook)
            .await
    }
}

fn truncate_for_error(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
