//! Per-event processing: closed work issue → story checklist tick.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use storyhook_core::checklist;
use storyhook_core::config::Config;
use storyhook_core::reference::StoryResolver;
use storyhook_core::types::{IssueUpdate, IssuesEvent};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::github::{GithubError, IssueClient};

// ---------------------------------------------------------------------------
// Outcome / PipelineError
// ---------------------------------------------------------------------------

/// How a single `issues` event was handled when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Action other than `closed`.
    Ignored { action: String },
    /// Payload lacked the issue, the repository, or the issue number.
    Incomplete,
    /// The closed issue lives in the story repository itself.
    SelfReference,
    /// The issue body does not reference a story.
    NoStory,
    /// Story fetched, but no open checklist line named the issue.
    Unchanged { story: String },
    /// Story body rewritten with `lines` lines ticked.
    Ticked { story: String, lines: usize },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ignored { action } => write!(f, "ignored action '{action}'"),
            Outcome::Incomplete => f.write_str("incomplete payload"),
            Outcome::SelfReference => f.write_str("issue belongs to the story repository"),
            Outcome::NoStory => f.write_str("no story reference"),
            Outcome::Unchanged { story } => write!(f, "no matching checklist line in {story}"),
            Outcome::Ticked { story, lines } => write!(f, "ticked {lines} line(s) in {story}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("error getting story {story}: {source}")]
    FetchStory {
        story: String,
        #[source]
        source: GithubError,
    },

    #[error("error updating story {story}: {source}")]
    UpdateStory {
        story: String,
        #[source]
        source: GithubError,
    },
}

// ---------------------------------------------------------------------------
// StoryLocks
// ---------------------------------------------------------------------------

/// One async mutex per story locator.
///
/// The fetch → tick → update sequence for a story runs under its lock, so two
/// work issues closing at once cannot overwrite each other's tick. Entries are
/// dropped again once nobody holds or waits on them.
#[derive(Default)]
pub struct StoryLocks {
    inner: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

pub struct StoryGuard<'a> {
    locks: &'a StoryLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl StoryLocks {
    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<()>>>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub async fn lock(&self, key: &str) -> StoryGuard<'_> {
        let mutex = self.map().entry(key.to_string()).or_default().clone();
        let guard = mutex.lock_owned().await;
        StoryGuard {
            locks: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of stories with a live lock entry.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for StoryGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.map();
        if map
            .get(&self.key)
            .is_some_and(|m| Arc::strong_count(m) == 1)
        {
            map.remove(&self.key);
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct Pipeline {
    config: Arc<Config>,
    resolver: StoryResolver,
    client: Arc<dyn IssueClient>,
    locks: StoryLocks,
}

impl Pipeline {
    pub fn new(config: Arc<Config>, client: Arc<dyn IssueClient>) -> Self {
        let resolver = StoryResolver::new(&config.story_repo);
        Self {
            config,
            resolver,
            client,
            locks: StoryLocks::default(),
        }
    }

    pub fn locks(&self) -> &StoryLocks {
        &self.locks
    }

    /// Handle one `issues` event.
    ///
    /// Each failing step stops processing. Nothing is written remotely until
    /// the final update, so an early stop leaves the story untouched.
    pub async fn process(&self, event: &IssuesEvent) -> Result<Outcome, PipelineError> {
        if !event.is_closed() {
            return Ok(Outcome::Ignored {
                action: event.action.clone(),
            });
        }

        let (Some(issue), Some(repository)) = (&event.issue, &event.repository) else {
            return Ok(Outcome::Incomplete);
        };
        let Some((owner, name)) = repository.owner_and_name() else {
            return Ok(Outcome::Incomplete);
        };
        if issue.number == 0 {
            return Ok(Outcome::Incomplete);
        }

        let full_name = if repository.full_name.is_empty() {
            format!("{owner}/{name}")
        } else {
            repository.full_name.clone()
        };
        if full_name == self.config.story_repo {
            return Ok(Outcome::SelfReference);
        }

        let Some(reference) = self.resolver.resolve(&issue.body) else {
            tracing::info!(issue = %issue.url, body = %issue.body, "could not find story");
            return Ok(Outcome::NoStory);
        };
        let locator = reference.api_url(&self.config.api_base);
        tracing::info!(issue = %issue.url, story = %locator, "found connected story");

        let _guard = self.locks.lock(&locator).await;

        let story = self
            .client
            .get_issue(&locator)
            .await
            .map_err(|source| PipelineError::FetchStory {
                story: locator.clone(),
                source,
            })?;

        let ticked = checklist::tick(&story.body, owner, name, issue.number);
        if !ticked.changed() {
            return Ok(Outcome::Unchanged { story: locator });
        }

        let target = if story.url.is_empty() {
            locator.as_str()
        } else {
            story.url.as_str()
        };
        self.client
            .update_issue(target, &IssueUpdate { body: ticked.body })
            .await
            .map_err(|source| PipelineError::UpdateStory {
                story: locator.clone(),
                source,
            })?;

        Ok(Outcome::Ticked {
            story: locator,
            lines: ticked.lines,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
