use std::sync::Arc;

use storyhook_core::types::IssuesEvent;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::pipeline::{Outcome, Pipeline};

/// One queued `issues` delivery.
#[derive(Debug, Clone)]
pub struct Job {
    pub delivery: Option<String>,
    pub event: IssuesEvent,
}

/// Published once per finished job. Errors are flattened to their message.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub issue: String,
    pub delivery: Option<String>,
    pub result: Result<Outcome, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EnqueueError {
    #[error("work queue is full")]
    Full,
    #[error("work queue is closed")]
    Closed,
}

/// Bounded queue in front of a fixed pool of pipeline workers.
///
/// Producers never wait: [`WorkQueue::try_enqueue`] fails fast when the queue
/// is full. Workers exit once every `WorkQueue` handle has been dropped and
/// the queue has drained.
#[derive(Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<Job>,
}

impl WorkQueue {
    /// Spawn `workers` tasks on the current runtime.
    pub fn start(
        pipeline: Arc<Pipeline>,
        workers: usize,
        capacity: usize,
        reports: broadcast::Sender<JobReport>,
    ) -> (Self, Vec<JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));
        let handles = (0..workers.max(1))
            .map(|id| {
                let rx = rx.clone();
                let pipeline = pipeline.clone();
                let reports = reports.clone();
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(job) = next else {
                            tracing::debug!(worker = id, "work queue closed");
                            break;
                        };
                        let report = run_job(&pipeline, job).await;
                        // No subscribers is normal outside tests.
                        let _ = reports.send(report);
                    }
                })
            })
            .collect();
        (Self { tx }, handles)
    }

    pub fn try_enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::Full,
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }
}

async fn run_job(pipeline: &Pipeline, job: Job) -> JobReport {
    let issue = job.event.issue_url().to_string();
    let result = pipeline.process(&job.event).await;

    match &result {
        Ok(Outcome::Ticked { story, lines }) => {
            tracing::info!(issue = %issue, story = %story, lines, "updated story");
        }
        Ok(Outcome::Unchanged { story }) => {
            tracing::info!(issue = %issue, story = %story, "story has no open checklist line for issue");
        }
        Ok(outcome) => {
            tracing::debug!(issue = %issue, outcome = %outcome, "issue event skipped");
        }
        Err(e) => {
            tracing::warn!(issue = %issue, error = %e, "story update aborted");
        }
    }

    JobReport {
        issue,
        delivery: job.delivery,
        result: result.map_err(|e| e.to_string()),
    }
}
