use std::sync::Arc;

use storyhook_core::config::Config;
use tokio::sync::broadcast;

use crate::github::IssueClient;
use crate::pipeline::Pipeline;
use crate::worker::{JobReport, WorkQueue};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub queue: WorkQueue,
    pub reports: broadcast::Sender<JobReport>,
}

impl AppState {
    /// Build the state and start the worker pool. Must be called from within
    /// a Tokio runtime.
    pub fn new(config: Arc<Config>, client: Arc<dyn IssueClient>) -> Self {
        let (reports, _) = broadcast::channel(64);
        let pipeline = Arc::new(Pipeline::new(config.clone(), client));
        let (queue, _workers) = WorkQueue::start(
            pipeline,
            config.workers,
            config.queue_capacity,
            reports.clone(),
        );
        Self {
            config,
            queue,
            reports,
        }
    }

    /// Receive a [`JobReport`] for every job finished after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobReport> {
        self.reports.subscribe()
    }
}
