use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
};
use bytes::Bytes;
use storyhook_core::signature::{self, SIGNATURE_HEADER};
use storyhook_core::types::WebhookEvent;

use crate::state::AppState;
use crate::worker::{EnqueueError, Job};

pub const EVENT_HEADER: &str = "x-github-event";
pub const DELIVERY_HEADER: &str = "x-github-delivery";

/// GitHub caps webhook payloads at 25 MB.
pub const MAX_DELIVERY_BYTES: usize = 25 * 1024 * 1024;

/// What intake did with a delivery. Never surfaced to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeOutcome {
    Pong,
    InvalidSignature,
    Malformed,
    Unsupported(String),
    Ignored { action: String },
    Enqueued,
    QueueFull,
    QueueClosed,
}

/// POST <webhook_path>: GitHub webhook deliveries.
///
/// Always answers 200 so verification and processing results stay internal.
pub async fn receive(
    State(app): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    intake(&app, &headers, &body);
    StatusCode::OK
}

/// Verify, decode and enqueue one delivery.
///
/// `body` is the complete raw request body; the signature is computed over
/// these exact bytes before they are decoded.
pub fn intake(app: &AppState, headers: &HeaderMap, body: &[u8]) -> IntakeOutcome {
    let kind = header(headers, EVENT_HEADER).unwrap_or_default();
    let delivery = header(headers, DELIVERY_HEADER).map(str::to_string);

    if let Some(secret) = app.config.secret_bytes() {
        if !signature::verify(secret, body, header(headers, SIGNATURE_HEADER)) {
            tracing::warn!(event = %kind, delivery = ?delivery, "{kind}: invalid signature");
            return IntakeOutcome::InvalidSignature;
        }
    }

    let event = match WebhookEvent::decode(kind, body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(event = %kind, delivery = ?delivery, error = %e, "could not decode payload");
            return IntakeOutcome::Malformed;
        }
    };

    match event {
        WebhookEvent::Ping => {
            tracing::info!(delivery = ?delivery, "pong");
            IntakeOutcome::Pong
        }
        WebhookEvent::Other(kind) => {
            tracing::debug!(event = %kind, delivery = ?delivery, "ignoring unsupported event");
            IntakeOutcome::Unsupported(kind)
        }
        WebhookEvent::Issues(event) if !event.is_closed() => {
            tracing::debug!(issue = %event.issue_url(), action = %event.action, "ignoring issue action");
            IntakeOutcome::Ignored {
                action: event.action,
            }
        }
        WebhookEvent::Issues(event) => {
            let issue = event.issue_url().to_string();
            match app.queue.try_enqueue(Job { delivery, event }) {
                Ok(()) => {
                    tracing::debug!(issue = %issue, "queued closed issue");
                    IntakeOutcome::Enqueued
                }
                Err(EnqueueError::Full) => {
                    tracing::warn!(issue = %issue, "work queue full, dropping event");
                    IntakeOutcome::QueueFull
                }
                Err(EnqueueError::Closed) => {
                    tracing::error!(issue = %issue, "work queue closed, dropping event");
                    IntakeOutcome::QueueClosed
                }
            }
        }
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
