//! Per-firing outcome recording.
//!
//! # Responsibilities
//! - Wrap every call so failures never reach the job loop
//! - Log a bounded preview of successful responses
//! - Keep per-job counters for summaries and tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::load::transport::Transport;
use crate::observability::metrics;

const ELLIPSIS: &str = "...";

/// Cut `body` to at most `max_chars` characters, marking the cut with `...`.
pub fn truncate_preview(body: &str, max_chars: usize) -> String {
    match body.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &body[..cut], ELLIPSIS),
        None => body.to_string(),
    }
}

/// Result of one wrapped call.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub job: String,
    pub path: String,
    pub duration: Duration,
    /// Response preview on success, error description on failure.
    pub result: Result<String, String>,
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Call `path` and record the outcome. Never fails.
pub async fn safe_call<T: Transport>(transport: &T, job: &str, path: &str, preview_chars: usize) -> CallOutcome {
    let started = Instant::now();
    let result = transport.call(path).await;
    let duration = started.elapsed();
    let duration_ms = duration.as_millis() as u64;

    let result = match result {
        Ok(body) => {
            let preview = truncate_preview(&body, preview_chars);
            tracing::info!(job, path, response = %preview, duration_ms, "Auto call succeeded");
            Ok(preview)
        }
        Err(err) => {
            tracing::error!(job, path, error = %err, duration_ms, "Auto call failed");
            Err(err.to_string())
        }
    };
    metrics::record_call(job, result.is_ok(), duration);

    CallOutcome {
        job: job.to_string(),
        path: path.to_string(),
        duration,
        result,
    }
}

/// Lock-free counters for one job.
#[derive(Debug, Default)]
pub struct JobStats {
    fired: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
}

/// Point-in-time copy of [`JobStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct JobSnapshot {
    pub fired: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl JobSnapshot {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }
}

impl JobStats {
    pub fn record_fired(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: &CallOutcome) {
        if outcome.is_success() {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            fired: self.fired.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
        }
    }
}
