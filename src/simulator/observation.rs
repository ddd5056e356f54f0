//! Per-invocation telemetry.
//!
//! An [`ObservationGuard`] is opened when an invocation starts and closed
//! exactly once: explicitly through [`ObservationGuard::finish`], or by
//! `Drop` if the invocation future is abandoned. Closing emits the summary
//! log line inside the invocation span and hands the finished
//! [`Observation`] to every sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{field, Span};

use crate::observability::metrics;
use crate::simulator::operation::{ErrorKind, Operation};

/// Final state of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Error(ErrorKind),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Error(_) => "error",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok)
    }
}

/// A closed observation.
#[derive(Debug, Clone)]
pub struct Observation {
    pub operation: Operation,
    /// Low-cardinality key/value tags.
    pub tags: Vec<(&'static str, String)>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub outcome: Outcome,
}

impl Observation {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| v.as_str())
    }
}

/// Receiver of closed observations.
pub trait ObservationSink: Send + Sync {
    fn record(&self, observation: &Observation);
}

/// Forwards observations to the metrics recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl ObservationSink for MetricsSink {
    fn record(&self, observation: &Observation) {
        metrics::record_operation(observation.operation.name(), observation.outcome.label(), observation.duration);
    }
}

/// Keeps every observation in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    observations: Mutex<Vec<Observation>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.observations.lock().expect("memory sink mutex poisoned").clone()
    }

    pub fn count(&self, operation: Operation, ok: bool) -> usize {
        self.observations
            .lock()
            .expect("memory sink mutex poisoned")
            .iter()
            .filter(|o| o.operation == operation && o.outcome.is_ok() == ok)
            .count()
    }
}

impl ObservationSink for MemorySink {
    fn record(&self, observation: &Observation) {
        self.observations
            .lock()
            .expect("memory sink mutex poisoned")
            .push(observation.clone());
    }
}

/// Scoped observation for a single invocation.
pub struct ObservationGuard {
    operation: Operation,
    tags: Vec<(&'static str, String)>,
    started_at: DateTime<Utc>,
    start: Instant,
    span: Span,
    sinks: Arc<[Arc<dyn ObservationSink>]>,
    closed: bool,
}

impl ObservationGuard {
    pub fn start(operation: Operation, service: &str, sinks: Arc<[Arc<dyn ObservationSink>]>) -> Self {
        let span = tracing::info_span!(
            "operation",
            operation = operation.name(),
            endpoint = operation.endpoint(),
            service = service,
            user_bucket = field::Empty,
            outcome = field::Empty,
            duration_ms = field::Empty,
        );

        Self {
            operation,
            tags: vec![
                ("endpoint", operation.endpoint().to_string()),
                ("service", service.to_string()),
            ],
            started_at: Utc::now(),
            start: Instant::now(),
            span,
            sinks,
            closed: false,
        }
    }

    /// Attach a low-cardinality tag. Callers bucket any unbounded value first.
    pub fn tag(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        self.span.record(key, value.as_str());
        self.tags.push((key, value));
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn finish(mut self, outcome: Outcome) -> Observation {
        self.close(outcome)
    }

    fn close(&mut self, outcome: Outcome) -> Observation {
        self.closed = true;
        let observation = Observation {
            operation: self.operation,
            tags: std::mem::take(&mut self.tags),
            started_at: self.started_at,
            duration: self.start.elapsed(),
            outcome,
        };
        let duration_ms = observation.duration.as_millis() as u64;

        self.span.record("outcome", outcome.label());
        self.span.record("duration_ms", duration_ms);
        let _entered = self.span.enter();
        match outcome {
            Outcome::Ok => tracing::info!(
                operation = self.operation.name(),
                duration_ms,
                "Operation completed"
            ),
            Outcome::Error(kind) => tracing::warn!(
                operation = self.operation.name(),
                error_kind = %kind,
                duration_ms,
                "Operation failed"
            ),
        }

        for sink in self.sinks.iter() {
            sink.record(&observation);
        }
        observation
    }
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        if !self.closed {
            self.close(Outcome::Error(ErrorKind::Cancelled));
        }
    }
}
