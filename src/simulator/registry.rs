//! Operation registry: executes invocations under their behavior profile.
//!
//! # Invocation Flow
//! ```text
//! invoke(invocation)
//!     → open ObservationGuard (span + tags)
//!     → draw latency, sleep (records processing timer)
//!     → draw error policy → SimulatedError
//!     → otherwise generate payload
//!     → close guard with outcome
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use tokio::time::Instant;
use tracing::Instrument;

use crate::config::schema::SimulatorConfig;
use crate::observability::metrics;
use crate::simulator::behavior::BehaviorProfile;
use crate::simulator::observation::{MetricsSink, ObservationGuard, ObservationSink, Outcome};
use crate::simulator::operation::{
    ErrorKind, Invocation, Operation, OperationOutput, OrderBatch, SimulatedError, UserList, UserRecord,
};
use crate::simulator::random::{RandomSource, SeededRandom, ThreadRandom};

const KNOWN_USERS: [&str; 3] = ["alice", "bob", "charlie"];
const USER_BUCKETS: u32 = 8;

/// Wall clock in epoch milliseconds that never goes backwards.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicU64,
}

impl MonotonicClock {
    pub fn now_millis(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let previous = self.last.fetch_max(now, Ordering::Relaxed);
        previous.max(now)
    }
}

/// Bounded bucket for a user id, safe to use as a tag.
pub fn user_bucket(id: &str) -> u32 {
    id.bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
        % USER_BUCKETS
}

/// The fixed set of operations and the state shared by all invocations.
pub struct OperationRegistry {
    config: SimulatorConfig,
    profiles: HashMap<Operation, BehaviorProfile>,
    random: Arc<dyn RandomSource>,
    sinks: Arc<[Arc<dyn ObservationSink>]>,
    clock: MonotonicClock,
}

impl OperationRegistry {
    /// Build a registry reporting to the metrics recorder.
    ///
    /// Randomness is seeded when `config.seed` is set.
    pub fn new(config: SimulatorConfig) -> Self {
        let random: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Self::with_parts(config, random, vec![Arc::new(MetricsSink)])
    }

    pub fn with_parts(
        config: SimulatorConfig,
        random: Arc<dyn RandomSource>,
        sinks: Vec<Arc<dyn ObservationSink>>,
    ) -> Self {
        let profiles = Operation::ALL
            .iter()
            .map(|op| (*op, BehaviorProfile::for_operation(*op, &config)))
            .collect();

        Self {
            config,
            profiles,
            random,
            sinks: Arc::from(sinks),
            clock: MonotonicClock::default(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn profile(&self, operation: Operation) -> Option<&BehaviorProfile> {
        self.profiles.get(&operation)
    }

    /// Execute one invocation, emitting exactly one observation.
    pub async fn invoke(&self, invocation: Invocation) -> Result<OperationOutput, SimulatedError> {
        let operation = invocation.operation();
        let mut guard = ObservationGuard::start(operation, &self.config.service_name, self.sinks.clone());
        if let Invocation::UsersGet { id } = &invocation {
            guard.tag("user_bucket", user_bucket(id).to_string());
        }
        let span = guard.span().clone();

        let result = self.execute(&invocation).instrument(span).await;

        let outcome = match &result {
            Ok(_) => Outcome::Ok,
            Err(err) => Outcome::Error(err.kind),
        };
        guard.finish(outcome);
        result
    }

    async fn execute(&self, invocation: &Invocation) -> Result<OperationOutput, SimulatedError> {
        let operation = invocation.operation();
        let profile = self
            .profiles
            .get(&operation)
            .ok_or_else(|| SimulatedError::new(ErrorKind::State, format!("No profile for {}", operation)))?;

        let delay = match profile.latency.draw(self.random.as_ref()) {
            Some(delay) => {
                let started = Instant::now();
                tokio::time::sleep(delay).await;
                metrics::record_processing(operation.name(), started.elapsed());
                Some(delay)
            }
            None => None,
        };

        if let Some(kind) = profile.errors.draw(self.random.as_ref()) {
            return Err(self.simulated_failure(invocation, kind));
        }

        let output = match invocation {
            Invocation::Hello => {
                let now = self.clock.now_millis();
                tracing::debug!(time = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), "Hello endpoint called");
                OperationOutput::Text(format!("Hello from {}! Time: {}", self.config.service_name, now))
            }
            Invocation::Calc { x, y } => {
                let z = *x as i64 * *y as i64;
                tracing::debug!(x, y, z, "Calculation performed");
                OperationOutput::Text(format!("Result: {} * {} = {}", x, y, z))
            }
            Invocation::Slow => {
                let delay_ms = delay.map(|d| d.as_millis()).unwrap_or_default();
                tracing::debug!(delay_ms = delay_ms as u64, "Slow endpoint completed");
                OperationOutput::Text(format!("Slow response completed after {}ms", delay_ms))
            }
            Invocation::UsersList => {
                tracing::debug!("Fetching user list");
                self.json(&UserList {
                    users: KNOWN_USERS.iter().map(|u| u.to_string()).collect(),
                    total: KNOWN_USERS.len(),
                    timestamp: self.clock.now_millis(),
                })?
            }
            Invocation::UsersGet { id } => {
                tracing::debug!("Fetching user");
                self.json(&self.user_record(id))?
            }
            Invocation::OrdersList => {
                let batch = self.order_batch();
                tracing::debug!(count = batch.count, "Generated random orders");
                self.json(&batch)?
            }
            Invocation::Error => {
                return Err(SimulatedError::new(ErrorKind::State, "error operation has no success path"));
            }
        };
        Ok(output)
    }

    fn simulated_failure(&self, invocation: &Invocation, kind: ErrorKind) -> SimulatedError {
        match (invocation, kind) {
            (Invocation::UsersGet { id }, ErrorKind::NotFound) => {
                SimulatedError::new(kind, format!("User not found: {}", id))
            }
            (Invocation::Error, _) => {
                tracing::warn!("Simulated warning before intentional error");
                let message = match kind {
                    ErrorKind::Validation => "Simulated validation error",
                    ErrorKind::State => "Simulated state error",
                    _ => "Simulated runtime error",
                };
                SimulatedError::new(kind, message)
            }
            (other, _) => SimulatedError::new(kind, format!("Simulated {} failure", other.operation())),
        }
    }

    fn user_record(&self, id: &str) -> UserRecord {
        let max_days = self.config.user_created_max_days as i64;
        let days_ago = self.random.next_i64_in(1, max_days);
        let created = Utc::now() - ChronoDuration::days(days_ago);
        UserRecord {
            id: id.to_string(),
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            created: created.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn order_batch(&self) -> OrderBatch {
        let range = self.config.order_count;
        let count = self.random.next_u64_in(range.min, range.max) as usize;
        let orders = (0..count)
            .map(|_| format!("order-{}", self.random.next_u64_in(1000, 9999)))
            .collect();
        let value = self.config.order_value;
        OrderBatch {
            orders,
            count,
            total_value: self.random.next_f64_in(value.min, value.max),
            currency: self.config.currency.clone(),
        }
    }

    fn json<T: serde::Serialize>(&self, payload: &T) -> Result<OperationOutput, SimulatedError> {
        serde_json::to_value(payload)
            .map(OperationOutput::Json)
            .map_err(|e| SimulatedError::new(ErrorKind::Runtime, format!("Failed to encode payload: {}", e)))
    }
}
