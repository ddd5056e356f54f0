//! Behavior profiles: latency and error injection per operation.

use std::time::Duration;

use crate::config::schema::{DelayRange, SimulatorConfig};
use crate::simulator::operation::{ErrorKind, Operation};
use crate::simulator::random::RandomSource;

/// Injected latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Latency {
    None,
    /// Uniform over `[min_ms, max_ms)`.
    UniformMillis { min_ms: u64, max_ms: u64 },
}

impl Latency {
    pub fn draw(&self, random: &dyn RandomSource) -> Option<Duration> {
        match *self {
            Latency::None => None,
            Latency::UniformMillis { min_ms, max_ms } => {
                Some(Duration::from_millis(random.next_u64_in(min_ms, max_ms)))
            }
        }
    }
}

impl From<DelayRange> for Latency {
    fn from(range: DelayRange) -> Self {
        Latency::UniformMillis {
            min_ms: range.min_ms,
            max_ms: range.max_ms,
        }
    }
}

/// Error injection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPolicy {
    Never,
    /// Fails with `kind` when a draw from `[0, n)` lands on 0.
    OneIn { n: u64, kind: ErrorKind },
    /// Fails every time with a kind picked uniformly from `kinds`.
    Always { kinds: Vec<ErrorKind> },
}

impl ErrorPolicy {
    pub fn draw(&self, random: &dyn RandomSource) -> Option<ErrorKind> {
        match self {
            ErrorPolicy::Never => None,
            ErrorPolicy::OneIn { n, kind } => (random.next_u64_in(0, *n) == 0).then_some(*kind),
            ErrorPolicy::Always { kinds } => {
                let idx = random.next_u64_in(0, kinds.len() as u64) as usize;
                Some(kinds.get(idx).copied().unwrap_or(ErrorKind::Runtime))
            }
        }
    }
}

/// Latency and error policy attached to an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorProfile {
    pub latency: Latency,
    pub errors: ErrorPolicy,
}

impl BehaviorProfile {
    pub fn for_operation(op: Operation, config: &SimulatorConfig) -> Self {
        match op {
            Operation::Calc => Self {
                latency: config.calc_delay.into(),
                errors: ErrorPolicy::Never,
            },
            Operation::Slow => Self {
                latency: config.slow_delay.into(),
                errors: ErrorPolicy::Never,
            },
            Operation::UsersGet => Self {
                latency: Latency::None,
                errors: ErrorPolicy::OneIn {
                    n: config.user_not_found_one_in,
                    kind: ErrorKind::NotFound,
                },
            },
            Operation::Error => Self {
                latency: Latency::None,
                errors: ErrorPolicy::Always {
                    kinds: ErrorKind::SIMULATED.to_vec(),
                },
            },
            Operation::Hello | Operation::UsersList | Operation::OrdersList => Self {
                latency: Latency::None,
                errors: ErrorPolicy::Never,
            },
        }
    }
}
