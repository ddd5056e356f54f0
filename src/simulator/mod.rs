//! Operation simulator subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation (operation + params)
//!     → registry.rs (look up behavior profile)
//!     → behavior.rs (draw latency, draw error)
//!     → random.rs (injectable uniform draws)
//!     → observation.rs (span, summary log, metrics, sinks)
//!     → OperationOutput | SimulatedError
//! ```
//!
//! # Design Decisions
//! - The catalog is a closed enum; profiles are data, not subclasses
//! - One observation per invocation, closed on every exit path
//! - Tags stay low-cardinality: raw ids are bucketed
//! - Delays are async sleeps, never blocking a worker thread

pub mod behavior;
pub mod observation;
pub mod operation;
pub mod random;
pub mod registry;

pub use observation::{MemorySink, MetricsSink, Observation, ObservationSink, Outcome};
pub use operation::{ErrorKind, Invocation, Operation, OperationOutput, SimulatedError};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use registry::OperationRegistry;
