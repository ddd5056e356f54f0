//! Synthetic traffic subsystem.
//!
//! # Data Flow
//! ```text
//! LoadConfig (profile + overrides)
//!     → profile.rs (preset job tables, resolve defaults)
//!     → job.rs (validated ScheduledJob)
//!     → scheduler.rs (one timeline per job, bounded worker pool)
//!     → outcome.rs (safe_call: log, count, never propagate)
//!     → transport.rs (HTTP or in-process call)
//! ```
//!
//! # Design Decisions
//! - The schedule is fixed at start; jobs cannot be added while running
//! - Call failures are terminal for the firing only, never for the job

pub mod job;
pub mod outcome;
pub mod profile;
pub mod scheduler;
pub mod transport;

pub use job::{ScheduleError, ScheduledJob};
pub use outcome::{safe_call, CallOutcome, JobSnapshot};
pub use profile::LoadSettings;
pub use scheduler::{SchedulerHandle, TrafficScheduler};
pub use transport::{DirectTransport, HttpTransport, Transport, TransportError};
