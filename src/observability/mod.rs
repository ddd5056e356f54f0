//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Simulator, HTTP layer and load generator produce:
//!     → logging.rs (structured log events inside operation spans)
//!     → metrics.rs (counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID and operation name flow through span fields
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
