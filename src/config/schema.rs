//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo
//! service and its load generator. All types derive Serde traits for
//! deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry demo.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration for the inbound server.
    pub timeouts: TimeoutConfig,

    /// Behavior of the simulated operations.
    pub simulator: SimulatorConfig,

    /// Traffic generation settings.
    pub load: LoadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8088").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8088".to_string(),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Half-open millisecond range `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Half-open integer range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CountRange {
    pub min: u64,
    pub max: u64,
}

/// Half-open monetary range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Simulated operation behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Service name attached to every observation.
    pub service_name: String,

    /// Processing delay injected into `calc`.
    pub calc_delay: DelayRange,

    /// Delay injected into `slow`.
    pub slow_delay: DelayRange,

    /// Default `x` when `/calc` is called without it.
    pub calc_default_x: i32,

    /// Default `y` when `/calc` is called without it.
    pub calc_default_y: i32,

    /// `users.get` fails with probability `1 / user_not_found_one_in`.
    pub user_not_found_one_in: u64,

    /// Upper bound (exclusive) of the "created N days ago" offset.
    pub user_created_max_days: u64,

    /// Number of orders generated per `orders.list` call.
    pub order_count: CountRange,

    /// Range of the synthetic order total.
    pub order_value: ValueRange,

    /// Currency code reported with order totals.
    pub currency: String,

    /// Seed for reproducible randomness. Unset means thread-local entropy.
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            service_name: "telemetry-demo".to_string(),
            calc_delay: DelayRange { min_ms: 10, max_ms: 100 },
            slow_delay: DelayRange { min_ms: 500, max_ms: 2000 },
            calc_default_x: 10,
            calc_default_y: 20,
            user_not_found_one_in: 10,
            user_created_max_days: 30,
            order_count: CountRange { min: 1, max: 10 },
            order_value: ValueRange { min: 100.0, max: 10_000.0 },
            currency: "USD".to_string(),
            seed: None,
        }
    }
}

/// How the scheduler reaches the operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Loopback HTTP through the public endpoints.
    #[default]
    Http,
    /// In-process calls into the operation registry.
    Direct,
}

/// Preset job tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadProfile {
    /// One job per endpoint, periods from 4s to 45s.
    #[default]
    Comprehensive,
    /// hello, calc and error only.
    Minimal,
    /// Jobs come from `load.jobs`.
    Custom,
}

/// Traffic generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Enable the traffic scheduler.
    pub enabled: bool,

    /// Transport used to reach the operations.
    pub transport: TransportMode,

    /// Base URL for HTTP transport. Defaults to the local listener.
    pub target_url: Option<String>,

    /// Preset job table.
    pub profile: LoadProfile,

    /// Job table used when `profile = "custom"`.
    pub jobs: Vec<JobConfig>,

    /// Worker pool size. Defaults to the profile's value.
    pub workers: Option<usize>,

    /// Outbound connect timeout in seconds. Defaults to the profile's value.
    pub connect_timeout_secs: Option<u64>,

    /// Outbound read timeout in seconds. Defaults to the profile's value.
    pub read_timeout_secs: Option<u64>,

    /// Maximum characters of a response body kept in the call log.
    pub preview_chars: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: TransportMode::Http,
            target_url: None,
            profile: LoadProfile::Comprehensive,
            jobs: Vec::new(),
            workers: None,
            connect_timeout_secs: None,
            read_timeout_secs: None,
            preview_chars: 100,
        }
    }
}

/// Parameter generation rule for a job, evaluated on every firing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamRule {
    /// Call the path as-is.
    #[default]
    None,
    /// Append a fixed query string (without the leading `?`).
    Fixed { query: String },
    /// Append `name=<n>` for each name, `n` drawn from `[min, max)`.
    RandomQuery { names: Vec<String>, min: i64, max: i64 },
    /// Append `/<n>` to the path, `n` drawn from `[min, max)`.
    RandomPathId { min: i64, max: i64 },
}

/// A single scheduled job.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobConfig {
    /// Job identifier for logging/metrics.
    pub name: String,

    /// Path to call (e.g., "/calc").
    pub path: String,

    /// Parameter rule.
    #[serde(default)]
    pub params: ParamRule,

    /// Delay before the first firing in milliseconds.
    pub initial_delay_ms: u64,

    /// Fixed firing period in milliseconds.
    pub period_ms: u64,

    /// Cap on concurrently running firings of this job; a firing at the cap
    /// is skipped. Defaults to 1. `0` allows unbounded overlap.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    1
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
