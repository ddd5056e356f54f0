//! Telemetry demo service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load;
pub mod observability;
pub mod simulator;

pub use config::schema::DemoConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load::TrafficScheduler;
pub use simulator::OperationRegistry;
