//! Telemetry demo service
//!
//! An HTTP service whose operations inject latency and failures, plus an
//! in-process traffic generator that keeps calling them. Every invocation
//! produces a span, a summary log line and metrics.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                  TELEMETRY DEMO                    │
//!                     │                                                    │
//!   HTTP client       │  ┌─────────┐    ┌──────────────┐    ┌───────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│  simulator   │───▶│ behavior  │  │
//!                     │  │ server  │    │  registry    │    │ delay/err │  │
//!                     │  └─────────┘    └──────┬───────┘    └───────────┘  │
//!                     │       ▲                │                           │
//!                     │       │ HTTP           ▼                           │
//!                     │       │         ┌──────────────┐                   │
//!                     │       │         │ observation  │──▶ logs, metrics  │
//!                     │       │         └──────────────┘                   │
//!                     │       │                ▲                           │
//!                     │  ┌────┴──────┐  direct │                           │
//!                     │  │   load    │─────────┘                           │
//!                     │  │ scheduler │                                     │
//!                     │  └───────────┘                                     │
//!                     │                                                    │
//!                     │  ┌──────────────────────────────────────────────┐  │
//!                     │  │  config   observability   lifecycle          │  │
//!                     │  └──────────────────────────────────────────────┘  │
//!                     └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use telemetry_demo::config::schema::{LoadProfile, TransportMode};
use telemetry_demo::config::{load_config, DemoConfig};
use telemetry_demo::lifecycle;
use telemetry_demo::observability::logging;

#[derive(Parser)]
#[command(name = "telemetry-demo")]
#[command(about = "HTTP service with simulated latency and failures, plus a built-in traffic generator")]
struct Args {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `load.profile`.
    #[arg(short, long, value_enum)]
    profile: Option<ProfileArg>,

    /// Override `load.transport`.
    #[arg(short, long, value_enum)]
    transport: Option<TransportArg>,

    /// Serve the endpoints without generating traffic.
    #[arg(long)]
    no_load: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    Comprehensive,
    Minimal,
    Custom,
}

#[derive(Clone, Copy, ValueEnum)]
enum TransportArg {
    Http,
    Direct,
}

impl Args {
    fn apply(&self, config: &mut DemoConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(profile) = self.profile {
            config.load.profile = match profile {
                ProfileArg::Comprehensive => LoadProfile::Comprehensive,
                ProfileArg::Minimal => LoadProfile::Minimal,
                ProfileArg::Custom => LoadProfile::Custom,
            };
        }
        if let Some(transport) = self.transport {
            config.load.transport = match transport {
                TransportArg::Http => TransportMode::Http,
                TransportArg::Direct => TransportMode::Direct,
            };
        }
        if self.no_load {
            config.load.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DemoConfig::default(),
    };
    args.apply(&mut config);

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "telemetry-demo starting");

    lifecycle::run(config).await?;
    Ok(())
}
