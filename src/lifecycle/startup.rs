//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Initialize all subsystems in dependency order
//! - Bind the listener and serve the operations
//! - Start the traffic scheduler against the running service
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The scheduler starts last, so the first firing finds a listening server

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::schema::{DemoConfig, TransportMode};
use crate::config::validation::validate_config;
use crate::config::ConfigError;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load::job::{ScheduleError, ScheduledJob};
use crate::load::profile::LoadSettings;
use crate::load::scheduler::{SchedulerHandle, TrafficScheduler};
use crate::load::transport::{DirectTransport, HttpTransport, Transport, TransportError};
use crate::observability::metrics;
use crate::simulator::random::{RandomSource, SeededRandom, ThreadRandom};
use crate::simulator::registry::OperationRegistry;

/// Reasons the service fails to start or stop cleanly.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("load generator transport: {0}")]
    Transport(#[from] TransportError),

    #[error("server error: {0}")]
    Server(String),
}

/// A started service: listener bound, server running, scheduler firing.
pub struct RunningService {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    registry: Arc<OperationRegistry>,
    server: JoinHandle<Result<(), std::io::Error>>,
    scheduler: Option<SchedulerHandle>,
}

impl RunningService {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn registry(&self) -> &Arc<OperationRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> Option<&SchedulerHandle> {
        self.scheduler.as_ref()
    }

    /// Trigger shutdown and wait for the scheduler and server to exit.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        if let Some(scheduler) = self.scheduler {
            scheduler.join().await;
        }
        match self.server.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(StartupError::Server(e.to_string())),
            Err(e) => return Err(StartupError::Server(e.to_string())),
        }
        tracing::info!("Shutdown complete");
        Ok(())
    }
}

/// Start everything and wait for a termination signal.
pub async fn run(config: DemoConfig) -> Result<(), StartupError> {
    let service = start(config).await?;
    signals::wait_for_signal().await;
    service.stop().await
}

/// Start with a registry built from `config.simulator`.
pub async fn start(config: DemoConfig) -> Result<RunningService, StartupError> {
    let registry = Arc::new(OperationRegistry::new(config.simulator.clone()));
    start_with_registry(config, registry).await
}

/// Start with a caller-supplied registry.
pub async fn start_with_registry(
    config: DemoConfig,
    registry: Arc<OperationRegistry>,
) -> Result<RunningService, StartupError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        service = %config.simulator.service_name,
        request_timeout_secs = config.timeouts.request_secs,
        load_enabled = config.load.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Validated above.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr)?;
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: config.listener.bind_address.clone(),
        source,
    })?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, registry.clone());
    let server = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let scheduler = if config.load.enabled {
        match start_scheduler(&config, &registry, local_addr, &shutdown) {
            Ok(handle) => Some(handle),
            Err(e) => {
                shutdown.trigger();
                let _ = server.await;
                return Err(e);
            }
        }
    } else {
        tracing::info!("Traffic scheduler disabled");
        None
    };

    Ok(RunningService {
        local_addr,
        shutdown,
        registry,
        server,
        scheduler,
    })
}

/// Base URL of the local listener, reachable from this host.
fn loopback_url(local_addr: SocketAddr) -> String {
    let mut addr = local_addr;
    if addr.ip().is_unspecified() {
        let loopback: IpAddr = match addr {
            SocketAddr::V4(_) => Ipv4Addr::LOCALHOST.into(),
            SocketAddr::V6(_) => Ipv6Addr::LOCALHOST.into(),
        };
        addr.set_ip(loopback);
    }
    format!("http://{}", addr)
}

fn build_scheduler<T: Transport>(
    jobs: Vec<ScheduledJob>,
    transport: T,
    settings: &LoadSettings,
    random: Arc<dyn RandomSource>,
    shutdown: &Shutdown,
) -> Result<SchedulerHandle, ScheduleError> {
    TrafficScheduler::new(jobs, Arc::new(transport))
        .with_workers(settings.workers)
        .with_preview_chars(settings.preview_chars)
        .with_random(random)
        .start(shutdown)
}

fn start_scheduler(
    config: &DemoConfig,
    registry: &Arc<OperationRegistry>,
    local_addr: SocketAddr,
    shutdown: &Shutdown,
) -> Result<SchedulerHandle, StartupError> {
    let settings = config.load.resolve();
    let jobs = settings
        .jobs
        .iter()
        .map(ScheduledJob::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let random: Arc<dyn RandomSource> = match config.simulator.seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    };

    tracing::info!(
        profile = ?config.load.profile,
        transport = ?config.load.transport,
        jobs = jobs.len(),
        workers = settings.workers,
        "Starting traffic scheduler"
    );

    let handle = match config.load.transport {
        TransportMode::Http => {
            let base_url = config
                .load
                .target_url
                .clone()
                .unwrap_or_else(|| loopback_url(local_addr));
            let transport = HttpTransport::new(&base_url, settings.connect_timeout, settings.read_timeout)?;
            tracing::info!(target_url = %transport.base_url(), "Load generator using HTTP transport");
            build_scheduler(jobs, transport, &settings, random, shutdown)?
        }
        TransportMode::Direct => {
            tracing::info!("Load generator using direct transport");
            build_scheduler(jobs, DirectTransport::new(registry.clone()), &settings, random, shutdown)?
        }
    };
    Ok(handle)
}
