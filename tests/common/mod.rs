//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use telemetry_demo::config::schema::{DelayRange, SimulatorConfig};
use telemetry_demo::config::DemoConfig;
use telemetry_demo::lifecycle::startup::{start_with_registry, RunningService};
use telemetry_demo::simulator::{MemorySink, ObservationSink, OperationRegistry, RandomSource};

/// Config bound to an ephemeral loopback port, metrics and load off.
pub fn test_config() -> DemoConfig {
    let mut config = DemoConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.observability.metrics_enabled = false;
    config.load.enabled = false;
    config
}

/// Simulator config with delays short enough for real-time tests.
pub fn fast_simulator() -> SimulatorConfig {
    SimulatorConfig {
        calc_delay: DelayRange { min_ms: 1, max_ms: 5 },
        slow_delay: DelayRange { min_ms: 10, max_ms: 20 },
        ..SimulatorConfig::default()
    }
}

/// Registry reporting into an in-memory sink.
pub fn recording_registry(
    config: SimulatorConfig,
    random: Arc<dyn RandomSource>,
) -> (Arc<OperationRegistry>, Arc<MemorySink>) {
    let memory = Arc::new(MemorySink::new());
    let registry = Arc::new(OperationRegistry::with_parts(
        config,
        random,
        vec![memory.clone() as Arc<dyn ObservationSink>],
    ));
    (registry, memory)
}

/// Start the full service around `registry`.
pub async fn start_service(mut config: DemoConfig, registry: Arc<OperationRegistry>) -> RunningService {
    config.simulator = registry.config().clone();
    start_with_registry(config, registry).await.unwrap()
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

/// Start a programmable raw HTTP backend on an ephemeral port.
///
/// Every connection gets the `(status, body)` produced by `f`, after `delay`.
pub async fn start_programmable_backend<F, Fut>(delay: Duration, f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                tokio::time::sleep(delay).await;

                let (status, body) = f().await;
                let status_text = match status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
