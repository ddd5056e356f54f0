//! Outbound transport used by the scheduler.
//!
//! # Implementations
//! - [`HttpTransport`]: GET against a base URL with connect and read timeouts
//! - [`DirectTransport`]: resolves the path locally and invokes the registry
//!
//! # Design Decisions
//! - Non-2xx responses are failures carrying status and body preview
//! - No retries here; every firing is already a fresh attempt

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

use crate::config::schema::SimulatorConfig;
use crate::http::response::{error_body, status_for};
use crate::load::outcome::truncate_preview;
use crate::simulator::operation::Invocation;
use crate::simulator::registry::OperationRegistry;

const ERROR_BODY_CHARS: usize = 200;
const HEALTH_BODY: &str = r#"{"status":"UP"}"#;

/// Errors observed when calling an endpoint.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Connect or read timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Any other request failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The transport could not be constructed.
    #[error("invalid transport configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// `call(path) -> body` boundary between the scheduler and the service.
pub trait Transport: Send + Sync + 'static {
    fn call(&self, path: &str) -> impl Future<Output = Result<String, TransportError>> + Send;
}

/// HTTP transport backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, connect_timeout: Duration, read_timeout: Duration) -> Result<Self, TransportError> {
        let parsed = Url::parse(base_url).map_err(|e| TransportError::Config(format!("{}: {}", base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::Config(format!("unsupported scheme in {}", base_url)));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .user_agent(concat!("telemetry-demo-loadgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    async fn call(&self, path: &str) -> Result<String, TransportError> {
        let response = self.client.get(format!("{}{}", self.base_url, path)).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_preview(&body, ERROR_BODY_CHARS),
            });
        }
        Ok(body)
    }
}

/// Where a path leads when resolved without the HTTP router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Invoke(Invocation),
    Health,
}

/// Resolve a request path (with optional query) to an operation.
///
/// Mirrors the HTTP router, including `/calc` defaults.
pub fn resolve_path(path: &str, config: &SimulatorConfig) -> Result<Route, TransportError> {
    let url = Url::parse("http://direct.invalid")
        .and_then(|base| base.join(path))
        .map_err(|e| bad_request(format!("invalid path {}: {}", path, e)))?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let route = match segments.as_slice() {
        ["hello"] => Route::Invoke(Invocation::Hello),
        ["calc"] => {
            let mut x = config.calc_default_x;
            let mut y = config.calc_default_y;
            for (key, value) in url.query_pairs() {
                let parsed = || {
                    value
                        .parse::<i32>()
                        .map_err(|_| bad_request(format!("invalid integer for {}: {}", key, value)))
                };
                match key.as_ref() {
                    "x" => x = parsed()?,
                    "y" => y = parsed()?,
                    _ => {}
                }
            }
            Route::Invoke(Invocation::Calc { x, y })
        }
        ["slow"] => Route::Invoke(Invocation::Slow),
        ["users"] => Route::Invoke(Invocation::UsersList),
        ["users", id] => {
            let id = percent_decode_str(id)
                .decode_utf8()
                .map_err(|e| bad_request(format!("invalid user id {}: {}", id, e)))?;
            Route::Invoke(Invocation::UsersGet { id: id.into_owned() })
        }
        ["orders"] => Route::Invoke(Invocation::OrdersList),
        ["error"] => Route::Invoke(Invocation::Error),
        ["actuator", "health"] => Route::Health,
        _ => {
            return Err(TransportError::Status {
                status: 404,
                body: format!("no route for {}", path),
            })
        }
    };
    Ok(route)
}

fn bad_request(body: String) -> TransportError {
    TransportError::Status { status: 400, body }
}

/// In-process transport that skips the network entirely.
#[derive(Clone)]
pub struct DirectTransport {
    registry: Arc<OperationRegistry>,
}

impl DirectTransport {
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }
}

impl Transport for DirectTransport {
    async fn call(&self, path: &str) -> Result<String, TransportError> {
        match resolve_path(path, self.registry.config())? {
            Route::Health => Ok(HEALTH_BODY.to_string()),
            Route::Invoke(invocation) => match self.registry.invoke(invocation).await {
                Ok(output) => Ok(output.body()),
                Err(err) => Err(TransportError::Status {
                    status: status_for(err.kind).as_u16(),
                    body: error_body(&err).to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::observation::{MemorySink, ObservationSink};
    use crate::simulator::random::SequenceRandom;

    #[test]
    fn test_resolve_known_paths() {
        let config = SimulatorConfig::default();
        assert_eq!(resolve_path("/hello", &config).unwrap(), Route::Invoke(Invocation::Hello));
        assert_eq!(
            resolve_path("/calc?x=21&y=2", &config).unwrap(),
            Route::Invoke(Invocation::Calc { x: 21, y: 2 })
        );
        assert_eq!(
            resolve_path("/calc", &config).unwrap(),
            Route::Invoke(Invocation::Calc { x: 10, y: 20 })
        );
        assert_eq!(
            resolve_path("/users/7", &config).unwrap(),
            Route::Invoke(Invocation::UsersGet { id: "7".into() })
        );
        assert_eq!(resolve_path("/actuator/health", &config).unwrap(), Route::Health);
    }

    #[test]
    fn test_resolve_decodes_user_id() {
        let config = SimulatorConfig::default();
        assert_eq!(
            resolve_path("/users/a%20b", &config).unwrap(),
            Route::Invoke(Invocation::UsersGet { id: "a b".into() })
        );
        assert!(matches!(
            resolve_path("/users/%FF", &config),
            Err(TransportError::Status { status: 400, .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_unknown_and_malformed() {
        let config = SimulatorConfig::default();
        assert!(matches!(
            resolve_path("/nope", &config),
            Err(TransportError::Status { status: 404, .. })
        ));
        assert!(matches!(
            resolve_path("/calc?x=abc", &config),
            Err(TransportError::Status { status: 400, .. })
        ));
    }

    #[test]
    fn test_http_transport_rejects_bad_base_url() {
        let timeout = Duration::from_secs(1);
        assert!(HttpTransport::new("not a url", timeout, timeout).is_err());
        assert!(HttpTransport::new("ftp://127.0.0.1", timeout, timeout).is_err());
        let transport = HttpTransport::new("http://127.0.0.1:8088/", timeout, timeout).unwrap();
        assert_eq!(transport.base_url(), "http://127.0.0.1:8088");
    }

    #[tokio::test]
    async fn test_direct_transport_maps_failures_to_status() {
        let memory = Arc::new(MemorySink::new());
        let registry = Arc::new(OperationRegistry::with_parts(
            SimulatorConfig::default(),
            Arc::new(SequenceRandom::new([0])),
            vec![memory.clone() as Arc<dyn ObservationSink>],
        ));
        let transport = DirectTransport::new(registry);

        // A draw of 0 triggers not-found for user lookups.
        match transport.call("/users/3").await {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert!(body.contains("not_found"));
            }
            other => panic!("unexpected {:?}", other),
        }

        let health = transport.call("/actuator/health").await.unwrap();
        assert_eq!(health, HEALTH_BODY);
        // The liveness probe is not a simulated operation.
        assert_eq!(memory.observations().len(), 1);
    }
}
