//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router mapping endpoints to operations
//! - Wire up middleware (tracing, request ID, timeout)
//! - Bind server to listener
//! - Stop gracefully on the shared shutdown signal

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DemoConfig;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::simulator::operation::{Invocation, OperationOutput, SimulatedError};
use crate::simulator::registry::OperationRegistry;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<OperationRegistry>,
}

/// HTTP server exposing the simulated operations.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &DemoConfig, registry: Arc<OperationRegistry>) -> Self {
        let state = AppState { registry };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DemoConfig, state: AppState) -> Router {
        Router::new()
            .route("/hello", get(hello))
            .route("/calc", get(calc))
            .route("/slow", get(slow))
            .route("/users", get(list_users))
            .route("/users/{id}", get(get_user))
            .route("/orders", get(list_orders))
            .route("/error", get(error))
            .route("/actuator/health", get(health))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

type OperationResult = Result<OperationOutput, SimulatedError>;

async fn invoke(state: &AppState, invocation: Invocation) -> OperationResult {
    state.registry.invoke(invocation).await
}

async fn hello(State(state): State<AppState>) -> OperationResult {
    invoke(&state, Invocation::Hello).await
}

/// `/calc` query. Missing values fall back to the configured defaults.
#[derive(Debug, Deserialize)]
struct CalcParams {
    x: Option<i32>,
    y: Option<i32>,
}

async fn calc(State(state): State<AppState>, Query(params): Query<CalcParams>) -> OperationResult {
    let config = state.registry.config();
    let invocation = Invocation::Calc {
        x: params.x.unwrap_or(config.calc_default_x),
        y: params.y.unwrap_or(config.calc_default_y),
    };
    invoke(&state, invocation).await
}

async fn slow(State(state): State<AppState>) -> OperationResult {
    invoke(&state, Invocation::Slow).await
}

async fn list_users(State(state): State<AppState>) -> OperationResult {
    invoke(&state, Invocation::UsersList).await
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> OperationResult {
    invoke(&state, Invocation::UsersGet { id }).await
}

async fn list_orders(State(state): State<AppState>) -> OperationResult {
    invoke(&state, Invocation::OrdersList).await
}

async fn error(State(state): State<AppState>) -> OperationResult {
    invoke(&state, Invocation::Error).await
}

/// Liveness probe, outside the simulated catalog.
async fn health() -> Response {
    Json(json!({ "status": "UP" })).into_response()
}
