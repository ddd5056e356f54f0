//! Response handling and transformation.
//!
//! # Responsibilities
//! - Render operation output as plain text or JSON
//! - Map simulated failures to tagged error payloads and status codes
//!
//! # Status Mapping
//! ```text
//! not_found  → 404
//! validation → 400
//! runtime    → 500
//! state      → 500
//! cancelled  → 503
//! ```

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::simulator::operation::{ErrorKind, OperationOutput, SimulatedError};

/// HTTP status for a failure kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Runtime | ErrorKind::State => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Tagged error payload.
pub fn error_body(err: &SimulatedError) -> serde_json::Value {
    json!({
        "error": err.kind.as_str(),
        "message": err.message,
    })
}

impl IntoResponse for OperationOutput {
    fn into_response(self) -> Response {
        match self {
            OperationOutput::Text(text) => {
                ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
            }
            OperationOutput::Json(value) => Json(value).into_response(),
        }
    }
}

impl IntoResponse for SimulatedError {
    fn into_response(self) -> Response {
        (status_for(self.kind), Json(error_body(&self))).into_response()
    }
}
