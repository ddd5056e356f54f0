//! The operation catalog and its request/response types.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A named unit of simulated work.
///
/// The catalog is closed: new operations are added as variants here and
/// given a profile in [`crate::simulator::behavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Hello,
    Calc,
    Slow,
    UsersList,
    UsersGet,
    OrdersList,
    Error,
}

/// Shape of a successful payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Json,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::Hello,
        Operation::Calc,
        Operation::Slow,
        Operation::UsersList,
        Operation::UsersGet,
        Operation::OrdersList,
        Operation::Error,
    ];

    /// Stable identity used in logs, span names and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Hello => "hello",
            Operation::Calc => "calc",
            Operation::Slow => "slow",
            Operation::UsersList => "users.list",
            Operation::UsersGet => "users.get",
            Operation::OrdersList => "orders.list",
            Operation::Error => "error",
        }
    }

    /// Route template, never the concrete path.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Operation::Hello => "/hello",
            Operation::Calc => "/calc",
            Operation::Slow => "/slow",
            Operation::UsersList => "/users",
            Operation::UsersGet => "/users/{id}",
            Operation::OrdersList => "/orders",
            Operation::Error => "/error",
        }
    }

    pub fn content_kind(&self) -> ContentKind {
        match self {
            Operation::UsersList | Operation::UsersGet | Operation::OrdersList => ContentKind::Json,
            _ => ContentKind::Text,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An operation together with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Hello,
    Calc { x: i32, y: i32 },
    Slow,
    UsersList,
    UsersGet { id: String },
    OrdersList,
    Error,
}

impl Invocation {
    pub fn operation(&self) -> Operation {
        match self {
            Invocation::Hello => Operation::Hello,
            Invocation::Calc { .. } => Operation::Calc,
            Invocation::Slow => Operation::Slow,
            Invocation::UsersList => Operation::UsersList,
            Invocation::UsersGet { .. } => Operation::UsersGet,
            Invocation::OrdersList => Operation::OrdersList,
            Invocation::Error => Operation::Error,
        }
    }
}

/// Successful result of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Text(String),
    Json(serde_json::Value),
}

impl OperationOutput {
    /// Body as it would be sent over the wire.
    pub fn body(&self) -> String {
        match self {
            OperationOutput::Text(text) => text.clone(),
            OperationOutput::Json(value) => value.to_string(),
        }
    }
}

/// Payload of `users.list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserList {
    pub users: Vec<String>,
    pub total: usize,
    pub timestamp: u64,
}

/// Payload of `users.get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    /// RFC 3339 timestamp.
    pub created: String,
}

/// Payload of `orders.list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBatch {
    pub orders: Vec<String>,
    pub count: usize,
    pub total_value: f64,
    pub currency: String,
}

/// Failure categories an operation can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Runtime,
    Validation,
    State,
    /// The invocation was dropped before it finished.
    Cancelled,
}

impl ErrorKind {
    /// The three kinds the `error` operation rotates through.
    pub const SIMULATED: [ErrorKind; 3] = [ErrorKind::Runtime, ErrorKind::Validation, ErrorKind::State];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Runtime => "runtime",
            ErrorKind::Validation => "validation",
            ErrorKind::State => "state",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deliberate, operation-defined failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SimulatedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SimulatedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
