// SPDX-FileCopyrightText: 2026 Flowershop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Flowershop order engine.

use thiserror::Error;

/// The primary error type used across all Flowershop adapters and core operations.
#[derive(Debug, Error)]
pub enum FlowerError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Session, order, or assignment write/read failed.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Bad user input. Recovered locally by re-prompting.
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// A referenced item, worker, order, or assignment does not exist.
    #[error("{kind} {id} not found")]
    ReferenceNotFound { kind: &'static str, id: String },

    /// No worker of the requested kind is currently active.
    #[error("no available {kind}")]
    NoAvailableWorker { kind: String },

    /// The session lacks fields required to build an order.
    #[error("incomplete order data, missing: {}", missing.join(", "))]
    IncompleteOrderData { missing: Vec<&'static str> },

    /// An outbound send did not complete in time.
    #[error("gateway send timed out after {duration:?}")]
    GatewayTimeout { duration: std::time::Duration },

    /// The notification gateway rejected or failed a send/receive.
    #[error("gateway error: {message}")]
    Gateway {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowerError {
    /// Shorthand for a missing-reference error.
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        FlowerError::ReferenceNotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether the failure happened in the outbound transport rather than in durable state.
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            FlowerError::GatewayTimeout { .. } | FlowerError::Gateway { .. }
        )
    }
}
