//! Error taxonomy for the scheduling engine.
//!
//! Every fallible operation surfaces one of these variants; the API
//! layer downcasts from `anyhow::Error` to map them onto HTTP status
//! codes. `Delivery` is the odd one out: once an outbox row exists a
//! failed send is recorded on the row and never returned to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("insufficient PTO balance: requested {requested} days but only {available} available")]
    InsufficientBalance { requested: f64, available: f64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("no recipients resolved for notification")]
    NoRecipients,

    #[error("delivery failed: {0}")]
    Delivery(String),
}
