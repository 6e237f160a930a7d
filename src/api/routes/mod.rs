//! API routes module

pub mod availability;
pub mod events;
pub mod outbox;
pub mod pto;

use std::sync::{Arc, RwLock};

use axum::Router;
use http::HeaderMap;

use crate::api::state::AppState;
use crate::core::{Actor, EngineError};

type SharedState = Arc<RwLock<AppState>>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Slot generation and free/busy checks
        .nest("/availability", availability::router())
        // Event store
        .nest("/events", events::router())
        // PTO ledger
        .nest("/pto", pto::router())
        // Notification outbox
        .nest("/outbox", outbox::router())
}

/// Resolve the acting user from the identity headers the session layer
/// sets. Every mutating endpoint requires `X-Actor-Id`; the display
/// name falls back to the id when absent.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, EngineError> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| EngineError::Unauthorized("missing X-Actor-Id header".to_string()))?;
    let name = headers
        .get("x-actor-name")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(id);
    Ok(Actor::new(id, name))
}
