//! Router for the outbox API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
};
use axum_extra::extract::Query;
use http::StatusCode;

use super::public;
use crate::api::state::AppState;
use crate::outbox;

type SharedState = Arc<RwLock<AppState>>;

async fn queue_handler(
    State(state): State<SharedState>,
    Json(notification): Json<public::QueueNotification>,
) -> Result<(StatusCode, Json<public::OutboxEntry>), crate::api::public::ApiError> {
    let (db, config) = {
        let shared_state = state.read().unwrap();
        (shared_state.db.clone(), shared_state.config.clone())
    };

    let entry = outbox::queue_and_send(&db, &config, notification).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn resend_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<public::OutboxEntry>), crate::api::public::ApiError> {
    let (db, config) = {
        let shared_state = state.read().unwrap();
        (shared_state.db.clone(), shared_state.config.clone())
    };

    let entry = outbox::resend(&db, &config, &id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn list_handler(
    State(state): State<SharedState>,
    Query(query): Query<public::OutboxListQuery>,
) -> Result<Json<Vec<public::OutboxEntry>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let entries = outbox::db::list_entries(&db, query.event_id, query.status).await?;
    Ok(Json(entries))
}

/// Create the outbox router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", axum::routing::post(queue_handler).get(list_handler))
        .route("/{id}/resend", axum::routing::post(resend_handler))
}
