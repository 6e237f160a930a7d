//! Router for the events API

use std::sync::{Arc, RwLock};

use axum::{
    Json, Router,
    extract::{Path, State},
};
use axum_extra::extract::Query;
use http::{HeaderMap, StatusCode};

use super::public;
use crate::api::routes::actor_from_headers;
use crate::api::state::AppState;
use crate::calendar::db;

type SharedState = Arc<RwLock<AppState>>;

async fn create_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(new): Json<public::NewEvent>,
) -> Result<(StatusCode, Json<public::CalendarEvent>), crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let db = { state.read().unwrap().db.clone() };

    let event = db::create_event(&db, new, &actor).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn list_handler(
    State(state): State<SharedState>,
    Query(query): Query<public::EventListQuery>,
) -> Result<Json<Vec<public::CalendarEvent>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let events = db::list_events(&db, query.from, query.to, query.event_type, query.status).await?;
    Ok(Json(events))
}

async fn get_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::CalendarEvent>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let event = db::get_event(&db, &id).await?;
    Ok(Json(event))
}

async fn update_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<public::EventPatch>,
) -> Result<Json<public::CalendarEvent>, crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let db = { state.read().unwrap().db.clone() };

    let event = db::update_event(&db, &id, patch, &actor).await?;
    Ok(Json(event))
}

async fn cancel_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<public::CalendarEvent>, crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let db = { state.read().unwrap().db.clone() };

    let event = db::cancel_event(&db, &id, &actor).await?;
    Ok(Json(event))
}

async fn audit_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<public::AuditEntry>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let trail = db::event_audit(&db, &id).await?;
    Ok(Json(trail))
}

/// Create the events router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            axum::routing::post(create_handler).get(list_handler),
        )
        .route(
            "/{id}",
            axum::routing::get(get_handler)
                .patch(update_handler)
                .delete(cancel_handler),
        )
        .route("/{id}/audit", axum::routing::get(audit_handler))
}
