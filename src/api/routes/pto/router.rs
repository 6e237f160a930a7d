//! Router for the PTO API

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
use crate::pto::{db, ledger};

type SharedState = Arc<RwLock<AppState>>;

async fn submit_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(new): Json<public::NewPtoRequest>,
) -> Result<(StatusCode, Json<public::PtoRequest>), crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let db = { state.read().unwrap().db.clone() };

    let request = ledger::submit(&db, new, &actor).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_handler(
    State(state): State<SharedState>,
    Query(query): Query<public::PtoListQuery>,
) -> Result<Json<Vec<public::PtoRequest>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let requests =
        db::list_requests(&db, query.employee_id, query.status, query.department).await?;
    Ok(Json(requests))
}

async fn get_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<public::PtoRequest>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let request = db::get_request(&db, &id).await?;
    Ok(Json(request))
}

async fn approve_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<public::ReviewRequest>>,
) -> Result<Json<public::PtoRequest>, crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let comment = body.and_then(|Json(review)| review.comment);
    let db = { state.read().unwrap().db.clone() };

    let request = ledger::approve(&db, &id, &actor, comment).await?;
    Ok(Json(request))
}

async fn reject_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<public::ReviewRequest>>,
) -> Result<Json<public::PtoRequest>, crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let comment = body.and_then(|Json(review)| review.comment);
    let db = { state.read().unwrap().db.clone() };

    let request = ledger::reject(&db, &id, &actor, comment).await?;
    Ok(Json(request))
}

async fn cancel_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<public::PtoRequest>, crate::api::public::ApiError> {
    let actor = actor_from_headers(&headers)?;
    let db = { state.read().unwrap().db.clone() };

    let request = ledger::cancel(&db, &id, &actor).await?;
    Ok(Json(request))
}

async fn audit_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<public::AuditEntry>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let trail = db::request_audit(&db, &id).await?;
    Ok(Json(trail))
}

async fn balance_handler(
    State(state): State<SharedState>,
    Path(employee_id): Path<String>,
) -> Result<Json<public::BalanceResponse>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let employee = db::get_employee(&db, &employee_id).await?;
    Ok(Json(public::BalanceResponse {
        employee_id: employee.id,
        pto_balance: employee.pto_balance,
    }))
}

/// Create the PTO router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/",
            axum::routing::post(submit_handler).get(list_handler),
        )
        .route("/{id}", axum::routing::get(get_handler))
        .route("/{id}/approve", axum::routing::post(approve_handler))
        .route("/{id}/reject", axum::routing::post(reject_handler))
        .route("/{id}/cancel", axum::routing::post(cancel_handler))
        .route("/{id}/audit", axum::routing::get(audit_handler))
        .route("/balance/{employee_id}", axum::routing::get(balance_handler))
}
