//! Router for the availability API

use std::sync::{Arc, RwLock};

use axum::{Json, Router, extract::State};
use chrono::NaiveTime;

use super::public;
use crate::api::state::AppState;
use crate::calendar::db::{busy_events_between, load_business_hours};
use crate::schedule::{check_availability, generate_slots};

type SharedState = Arc<RwLock<AppState>>;

async fn slots_handler(
    State(state): State<SharedState>,
    Json(req): Json<public::SlotRequest>,
) -> Result<Json<Vec<public::Slot>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let hours = load_business_hours(&db).await?;
    let slots = generate_slots(req.start_date, req.end_date, req.duration_minutes, &hours)?;
    Ok(Json(slots))
}

async fn check_handler(
    State(state): State<SharedState>,
    Json(req): Json<public::AvailabilityRequest>,
) -> Result<Json<Vec<public::SlotAvailability>>, crate::api::public::ApiError> {
    let db = { state.read().unwrap().db.clone() };

    let hours = load_business_hours(&db).await?;
    let slots = generate_slots(req.start_date, req.end_date, req.duration_minutes, &hours)?;

    // Busy universe spans the whole requested range of days
    let from = req
        .start_date
        .and_time(NaiveTime::MIN)
        .and_utc();
    let to = req
        .end_date
        .succ_opt()
        .unwrap_or(req.end_date)
        .and_time(NaiveTime::MIN)
        .and_utc();
    let events = busy_events_between(&db, from, to).await?;

    Ok(Json(check_availability(&slots, &events, &req.attendee_emails)))
}

/// Create the availability router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/slots", axum::routing::post(slots_handler))
        .route("/check", axum::routing::post(check_handler))
}
