//! The PTO state machine.
//!
//! Approval applies three effects as one transaction: the conditional
//! balance debit, the all-day calendar event, and the status flip. The
//! status guard on every UPDATE means a concurrent transition loses
//! with `ConflictError` instead of applying twice.

use anyhow::Result;
use rusqlite::params;
use serde_json::json;
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::days;
use super::db::{get_employee_inner, get_request_inner, record_pto_audit};
use super::models::{NewPtoRequest, PtoRequest, PtoStatus};
use crate::calendar::db as calendar_db;
use crate::calendar::{AttendeeType, CalendarEvent, EventStatus, EventType, NewAttendee};
use crate::core::db::{format_utc, now_utc};
use crate::core::{Actor, EngineError};

fn insert_request_inner(conn: &rusqlite::Connection, request: &PtoRequest) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO pto_request
         (id, employee_id, employee_name, start_date, end_date, is_full_day, start_time,
          end_time, reason, status, manager_id, manager_comment, department, days_requested,
          pto_balance_before, pto_balance_after, calendar_event_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19)",
        params![
            request.id,
            request.employee_id,
            request.employee_name,
            request.start_date.to_string(),
            request.end_date.to_string(),
            request.is_full_day,
            request.start_time.map(|t| t.format("%H:%M").to_string()),
            request.end_time.map(|t| t.format("%H:%M").to_string()),
            request.reason,
            request.status.as_str(),
            request.manager_id,
            request.manager_comment,
            request.department,
            request.days_requested,
            request.pto_balance_before,
            request.pto_balance_after,
            request.calendar_event_id,
            format_utc(&request.created_at),
            format_utc(&request.updated_at),
        ],
    )?;
    Ok(())
}

/// File a request in `pending`. The balance is only checked here, not
/// moved; the recorded after-balance is provisional until approval.
pub async fn submit(db: &Connection, new: NewPtoRequest, actor: &Actor) -> Result<PtoRequest> {
    let days = days::days_requested(
        new.start_date,
        new.end_date,
        new.is_full_day,
        new.start_time,
        new.end_time,
    )?;
    let actor = actor.clone();
    let id = Uuid::new_v4().to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(employee) = get_employee_inner(&tx, &new.employee_id)? else {
                return Ok(Err(EngineError::NotFound(format!(
                    "employee {}",
                    new.employee_id
                ))));
            };
            if days > employee.pto_balance {
                return Ok(Err(EngineError::InsufficientBalance {
                    requested: days,
                    available: employee.pto_balance,
                }));
            }
            let Some(manager_id) = new.manager_id.clone().or_else(|| employee.manager_id.clone())
            else {
                return Ok(Err(EngineError::Validation(
                    "employee has no assigned manager".to_string(),
                )));
            };

            let request = PtoRequest {
                id: id.clone(),
                employee_id: employee.id.clone(),
                employee_name: employee.name.clone(),
                start_date: new.start_date,
                end_date: new.end_date,
                is_full_day: new.is_full_day,
                start_time: new.start_time,
                end_time: new.end_time,
                reason: new.reason.clone(),
                status: PtoStatus::Pending,
                manager_id,
                manager_comment: None,
                department: employee.department.clone(),
                days_requested: days,
                pto_balance_before: employee.pto_balance,
                pto_balance_after: employee.pto_balance - days,
                calendar_event_id: None,
                created_at: now,
                updated_at: now,
            };
            insert_request_inner(&tx, &request)?;
            record_pto_audit(&tx, &id, &actor, "submitted", None, Some(&json!(request)), None, now)?;
            tx.commit()?;
            Ok(Ok(request))
        })
        .await?;
    Ok(result?)
}

/// Manager-only. Debits the balance, creates the linked all-day
/// calendar event and flips the request to `approved`, atomically.
pub async fn approve(
    db: &Connection,
    id: &str,
    actor: &Actor,
    comment: Option<String>,
) -> Result<PtoRequest> {
    let actor = actor.clone();
    let id = id.to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(request) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            if request.status != PtoStatus::Pending {
                return Ok(Err(EngineError::Conflict(format!(
                    "request is already {}",
                    request.status.as_str()
                ))));
            }
            if actor.id != request.manager_id {
                return Ok(Err(EngineError::Unauthorized(
                    "only the assigned manager can approve this request".to_string(),
                )));
            }
            let Some(employee) = get_employee_inner(&tx, &request.employee_id)? else {
                return Ok(Err(EngineError::NotFound(format!(
                    "employee {}",
                    request.employee_id
                ))));
            };

            // Claim the pending status first so a concurrent approval
            // loses here instead of double-debiting below
            let claimed = tx.execute(
                "UPDATE pto_request SET status = 'approved', updated_at = ?2
                 WHERE id = ?1 AND status = 'pending'",
                params![id, format_utc(&now)],
            )?;
            if claimed == 0 {
                return Ok(Err(EngineError::Conflict(
                    "request was updated concurrently".to_string(),
                )));
            }

            let debited = tx.execute(
                "UPDATE employee SET pto_balance = pto_balance - ?1
                 WHERE id = ?2 AND pto_balance >= ?1",
                params![request.days_requested, request.employee_id],
            )?;
            if debited == 0 {
                // Rolls back the status claim along with everything else
                return Ok(Err(EngineError::InsufficientBalance {
                    requested: request.days_requested,
                    available: employee.pto_balance,
                }));
            }

            let event_id = Uuid::new_v4().to_string();
            let start_time = request
                .start_date
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default()
                .and_utc();
            let end_time = request
                .end_date
                .and_hms_opt(23, 59, 0)
                .unwrap_or_default()
                .and_utc();
            let mut event = CalendarEvent {
                id: event_id.clone(),
                title: format!("PTO: {}", employee.name),
                event_type: EventType::Pto,
                start_time,
                end_time,
                all_day: true,
                status: EventStatus::Approved,
                description: request.reason.clone(),
                location: None,
                organizer_id: Some(request.manager_id.clone()),
                google_meet_url: None,
                google_calendar_id: None,
                meta: json!({}),
                attendees: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            calendar_db::insert_event_inner(&tx, &event)?;
            calendar_db::insert_attendees_inner(
                &tx,
                &event_id,
                &[NewAttendee {
                    attendee_type: AttendeeType::Employee,
                    attendee_id: Some(employee.id.clone()),
                    name: employee.name.clone(),
                    email: employee.email.clone(),
                    response_status: Some("accepted".to_string()),
                }],
            )?;
            event.attendees = calendar_db::attendees_inner(&tx, &event_id)?;
            calendar_db::record_event_audit(
                &tx,
                &event_id,
                &actor,
                "created",
                None,
                Some(&json!(event)),
                None,
                now,
            )?;

            // Make the provisional balance snapshots actual
            tx.execute(
                "UPDATE pto_request SET manager_comment = ?2, pto_balance_before = ?3,
                 pto_balance_after = ?4, calendar_event_id = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    id,
                    comment,
                    employee.pto_balance,
                    employee.pto_balance - request.days_requested,
                    event_id,
                    format_utc(&now),
                ],
            )?;

            let Some(approved) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            record_pto_audit(
                &tx,
                &id,
                &actor,
                "approved",
                Some(&json!(request)),
                Some(&json!(approved)),
                comment.as_deref(),
                now,
            )?;
            tx.commit()?;
            Ok(Ok(approved))
        })
        .await?;
    Ok(result?)
}

/// Manager-only. The balance is untouched since it was never debited.
pub async fn reject(
    db: &Connection,
    id: &str,
    actor: &Actor,
    comment: Option<String>,
) -> Result<PtoRequest> {
    let actor = actor.clone();
    let id = id.to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(request) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            if request.status != PtoStatus::Pending {
                return Ok(Err(EngineError::Conflict(format!(
                    "request is already {}",
                    request.status.as_str()
                ))));
            }
            if actor.id != request.manager_id {
                return Ok(Err(EngineError::Unauthorized(
                    "only the assigned manager can reject this request".to_string(),
                )));
            }

            let changed = tx.execute(
                "UPDATE pto_request SET status = 'rejected', manager_comment = ?2,
                 updated_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, comment, format_utc(&now)],
            )?;
            if changed == 0 {
                return Ok(Err(EngineError::Conflict(
                    "request was updated concurrently".to_string(),
                )));
            }

            let Some(rejected) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            record_pto_audit(
                &tx,
                &id,
                &actor,
                "denied",
                Some(&json!(request)),
                Some(&json!(rejected)),
                comment.as_deref(),
                now,
            )?;
            tx.commit()?;
            Ok(Ok(rejected))
        })
        .await?;
    Ok(result?)
}

/// Owner or manager. Cancelling an approved request restores the
/// balance and soft-cancels the linked calendar event; cancelling a
/// pending one has no balance effect.
pub async fn cancel(db: &Connection, id: &str, actor: &Actor) -> Result<PtoRequest> {
    let actor = actor.clone();
    let id = id.to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(request) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            if !matches!(request.status, PtoStatus::Pending | PtoStatus::Approved) {
                return Ok(Err(EngineError::Conflict(format!(
                    "request is already {}",
                    request.status.as_str()
                ))));
            }
            if actor.id != request.employee_id && actor.id != request.manager_id {
                return Ok(Err(EngineError::Unauthorized(
                    "only the request owner or their manager can cancel it".to_string(),
                )));
            }

            let changed = tx.execute(
                "UPDATE pto_request SET status = 'cancelled', updated_at = ?3
                 WHERE id = ?1 AND status = ?2",
                params![id, request.status.as_str(), format_utc(&now)],
            )?;
            if changed == 0 {
                return Ok(Err(EngineError::Conflict(
                    "request was updated concurrently".to_string(),
                )));
            }

            if request.status == PtoStatus::Approved {
                tx.execute(
                    "UPDATE employee SET pto_balance = pto_balance + ?1 WHERE id = ?2",
                    params![request.days_requested, request.employee_id],
                )?;
                if let Some(event_id) = &request.calendar_event_id {
                    if let Some(event) = calendar_db::get_event_inner(&tx, event_id)? {
                        if event.status != EventStatus::Cancelled {
                            calendar_db::set_event_status_inner(
                                &tx,
                                event_id,
                                EventStatus::Cancelled,
                                now,
                            )?;
                            calendar_db::record_event_audit(
                                &tx,
                                event_id,
                                &actor,
                                "cancelled",
                                Some(&json!(event)),
                                None,
                                None,
                                now,
                            )?;
                        }
                    }
                }
            }

            let Some(cancelled) = get_request_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("PTO request {}", id))));
            };
            record_pto_audit(
                &tx,
                &id,
                &actor,
                "cancelled",
                Some(&json!(request)),
                Some(&json!(cancelled)),
                None,
                now,
            )?;
            tx.commit()?;
            Ok(Ok(cancelled))
        })
        .await?;
    Ok(result?)
}
