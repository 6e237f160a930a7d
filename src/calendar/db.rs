//! Persistence for the event store.
//!
//! Every mutation runs in a single transaction together with the audit
//! entry that records it. Events are never hard-deleted; cancellation
//! flips the status and keeps the row and its attendees.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use serde_json::{Value, json};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use super::models::{
    Attendee, AttendeeType, CalendarEvent, EventPatch, EventStatus, EventType, NewAttendee,
    NewEvent,
};
use crate::core::audit::{AuditEntry, audit_from_row};
use crate::core::db::{column_utc, format_utc, invalid_column, now_utc, parse_hhmm};
use crate::core::{Actor, EngineError};
use crate::schedule::{BusinessHours, BusyEvent};

const EVENT_COLUMNS: &str = "id, title, event_type, start_time, end_time, all_day, status, \
     description, location, organizer_id, google_meet_url, google_calendar_id, meta, \
     created_at, updated_at";

fn event_from_row(row: &rusqlite::Row) -> rusqlite::Result<CalendarEvent> {
    let event_type: String = row.get(2)?;
    let status: String = row.get(6)?;
    let meta: String = row.get(12)?;
    Ok(CalendarEvent {
        id: row.get(0)?,
        title: row.get(1)?,
        event_type: EventType::parse(&event_type).map_err(|e| invalid_column(2, e))?,
        start_time: column_utc(row, 3)?,
        end_time: column_utc(row, 4)?,
        all_day: row.get(5)?,
        status: EventStatus::parse(&status).map_err(|e| invalid_column(6, e))?,
        description: row.get(7)?,
        location: row.get(8)?,
        organizer_id: row.get(9)?,
        google_meet_url: row.get(10)?,
        google_calendar_id: row.get(11)?,
        meta: serde_json::from_str(&meta).map_err(|e| invalid_column(12, e))?,
        attendees: Vec::new(),
        created_at: column_utc(row, 13)?,
        updated_at: column_utc(row, 14)?,
    })
}

fn attendee_from_row(row: &rusqlite::Row) -> rusqlite::Result<Attendee> {
    let attendee_type: String = row.get(2)?;
    Ok(Attendee {
        id: row.get(0)?,
        event_id: row.get(1)?,
        attendee_type: AttendeeType::parse(&attendee_type).map_err(|e| invalid_column(2, e))?,
        attendee_id: row.get(3)?,
        name: row.get(4)?,
        email: row.get(5)?,
        response_status: row.get(6)?,
    })
}

/// Attendees in insertion order.
pub(crate) fn attendees_inner(
    conn: &rusqlite::Connection,
    event_id: &str,
) -> rusqlite::Result<Vec<Attendee>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_id, attendee_type, attendee_id, name, email, response_status
         FROM event_attendee WHERE event_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![event_id], attendee_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub(crate) fn get_event_inner(
    conn: &rusqlite::Connection,
    id: &str,
) -> rusqlite::Result<Option<CalendarEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM calendar_event WHERE id = ?1",
        EVENT_COLUMNS
    ))?;
    let event = stmt.query_row(params![id], event_from_row).optional()?;
    match event {
        Some(mut event) => {
            event.attendees = attendees_inner(conn, id)?;
            Ok(Some(event))
        }
        None => Ok(None),
    }
}

pub(crate) fn insert_event_inner(
    conn: &rusqlite::Connection,
    event: &CalendarEvent,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO calendar_event
         (id, title, event_type, start_time, end_time, all_day, status, description,
          location, organizer_id, google_meet_url, google_calendar_id, meta,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            event.id,
            event.title,
            event.event_type.as_str(),
            format_utc(&event.start_time),
            format_utc(&event.end_time),
            event.all_day,
            event.status.as_str(),
            event.description,
            event.location,
            event.organizer_id,
            event.google_meet_url,
            event.google_calendar_id,
            event.meta.to_string(),
            format_utc(&event.created_at),
            format_utc(&event.updated_at),
        ],
    )?;
    Ok(())
}

pub(crate) fn insert_attendees_inner(
    conn: &rusqlite::Connection,
    event_id: &str,
    attendees: &[NewAttendee],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO event_attendee
         (event_id, attendee_type, attendee_id, name, email, response_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for attendee in attendees {
        stmt.execute(params![
            event_id,
            attendee.attendee_type.as_str(),
            attendee.attendee_id,
            attendee.name,
            attendee.email,
            attendee.response_status,
        ])?;
    }
    Ok(())
}

/// Conditional status flip; returns the number of rows changed so the
/// caller can detect a lost race.
pub(crate) fn set_event_status_inner(
    conn: &rusqlite::Connection,
    id: &str,
    status: EventStatus,
    now: DateTime<Utc>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE calendar_event SET status = ?2, updated_at = ?3
         WHERE id = ?1 AND status != 'cancelled'",
        params![id, status.as_str(), format_utc(&now)],
    )
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn record_event_audit(
    conn: &rusqlite::Connection,
    event_id: &str,
    actor: &Actor,
    action: &str,
    before: Option<&Value>,
    after: Option<&Value>,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO calendar_audit
         (event_id, actor_id, actor_name, action, before_state, after_state, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event_id,
            actor.id,
            actor.name,
            action,
            before.map(Value::to_string),
            after.map(Value::to_string),
            notes,
            format_utc(&now),
        ],
    )?;
    Ok(())
}

/// Persist an event plus its attendee set and the `created` audit
/// entry in one transaction.
pub async fn create_event(db: &Connection, new: NewEvent, actor: &Actor) -> Result<CalendarEvent> {
    new.validate()?;
    let actor = actor.clone();
    let id = Uuid::new_v4().to_string();
    let now = now_utc();

    let event = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let mut event = CalendarEvent {
                id: id.clone(),
                title: new.title,
                event_type: new.event_type,
                start_time: new.start_time,
                end_time: new.end_time,
                all_day: new.all_day,
                status: EventStatus::Scheduled,
                description: new.description,
                location: new.location,
                organizer_id: new.organizer_id,
                google_meet_url: new.google_meet_url,
                google_calendar_id: new.google_calendar_id,
                meta: new.meta,
                attendees: Vec::new(),
                created_at: now,
                updated_at: now,
            };
            insert_event_inner(&tx, &event)?;
            insert_attendees_inner(&tx, &id, &new.attendees)?;
            event.attendees = attendees_inner(&tx, &id)?;
            record_event_audit(&tx, &id, &actor, "created", None, Some(&json!(event)), None, now)?;
            tx.commit()?;
            Ok(event)
        })
        .await?;

    tracing::debug!("created calendar event {}", event.id);
    Ok(event)
}

/// The event with its attendee list, or `NotFoundError`.
pub async fn get_event(db: &Connection, id: &str) -> Result<CalendarEvent> {
    let id = id.to_string();
    let event = db
        .call(move |conn| {
            let event = get_event_inner(conn, &id)
                .map(|event| event.ok_or_else(|| EngineError::NotFound(format!("event {}", id))));
            Ok(event?)
        })
        .await?;
    Ok(event?)
}

/// Events overlapping `[from, to)`, newest filters applied in SQL,
/// ordered by start time.
pub async fn list_events(
    db: &Connection,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    event_type: Option<EventType>,
    status: Option<EventStatus>,
) -> Result<Vec<CalendarEvent>> {
    let events = db
        .call(move |conn| {
            let mut sql = format!("SELECT {} FROM calendar_event WHERE 1=1", EVENT_COLUMNS);
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(from) = from {
                sql.push_str(" AND end_time > ?");
                args.push(Box::new(format_utc(&from)));
            }
            if let Some(to) = to {
                sql.push_str(" AND start_time < ?");
                args.push(Box::new(format_utc(&to)));
            }
            if let Some(event_type) = event_type {
                sql.push_str(" AND event_type = ?");
                args.push(Box::new(event_type.as_str().to_string()));
            }
            if let Some(status) = status {
                sql.push_str(" AND status = ?");
                args.push(Box::new(status.as_str().to_string()));
            }
            sql.push_str(" ORDER BY start_time");

            let mut stmt = conn.prepare(&sql)?;
            let mut events = stmt
                .query_map(
                    rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                    event_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for event in &mut events {
                event.attendees = attendees_inner(conn, &event.id)?;
            }
            Ok(events)
        })
        .await?;
    Ok(events)
}

/// Apply a partial patch. Fields left out of the patch keep their
/// stored value; a supplied attendee list replaces the existing set.
pub async fn update_event(
    db: &Connection,
    id: &str,
    patch: EventPatch,
    actor: &Actor,
) -> Result<CalendarEvent> {
    let actor = actor.clone();
    let id = id.to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(existing) = get_event_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("event {}", id))));
            };
            if let Some(next) = patch.status {
                if !existing.status.can_transition_to(next) {
                    return Ok(Err(EngineError::Conflict(format!(
                        "event cannot move from {} to {}",
                        existing.status.as_str(),
                        next.as_str()
                    ))));
                }
            }

            let mut updated = existing.clone();
            if let Some(title) = patch.title {
                updated.title = title;
            }
            if let Some(event_type) = patch.event_type {
                updated.event_type = event_type;
            }
            if let Some(start_time) = patch.start_time {
                updated.start_time = start_time;
            }
            if let Some(end_time) = patch.end_time {
                updated.end_time = end_time;
            }
            if let Some(all_day) = patch.all_day {
                updated.all_day = all_day;
            }
            if let Some(status) = patch.status {
                updated.status = status;
            }
            if let Some(description) = patch.description {
                updated.description = Some(description);
            }
            if let Some(location) = patch.location {
                updated.location = Some(location);
            }
            if let Some(organizer_id) = patch.organizer_id {
                updated.organizer_id = Some(organizer_id);
            }
            if let Some(google_meet_url) = patch.google_meet_url {
                updated.google_meet_url = Some(google_meet_url);
            }
            if let Some(google_calendar_id) = patch.google_calendar_id {
                updated.google_calendar_id = Some(google_calendar_id);
            }
            if let Some(meta) = patch.meta {
                updated.meta = meta;
            }
            updated.updated_at = now;

            if updated.title.trim().is_empty() {
                return Ok(Err(EngineError::Validation(
                    "title must not be empty".to_string(),
                )));
            }
            if !updated.all_day && updated.start_time >= updated.end_time {
                return Ok(Err(EngineError::Validation(
                    "startTime must be before endTime".to_string(),
                )));
            }

            tx.execute(
                "UPDATE calendar_event SET title = ?2, event_type = ?3, start_time = ?4,
                 end_time = ?5, all_day = ?6, status = ?7, description = ?8, location = ?9,
                 organizer_id = ?10, google_meet_url = ?11, google_calendar_id = ?12,
                 meta = ?13, updated_at = ?14
                 WHERE id = ?1",
                params![
                    id,
                    updated.title,
                    updated.event_type.as_str(),
                    format_utc(&updated.start_time),
                    format_utc(&updated.end_time),
                    updated.all_day,
                    updated.status.as_str(),
                    updated.description,
                    updated.location,
                    updated.organizer_id,
                    updated.google_meet_url,
                    updated.google_calendar_id,
                    updated.meta.to_string(),
                    format_utc(&now),
                ],
            )?;

            if let Some(attendees) = &patch.attendees {
                tx.execute("DELETE FROM event_attendee WHERE event_id = ?1", params![id])?;
                insert_attendees_inner(&tx, &id, attendees)?;
            }
            updated.attendees = attendees_inner(&tx, &id)?;

            record_event_audit(
                &tx,
                &id,
                &actor,
                "updated",
                Some(&json!(existing)),
                Some(&json!(updated)),
                None,
                now,
            )?;
            tx.commit()?;
            Ok(Ok(updated))
        })
        .await?;
    Ok(result?)
}

/// Soft delete: flips the status to `cancelled` and leaves the row and
/// its attendees in place. The audit entry carries only the before
/// state since the transition is terminal.
pub async fn cancel_event(db: &Connection, id: &str, actor: &Actor) -> Result<CalendarEvent> {
    let actor = actor.clone();
    let id = id.to_string();
    let now = now_utc();

    let result = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            let Some(existing) = get_event_inner(&tx, &id)? else {
                return Ok(Err(EngineError::NotFound(format!("event {}", id))));
            };
            if existing.status == EventStatus::Cancelled {
                return Ok(Err(EngineError::Conflict(
                    "event is already cancelled".to_string(),
                )));
            }
            let changed = set_event_status_inner(&tx, &id, EventStatus::Cancelled, now)?;
            if changed == 0 {
                return Ok(Err(EngineError::Conflict(
                    "event is already cancelled".to_string(),
                )));
            }
            record_event_audit(
                &tx,
                &id,
                &actor,
                "cancelled",
                Some(&json!(existing)),
                None,
                None,
                now,
            )?;
            tx.commit()?;

            let mut cancelled = existing;
            cancelled.status = EventStatus::Cancelled;
            cancelled.updated_at = now;
            Ok(Ok(cancelled))
        })
        .await?;
    Ok(result?)
}

/// Audit trail for one event, oldest first.
pub async fn event_audit(db: &Connection, event_id: &str) -> Result<Vec<AuditEntry>> {
    let event_id = event_id.to_string();
    let result = db
        .call(move |conn| {
            let exists: Option<String> = conn
                .query_row(
                    "SELECT id FROM calendar_event WHERE id = ?1",
                    params![event_id],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_none() {
                return Ok(Err(EngineError::NotFound(format!("event {}", event_id))));
            }
            let mut stmt = conn.prepare(
                "SELECT id, event_id, actor_id, actor_name, action, before_state, after_state,
                 notes, created_at
                 FROM calendar_audit WHERE event_id = ?1 ORDER BY id",
            )?;
            let entries = stmt
                .query_map(params![event_id], audit_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(Ok(entries))
        })
        .await?;
    Ok(result?)
}

/// Project events overlapping `[from, to)` down to what the
/// availability checker needs. Status filtering happens in the checker
/// so the projection stays a plain read.
pub async fn busy_events_between(
    db: &Connection,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<BusyEvent>> {
    let events = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, status, start_time, end_time FROM calendar_event
                 WHERE end_time > ?1 AND start_time < ?2 ORDER BY start_time",
            )?;
            let mut events = stmt
                .query_map(params![format_utc(&from), format_utc(&to)], |row| {
                    Ok(BusyEvent {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        status: row.get(2)?,
                        start_time: column_utc(row, 3)?,
                        end_time: column_utc(row, 4)?,
                        attendee_emails: Vec::new(),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut email_stmt =
                conn.prepare("SELECT email FROM event_attendee WHERE event_id = ?1 ORDER BY id")?;
            for event in &mut events {
                event.attendee_emails = email_stmt
                    .query_map(params![event.id], |row| row.get(0))?
                    .collect::<rusqlite::Result<Vec<String>>>()?;
            }
            Ok(events)
        })
        .await?;
    Ok(events)
}

/// The per-day-of-week working windows used to bound slot generation.
pub async fn load_business_hours(db: &Connection) -> Result<Vec<BusinessHours>> {
    let hours = db
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT day_of_week, start_time, end_time, is_working_day
                 FROM business_hours ORDER BY day_of_week",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    let start: String = row.get(1)?;
                    let end: String = row.get(2)?;
                    Ok(BusinessHours {
                        day_of_week: row.get(0)?,
                        start_time: parse_hhmm(&start).map_err(|e| invalid_column(1, e))?,
                        end_time: parse_hhmm(&end).map_err(|e| invalid_column(2, e))?,
                        is_working_day: row.get(3)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(hours)
}
