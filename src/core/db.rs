//! Database connection and schema management.

use anyhow::Result;
use chrono::{DateTime, SubsecRound, Utc};
use tokio_rusqlite::Connection;

/// Open the async database handle used by the API server and CLI.
pub async fn async_db(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(format!("{}/staffhq.db3", db_path)).await?;
    // Foreign keys are off by default in sqlite
    conn.call(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(())
    })
    .await?;
    Ok(conn)
}

/// Create all tables. Idempotent so it doubles as the migration
/// entrypoint for now.
pub fn initialize_db(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS business_hours (
            day_of_week INTEGER PRIMARY KEY,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            is_working_day INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS employee (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            department TEXT NOT NULL DEFAULT '',
            manager_id TEXT,
            pto_balance REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS calendar_event (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            event_type TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL,
            all_day INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            description TEXT,
            location TEXT,
            organizer_id TEXT,
            google_meet_url TEXT,
            google_calendar_id TEXT,
            meta TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS event_attendee (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT NOT NULL REFERENCES calendar_event(id),
            attendee_type TEXT NOT NULL,
            attendee_id TEXT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            response_status TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_event_attendee_event
            ON event_attendee(event_id);

        CREATE TABLE IF NOT EXISTS calendar_audit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            actor_name TEXT NOT NULL,
            action TEXT NOT NULL,
            before_state TEXT,
            after_state TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_calendar_audit_event
            ON calendar_audit(event_id);

        CREATE TABLE IF NOT EXISTS pto_request (
            id TEXT PRIMARY KEY,
            employee_id TEXT NOT NULL REFERENCES employee(id),
            employee_name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            is_full_day INTEGER NOT NULL DEFAULT 1,
            start_time TEXT,
            end_time TEXT,
            reason TEXT,
            status TEXT NOT NULL,
            manager_id TEXT NOT NULL,
            manager_comment TEXT,
            department TEXT NOT NULL DEFAULT '',
            days_requested REAL NOT NULL,
            pto_balance_before REAL NOT NULL,
            pto_balance_after REAL NOT NULL,
            calendar_event_id TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pto_request_employee
            ON pto_request(employee_id);

        CREATE TABLE IF NOT EXISTS pto_audit (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            request_id TEXT NOT NULL,
            actor_id TEXT NOT NULL,
            actor_name TEXT NOT NULL,
            action TEXT NOT NULL,
            before_state TEXT,
            after_state TEXT,
            notes TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_pto_audit_request
            ON pto_audit(request_id);

        CREATE TABLE IF NOT EXISTS notification_outbox (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL,
            channel TEXT NOT NULL,
            subject TEXT,
            recipients TEXT NOT NULL,
            payload TEXT NOT NULL,
            status TEXT NOT NULL,
            message_id TEXT,
            error TEXT,
            created_at TEXT NOT NULL,
            sent_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_outbox_event
            ON notification_outbox(event_id);
        ",
    )
}

/// Apply schema changes to an existing database.
pub fn migrate_db(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    // The DDL above is all IF NOT EXISTS so re-running it brings an
    // older database up to date.
    initialize_db(conn)
}

/// Seed the default Mon-Fri 09:00-17:00 business hours table. Existing
/// rows win so a customized schedule survives re-running init.
pub fn seed_business_hours(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO business_hours
         (day_of_week, start_time, end_time, is_working_day)
         VALUES (?1, ?2, ?3, ?4)",
    )?;
    for day in 0..7 {
        // 0 = Sunday, 6 = Saturday
        let working = day >= 1 && day <= 5;
        stmt.execute(rusqlite::params![day, "09:00", "17:00", working])?;
    }
    Ok(())
}

/// Wire format for instants: `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn parse_utc(s: &str) -> Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s)?;
    Ok(dt.with_timezone(&Utc))
}

/// Current time truncated to whole seconds to match the wire format.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Times of day are stored as `HH:MM`, with `HH:MM:SS` tolerated for
/// hand-edited rows.
pub(crate) fn parse_hhmm(s: &str) -> chrono::ParseResult<chrono::NaiveTime> {
    chrono::NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

pub(crate) fn invalid_column<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, err.into())
}

/// Read a `YYYY-MM-DDTHH:MM:SSZ` column as an instant.
pub(crate) fn column_utc(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    parse_utc(&s).map_err(|e| invalid_column(idx, e))
}

pub(crate) fn column_utc_opt(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| parse_utc(&s).map_err(|e| invalid_column(idx, e)))
        .transpose()
}

/// Read a nullable TEXT column holding a JSON document.
pub(crate) fn column_json_opt(
    row: &rusqlite::Row,
    idx: usize,
) -> rusqlite::Result<Option<serde_json::Value>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| serde_json::from_str(&s).map_err(|e| invalid_column(idx, e)))
        .transpose()
}
