//! Persistence for outbox entries. Status updates are conditional on
//! the row still being `queued` so a terminal row is never rewritten.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;

use super::models::{OutboxEntry, OutboxStatus};
use crate::core::db::{column_utc, column_utc_opt, format_utc, invalid_column};
use crate::core::EngineError;

const ENTRY_COLUMNS: &str =
    "id, event_id, channel, subject, recipients, payload, status, message_id, error, \
     created_at, sent_at";

fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<OutboxEntry> {
    let recipients: String = row.get(4)?;
    let payload: String = row.get(5)?;
    let status: String = row.get(6)?;
    Ok(OutboxEntry {
        id: row.get(0)?,
        event_id: row.get(1)?,
        channel: row.get(2)?,
        subject: row.get(3)?,
        recipients: serde_json::from_str(&recipients).map_err(|e| invalid_column(4, e))?,
        payload: serde_json::from_str(&payload).map_err(|e| invalid_column(5, e))?,
        status: OutboxStatus::parse(&status).map_err(|e| invalid_column(6, e))?,
        message_id: row.get(7)?,
        error: row.get(8)?,
        created_at: column_utc(row, 9)?,
        sent_at: column_utc_opt(row, 10)?,
    })
}

/// Durably queue the entry before any delivery attempt is made.
pub async fn insert_entry(db: &Connection, entry: &OutboxEntry) -> Result<()> {
    let entry = entry.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT INTO notification_outbox
             (id, event_id, channel, subject, recipients, payload, status, message_id,
              error, created_at, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                entry.id,
                entry.event_id,
                entry.channel,
                entry.subject,
                serde_json::to_string(&entry.recipients).unwrap_or_else(|_| "[]".to_string()),
                entry.payload.to_string(),
                entry.status.as_str(),
                entry.message_id,
                entry.error,
                format_utc(&entry.created_at),
                entry.sent_at.map(|t| format_utc(&t)),
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn mark_sent(
    db: &Connection,
    id: &str,
    message_id: Option<String>,
    sent_at: DateTime<Utc>,
) -> Result<()> {
    let id = id.to_string();
    db.call(move |conn| {
        conn.execute(
            "UPDATE notification_outbox
             SET status = 'sent', message_id = ?2, sent_at = ?3
             WHERE id = ?1 AND status = 'queued'",
            params![id, message_id, format_utc(&sent_at)],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn mark_failed(db: &Connection, id: &str, error: &str) -> Result<()> {
    let id = id.to_string();
    let error = error.to_string();
    db.call(move |conn| {
        conn.execute(
            "UPDATE notification_outbox
             SET status = 'failed', error = ?2
             WHERE id = ?1 AND status = 'queued'",
            params![id, error],
        )?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn get_entry(db: &Connection, id: &str) -> Result<OutboxEntry> {
    let id = id.to_string();
    let result = db
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM notification_outbox WHERE id = ?1",
                ENTRY_COLUMNS
            ))?;
            let entry = stmt
                .query_row(params![id], entry_from_row)
                .optional()?
                .ok_or_else(|| EngineError::NotFound(format!("outbox entry {}", id)));
            Ok(entry)
        })
        .await?;
    Ok(result?)
}

pub async fn list_entries(
    db: &Connection,
    event_id: Option<String>,
    status: Option<OutboxStatus>,
) -> Result<Vec<OutboxEntry>> {
    let entries = db
        .call(move |conn| {
            let mut sql = format!("SELECT {} FROM notification_outbox WHERE 1=1", ENTRY_COLUMNS);
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
            if let Some(event_id) = event_id {
                sql.push_str(" AND event_id = ?");
                args.push(Box::new(event_id));
            }
            if let Some(status) = status {
                sql.push_str(" AND status = ?");
                args.push(Box::new(status.as_str().to_string()));
            }
            sql.push_str(" ORDER BY created_at, id");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params_from_iter(args.iter().map(|a| a.as_ref())),
                    entry_from_row,
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await?;
    Ok(entries)
}
