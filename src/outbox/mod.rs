//! Durable notification outbox.
//!
//! Sequencing is two-phase: the entry is inserted as `queued` before
//! any delivery attempt, then the same row is marked `sent` or
//! `failed`. A crash mid-delivery leaves a durably queued record
//! rather than a lost send, and a relay outage is recorded on the row
//! instead of failing the caller.

pub mod db;
pub mod models;
pub mod relay;

pub use models::{OutboxEntry, OutboxStatus, QueueNotification};

use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use crate::calendar;
use crate::core::db::now_utc;
use crate::core::{AppConfig, EngineError};

const DEFAULT_CHANNEL: &str = "email";

/// Union of explicit recipients and addresses derived from the
/// event's meta bag (`attendeeEmails`, `candidateEmail`,
/// `panelEmails`), trimmed and deduplicated case-sensitively in
/// first-seen order.
fn resolve_recipients(explicit: &[String], meta: &Value) -> Vec<String> {
    let mut recipients: Vec<String> = Vec::new();
    let mut push = |addr: &str| {
        let addr = addr.trim();
        if !addr.is_empty() && !recipients.iter().any(|r| r == addr) {
            recipients.push(addr.to_string());
        }
    };

    for addr in explicit {
        push(addr);
    }
    for key in ["attendeeEmails", "panelEmails"] {
        if let Some(list) = meta.get(key).and_then(Value::as_array) {
            for addr in list.iter().filter_map(Value::as_str) {
                push(addr);
            }
        }
    }
    if let Some(addr) = meta.get("candidateEmail").and_then(Value::as_str) {
        push(addr);
    }

    recipients
}

/// Queue a notification for an event and attempt delivery. With no
/// delivery target configured the entry stays `queued` and the call
/// still succeeds; delivery failures are recorded on the entry, never
/// propagated.
pub async fn queue_and_send(
    db: &Connection,
    config: &AppConfig,
    notification: QueueNotification,
) -> Result<OutboxEntry> {
    let event = calendar::db::get_event(db, &notification.event_id).await?;

    let recipients = resolve_recipients(&notification.recipients, &event.meta);
    if recipients.is_empty() {
        return Err(EngineError::NoRecipients.into());
    }

    let subject = notification
        .subject
        .unwrap_or_else(|| format!("Calendar update: {}", event.title));
    let payload = json!({
        "eventId": event.id,
        "title": event.title,
        "startTime": event.start_time,
        "endTime": event.end_time,
        "subject": subject,
        "message": notification.message,
        "recipients": recipients,
    });

    let entry = OutboxEntry {
        id: Uuid::new_v4().to_string(),
        event_id: event.id,
        channel: notification
            .channel
            .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
        subject: Some(subject),
        recipients,
        payload,
        status: OutboxStatus::Queued,
        message_id: None,
        error: None,
        created_at: now_utc(),
        sent_at: None,
    };
    db::insert_entry(db, &entry).await?;

    dispatch(db, config, entry).await
}

/// Retry a prior notification as a fresh entry. The original row is
/// left untouched so the delivery history stays intact.
pub async fn resend(db: &Connection, config: &AppConfig, entry_id: &str) -> Result<OutboxEntry> {
    let prior = db::get_entry(db, entry_id).await?;

    let entry = OutboxEntry {
        id: Uuid::new_v4().to_string(),
        status: OutboxStatus::Queued,
        message_id: None,
        error: None,
        created_at: now_utc(),
        sent_at: None,
        ..prior
    };
    db::insert_entry(db, &entry).await?;

    dispatch(db, config, entry).await
}

async fn dispatch(db: &Connection, config: &AppConfig, entry: OutboxEntry) -> Result<OutboxEntry> {
    let Some(url) = &config.delivery_url else {
        tracing::debug!("no delivery target configured, outbox entry {} stays queued", entry.id);
        return Ok(entry);
    };

    let timeout = Duration::from_secs(config.delivery_timeout_secs);
    let receipt = relay::deliver(url, &entry.payload, timeout).await;
    if receipt.ok {
        db::mark_sent(db, &entry.id, receipt.message_id, now_utc()).await?;
    } else {
        let reason = receipt
            .error
            .unwrap_or_else(|| "delivery failed".to_string());
        tracing::warn!("outbox entry {} failed to deliver: {}", entry.id, reason);
        db::mark_failed(db, &entry.id, &reason).await?;
    }

    db::get_entry(db, &entry.id).await
}
