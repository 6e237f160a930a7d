//! Public types for the outbox API
use serde::Deserialize;

pub use crate::outbox::{OutboxEntry, OutboxStatus, QueueNotification};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxListQuery {
    pub event_id: Option<String>,
    pub status: Option<OutboxStatus>,
}
