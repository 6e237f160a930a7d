//! Append-only audit trail entry shared by the calendar and PTO
//! subsystems. Entries are written in the same transaction as the
//! state change they record and are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    /// The event or PTO request this entry belongs to.
    pub subject_id: String,
    pub actor_id: String,
    pub actor_name: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_state: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_state: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Row mapper shared by the calendar and PTO audit tables, which carry
/// the same columns apart from the foreign key name.
pub(crate) fn audit_from_row(row: &rusqlite::Row) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        actor_id: row.get(2)?,
        actor_name: row.get(3)?,
        action: row.get(4)?,
        before_state: crate::core::db::column_json_opt(row, 5)?,
        after_state: crate::core::db::column_json_opt(row, 6)?,
        notes: row.get(7)?,
        timestamp: crate::core::db::column_utc(row, 8)?,
    })
}
