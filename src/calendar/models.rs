//! Event and attendee entities plus the wire types for mutating them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Interview,
    Pto,
    Holiday,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Interview => "interview",
            EventType::Pto => "pto",
            EventType::Holiday => "holiday",
            EventType::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "interview" => Ok(EventType::Interview),
            "pto" => Ok(EventType::Pto),
            "holiday" => Ok(EventType::Holiday),
            "other" => Ok(EventType::Other),
            other => Err(EngineError::Validation(format!(
                "unknown event type: {}",
                other
            ))),
        }
    }
}

/// Lifecycle: `scheduled -> approved` on external confirmation, any
/// non-terminal state `-> cancelled`. Cancelled is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Scheduled,
    Approved,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "scheduled",
            EventStatus::Approved => "approved",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "scheduled" => Ok(EventStatus::Scheduled),
            "approved" => Ok(EventStatus::Approved),
            "cancelled" => Ok(EventStatus::Cancelled),
            other => Err(EngineError::Validation(format!(
                "unknown event status: {}",
                other
            ))),
        }
    }

    pub fn can_transition_to(self, next: EventStatus) -> bool {
        match (self, next) {
            (current, next) if current == next => true,
            (EventStatus::Scheduled, EventStatus::Approved) => true,
            (EventStatus::Scheduled | EventStatus::Approved, EventStatus::Cancelled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeType {
    Employee,
    Candidate,
    External,
}

impl AttendeeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendeeType::Employee => "employee",
            AttendeeType::Candidate => "candidate",
            AttendeeType::External => "external",
        }
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        match s {
            "employee" => Ok(AttendeeType::Employee),
            "candidate" => Ok(AttendeeType::Candidate),
            "external" => Ok(AttendeeType::External),
            other => Err(EngineError::Validation(format!(
                "unknown attendee type: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: i64,
    pub event_id: String,
    pub attendee_type: AttendeeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendee_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_meet_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_calendar_id: Option<String>,
    /// Opaque key-value bag carried for callers (candidate emails,
    /// panel emails and the like). The store never interprets it; the
    /// outbox derives notification recipients from it.
    pub meta: Value,
    pub attendees: Vec<Attendee>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttendee {
    pub attendee_type: AttendeeType,
    #[serde(default)]
    pub attendee_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub response_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub organizer_id: Option<String>,
    #[serde(default)]
    pub google_meet_url: Option<String>,
    #[serde(default)]
    pub google_calendar_id: Option<String>,
    #[serde(default = "empty_meta")]
    pub meta: Value,
    #[serde(default)]
    pub attendees: Vec<NewAttendee>,
}

fn empty_meta() -> Value {
    serde_json::json!({})
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.title.trim().is_empty() {
            return Err(EngineError::Validation("title must not be empty".to_string()));
        }
        if !self.all_day && self.start_time >= self.end_time {
            return Err(EngineError::Validation(
                "startTime must be before endTime".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update applied coalesce-style: every `None` keeps the
/// stored value. A supplied attendee list replaces the existing set
/// wholesale (delete then reinsert), so callers must always resend the
/// complete final list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub status: Option<EventStatus>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer_id: Option<String>,
    pub google_meet_url: Option<String>,
    pub google_calendar_id: Option<String>,
    pub meta: Option<Value>,
    pub attendees: Option<Vec<NewAttendee>>,
}
