//! Public types for the events API
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub use crate::calendar::{
    Attendee, AttendeeType, CalendarEvent, EventPatch, EventStatus, EventType, NewAttendee,
    NewEvent,
};
pub use crate::core::audit::AuditEntry;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
}
