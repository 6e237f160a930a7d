//! Calendar event store: event and attendee entities, their lifecycle
//! operations, and the per-event audit trail.

pub mod db;
pub mod models;

pub use models::{
    Attendee, AttendeeType, CalendarEvent, EventPatch, EventStatus, EventType, NewAttendee,
    NewEvent,
};
