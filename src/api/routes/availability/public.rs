//! Public types for the availability API
use chrono::NaiveDate;
use serde::Deserialize;

pub use crate::schedule::{AttendeeAvailability, Slot, SlotAvailability};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_minutes: u32,
    pub attendee_emails: Vec<String>,
}
