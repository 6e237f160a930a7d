//! Free/busy computation across candidate slots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grid::Slot;

/// An existing calendar entry projected down to what the checker
/// needs: its span and who is tied up by it.
#[derive(Debug, Clone)]
pub struct BusyEvent {
    pub id: String,
    pub title: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_emails: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeAvailability {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotAvailability {
    pub slot: Slot,
    pub available_attendees: Vec<String>,
    pub busy_attendees: Vec<String>,
    /// Per-attendee verdict keyed by email.
    pub attendees: BTreeMap<String, AttendeeAvailability>,
}

/// Two half-open intervals overlap iff each starts before the other
/// ends. Back-to-back intervals do not overlap.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

fn excluded(status: &str) -> bool {
    matches!(status, "cancelled" | "denied" | "rejected")
}

/// For each slot, intersect the requested attendees against everyone
/// busy with an overlapping event. All-day events occupy their full
/// span like any other interval. O(slots x events) which is fine at
/// the scale this runs at (tens of events, hundreds of slots).
pub fn check_availability(
    slots: &[Slot],
    existing_events: &[BusyEvent],
    attendee_emails: &[String],
) -> Vec<SlotAvailability> {
    // Cancelled or denied entries do not block anyone
    let events: Vec<&BusyEvent> = existing_events
        .iter()
        .filter(|e| !excluded(&e.status))
        .collect();

    slots
        .iter()
        .map(|slot| {
            let mut attendees = BTreeMap::new();
            let mut available_attendees = Vec::new();
            let mut busy_attendees = Vec::new();

            for email in attendee_emails {
                let conflict = events.iter().find(|event| {
                    overlaps(
                        slot.start_time,
                        slot.end_time,
                        event.start_time,
                        event.end_time,
                    ) && event.attendee_emails.iter().any(|a| a == email)
                });

                match conflict {
                    Some(event) => {
                        let reason = if event.title.is_empty() {
                            "Busy".to_string()
                        } else {
                            event.title.clone()
                        };
                        busy_attendees.push(email.clone());
                        attendees.insert(
                            email.clone(),
                            AttendeeAvailability {
                                available: false,
                                conflict_reason: Some(reason),
                            },
                        );
                    }
                    None => {
                        available_attendees.push(email.clone());
                        attendees.insert(
                            email.clone(),
                            AttendeeAvailability {
                                available: true,
                                conflict_reason: None,
                            },
                        );
                    }
                }
            }

            SlotAvailability {
                slot: slot.clone(),
                available_attendees,
                busy_attendees,
                attendees,
            }
        })
        .collect()
}
