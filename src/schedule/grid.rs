//! Candidate meeting slot generation.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::EngineError;

/// Candidate slots advance in fixed strides within a working day
/// regardless of the requested meeting length.
const STRIDE_MINUTES: i64 = 30;

/// Per-day-of-week working window. `day_of_week` is 0 = Sunday through
/// 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHours {
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_working_day: bool,
}

/// A candidate meeting window, half-open `[start_time, end_time)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Generate candidate slots for every working day in
/// `[start_date, end_date]`.
///
/// Within a day, slot starts walk from the opening time in 30-minute
/// strides and a slot is emitted only when the full duration fits
/// before closing, so no slot ever crosses a day boundary. Output is
/// strictly ascending by start time.
pub fn generate_slots(
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration_minutes: u32,
    business_hours: &[BusinessHours],
) -> Result<Vec<Slot>, EngineError> {
    if end_date < start_date {
        return Err(EngineError::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }
    if duration_minutes == 0 {
        return Err(EngineError::Validation(
            "duration_minutes must be greater than zero".to_string(),
        ));
    }

    let duration = Duration::minutes(duration_minutes as i64);
    let stride = Duration::minutes(STRIDE_MINUTES);
    let mut slots = Vec::new();

    let mut day = start_date;
    loop {
        let weekday = day.weekday().num_days_from_sunday() as u8;
        if let Some(hours) = business_hours
            .iter()
            .find(|h| h.day_of_week == weekday && h.is_working_day)
        {
            let closing = day.and_time(hours.end_time).and_utc();
            let mut cursor = day.and_time(hours.start_time).and_utc();
            while cursor + duration <= closing {
                slots.push(Slot {
                    start_time: cursor,
                    end_time: cursor + duration,
                });
                cursor += stride;
            }
        }

        if day == end_date {
            break;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    Ok(slots)
}
