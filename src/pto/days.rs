//! PTO day arithmetic: business-day counting for full-day requests and
//! hour fractions for partial days.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};

use crate::core::EngineError;

const HOURS_PER_DAY: f64 = 8.0;

/// Weekdays in `[start, end]` inclusive. Saturdays and Sundays never
/// count; the business-hours table does not apply here.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let mut count = 0;
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    count
}

/// How many PTO days a request consumes. Full-day requests count
/// business days across the range; partial-day requests must sit
/// within a single business day and consume `hours / 8`.
pub fn days_requested(
    start_date: NaiveDate,
    end_date: NaiveDate,
    is_full_day: bool,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<f64, EngineError> {
    if end_date < start_date {
        return Err(EngineError::Validation(
            "endDate must not be before startDate".to_string(),
        ));
    }

    if is_full_day {
        let days = business_days_between(start_date, end_date);
        if days == 0 {
            return Err(EngineError::Validation(
                "requested range contains no business days".to_string(),
            ));
        }
        return Ok(days as f64);
    }

    if start_date != end_date {
        return Err(EngineError::Validation(
            "partial-day requests must start and end on the same date".to_string(),
        ));
    }
    if business_days_between(start_date, start_date) == 0 {
        return Err(EngineError::Validation(
            "requested range contains no business days".to_string(),
        ));
    }
    let (from, to) = match (start_time, end_time) {
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(EngineError::Validation(
                "partial-day requests require startTime and endTime".to_string(),
            ));
        }
    };
    if to <= from {
        return Err(EngineError::Validation(
            "startTime must be before endTime".to_string(),
        ));
    }

    let hours = (to - from).num_minutes() as f64 / 60.0;
    Ok(hours / HOURS_PER_DAY)
}
