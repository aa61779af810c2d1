use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

use crate::error::ParseError;

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|e| ParseError::Date {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// Parse a look-back duration such as `24h`, `90m` or `7days`.
pub fn parse_lookback(input: &str) -> Result<TimeDelta, ParseError> {
    let duration = humantime::parse_duration(input.trim()).map_err(|e| ParseError::Duration {
        input: input.to_string(),
        message: e.to_string(),
    })?;
    TimeDelta::from_std(duration).map_err(|e| ParseError::Duration {
        input: input.to_string(),
        message: e.to_string(),
    })
}

/// Start of a `--range` window: `now` minus a duration.
pub fn range_start(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
    let lookback = parse_lookback(input)?;
    now.checked_sub_signed(lookback)
        .ok_or_else(|| ParseError::Duration {
            input: input.to_string(),
            message: "range reaches before the supported time span".to_string(),
        })
}

/// Start of a `--since` window: midnight UTC of a date, or `now` minus a
/// duration.
pub fn since_start(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ParseError> {
    if let Ok(date) = parse_date(input) {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    range_start(input, now).map_err(|_| ParseError::Time {
        input: input.to_string(),
    })
}
