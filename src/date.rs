//! Publish-date interpretation for frontmatter values.
//!
//! Every date comparison goes through this module so that the node's date and
//! the current moment are always expressed in the same configured timezone.
//!
//! ## Accepted Values
//!
//! | Frontmatter value | Meaning |
//! |-------------------|---------|
//! | `"2022-05-02T10:00:00+02:00"`, `"...+0200"`, `"...Z"` | Absolute instant |
//! | `"2022-05-02T10:00"`, `"2022-05-02 10:00:00"`, `"2022-05-02T10"` | Wall-clock time in the configured zone |
//! | `"2022-05-02"`, `"20220502"` | Midnight in the configured zone |
//! | `"2022-05"`, `"2022"` | Midnight on the first day of the month / year |
//! | `1651449600000`, `0.5` | Unix epoch milliseconds |
//! | absent, `null`, `false`, `""`, `0`, lists, maps | No date: the node counts as published |
//!
//! A non-empty string matching none of the formats is an error
//! ([`DateError::Unparseable`]) rather than a silent default.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),
    #[error("unparseable date: {0:?}")]
    Unparseable(String),
    #[error("timestamp out of range: {0}")]
    OutOfRange(i64),
}

/// Offset-less date-time layouts, tried in order after RFC 3339.
const LOCAL_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Offset-carrying layouts that RFC 3339 rejects (missing seconds, or an
/// offset written without a colon).
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A frontmatter date value, classified before any timezone work happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateValue<'a> {
    /// Nothing that can represent a date.
    Absent,
    Text(&'a str),
    EpochMillis(i64),
}

impl<'a> DateValue<'a> {
    /// Classify a raw frontmatter value.
    ///
    /// Mirrors the truthiness rule of the content pipeline: empty strings,
    /// `false`, `0` and `null` are "no date". Values of a type that cannot
    /// carry a date (booleans, lists, maps) are also treated as absent.
    pub fn classify(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::String(s)) if !s.trim().is_empty() => DateValue::Text(s.trim()),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => DateValue::Absent,
                Some(ms) => DateValue::EpochMillis(ms),
                // Truthiness is decided on the raw float: 0.5 is a date, 0.0 is not.
                None => match n.as_f64() {
                    Some(f) if f.is_finite() && f != 0.0 => {
                        DateValue::EpochMillis(f.trunc() as i64)
                    }
                    _ => DateValue::Absent,
                },
            },
            _ => DateValue::Absent,
        }
    }
}

/// Resolve an IANA timezone identifier such as `"UTC"` or `"Europe/Paris"`.
pub fn resolve_timezone(name: &str) -> Result<Tz, DateError> {
    name.parse::<Tz>()
        .map_err(|_| DateError::UnknownTimezone(name.to_string()))
}

/// Interpret a date string within `tz`.
///
/// Strings with an explicit offset denote an absolute instant; everything
/// else is read as wall-clock time in `tz`.
pub fn parse_in_timezone(raw: &str, tz: Tz) -> Result<DateTime<Tz>, DateError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&tz));
        }
    }
    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return localize(naive, tz, raw);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return localize(date.and_time(NaiveTime::MIN), tz, raw);
    }
    match reduced_precision(raw) {
        Some(naive) => localize(naive, tz, raw),
        None => Err(DateError::Unparseable(raw.to_string())),
    }
}

/// ISO 8601 forms that `chrono` layouts cannot express directly: `YYYY`,
/// `YYYY-MM`, basic `YYYYMMDD`, and hour-only `YYYY-MM-DDTHH`.
///
/// Missing components take their smallest value.
fn reduced_precision(raw: &str) -> Option<NaiveDateTime> {
    let number = |start: usize, end: usize| -> Option<u32> {
        let part = raw.get(start..end)?;
        if part.bytes().all(|b| b.is_ascii_digit()) {
            part.parse().ok()
        } else {
            None
        }
    };
    let year = |end: usize| number(0, end).map(|y| y as i32);

    let (date, hour) = match raw.len() {
        4 => (NaiveDate::from_ymd_opt(year(4)?, 1, 1)?, 0),
        7 if raw.as_bytes()[4] == b'-' => {
            (NaiveDate::from_ymd_opt(year(4)?, number(5, 7)?, 1)?, 0)
        }
        8 => (
            NaiveDate::from_ymd_opt(year(4)?, number(4, 6)?, number(6, 8)?)?,
            0,
        ),
        13 if matches!(raw.as_bytes()[10], b'T' | b' ') => (
            NaiveDate::parse_from_str(raw.get(..10)?, DATE_FORMAT).ok()?,
            number(11, 13)?,
        ),
        _ => return None,
    };
    date.and_hms_opt(hour, 0, 0)
}

/// Place a wall-clock time in `tz`.
///
/// Ambiguous times (DST fall-back) take the earliest instant; times inside a
/// DST gap are pushed forward by one hour.
fn localize(naive: NaiveDateTime, tz: Tz, raw: &str) -> Result<DateTime<Tz>, DateError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .ok_or_else(|| DateError::Unparseable(raw.to_string()))
}

/// Resolve a classified value to an instant in the zone named `timezone`.
///
/// Returns `Ok(None)` for [`DateValue::Absent`] without consulting the
/// timezone at all.
pub fn publish_date(
    value: DateValue<'_>,
    timezone: &str,
) -> Result<Option<DateTime<Tz>>, DateError> {
    let date = match value {
        DateValue::Absent => return Ok(None),
        DateValue::Text(raw) => parse_in_timezone(raw, resolve_timezone(timezone)?)?,
        DateValue::EpochMillis(ms) => Utc
            .timestamp_millis_opt(ms)
            .single()
            .ok_or(DateError::OutOfRange(ms))?
            .with_timezone(&resolve_timezone(timezone)?),
    };
    Ok(Some(date))
}

/// `true` when `date` is not after `now`, both normalized to `date`'s zone.
pub fn is_not_after(date: &DateTime<Tz>, now: DateTime<Utc>) -> bool {
    *date <= now.with_timezone(&date.timezone())
}
