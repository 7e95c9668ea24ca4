//! Due-date parsing and canonical formatting.
//!
//! Accepted inputs:
//! - RFC 3339 with an offset (`2026-10-16T12:00:00Z`, `...+02:00`)
//! - naive date-times (`2026-10-16T12:00`, `2026-10-16 12:00:00.5`), read as local time
//! - bare dates (`2026-10-16`), read as local midnight
//!
//! Canonical output is RFC 3339 in UTC with a `Z` suffix.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::{Error, Result};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a due timestamp into an absolute instant.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive, raw);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return local_to_utc(midnight, raw);
        }
    }

    Err(Error::InvalidTimestamp(raw.to_string()))
}

/// Render an instant in the canonical stored form.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn local_to_utc(naive: NaiveDateTime, raw: &str) -> Result<DateTime<Utc>> {
    // Times skipped by a DST jump have no local mapping.
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| Error::InvalidTimestamp(raw.to_string()))
}
