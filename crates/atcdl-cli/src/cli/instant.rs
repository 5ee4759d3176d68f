//! Parsing of `--start` / `--end` instants. All inputs are UTC.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    // Archive tokens, e.g. "Oct-01-2021 0000Z".
    "%b-%d-%Y %H%MZ",
];

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` and the archive's `Mon-DD-YYYY HHMMZ`.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(format!(
        "unrecognized time '{}': use RFC 3339, \"YYYY-MM-DD HH:MM\" or \"Oct-01-2021 0000Z\"",
        s
    ))
}
