// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar day (UTC) of a timestamp, as `YYYY-MM-DD`.
pub fn day_key(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formats() {
        let date = Utc.with_ymd_and_hms(2026, 2, 3, 23, 59, 58).unwrap();
        assert_eq!(format_utc_rfc3339(date), "2026-02-03T23:59:58Z");
        assert_eq!(day_key(date), "2026-02-03");
    }
}
