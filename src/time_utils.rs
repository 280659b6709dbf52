// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, TimeZone, Utc};

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Current time in the stored document format.
pub fn now_rfc3339() -> String {
    format_utc_rfc3339(Utc::now())
}

/// Midnight UTC on the first day of `date`'s month.
pub fn start_of_month(date: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(date.year(), date.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(date)
}

/// Render a session date (`YYYY-MM` or `YYYY-MM-DD`) as a French "month year".
///
/// Anything else is returned unchanged.
pub fn format_session_month(session: &str) -> String {
    let trimmed = session.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", trimmed), "%Y-%m-%d"));

    match date {
        Ok(d) => format!("{} {}", FRENCH_MONTHS[d.month0() as usize], d.year()),
        Err(_) => trimmed.to_string(),
    }
}

/// Short French date (`dd/mm/yyyy`) of a stored RFC3339 timestamp.
pub fn format_short_date(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|d| d.with_timezone(&Utc).format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}
