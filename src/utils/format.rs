//! English date labels used by the dashboard views, plus text clipping for
//! fixed-width columns.

use chrono::{Datelike, NaiveDate};

const RANGE_SEPARATOR: &str = " – ";

/// "Oct 23"
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// "Oct 23, 2025"
pub fn short_date_with_year(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// List-view label: "Nov 11 – Nov 12", or a single day when the end is
/// missing, equal to or before the start.
pub fn short_range_label(start: NaiveDate, end: Option<NaiveDate>) -> String {
    match end {
        Some(end) if end > start => {
            format!("{}{RANGE_SEPARATOR}{}", short_date(start), short_date(end))
        }
        _ => short_date(start),
    }
}

/// Calendar-view label: "Nov 11 – Nov 12, 2025", "Dec 30, 2025 – Jan 2, 2026".
pub fn calendar_range_label(start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        return short_date_with_year(start);
    }
    let start_label = if start.year() == end.year() {
        short_date(start)
    } else {
        short_date_with_year(start)
    };
    format!("{start_label}{RANGE_SEPARATOR}{}", short_date_with_year(end))
}

/// At most `max` characters of `value`, cut on a char boundary.
pub fn clip_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}
