use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

#[derive(Clone, Copy)]
enum Layout {
    /// Carries its own UTC offset.
    Offset,
    /// Date and time without offset, read as UTC.
    Naive,
    /// Date only, read as midnight UTC.
    Date,
}

/// Accepted string layouts, tried top to bottom. A trailing `Z` has already
/// been rewritten to `+00:00` by the time these run.
const FORMATS: &[(&str, Layout)] = &[
    ("%Y-%m-%dT%H:%M:%S%.f%z", Layout::Offset),
    ("%Y-%m-%dT%H:%M:%S%z", Layout::Offset),
    ("%Y-%m-%d %H:%M:%S%z", Layout::Offset),
    ("%Y-%m-%d %H:%M:%S", Layout::Naive),
    ("%Y-%m-%d", Layout::Date),
];

/// Longest fraction of a second a string may carry.
const MAX_FRACTION_DIGITS: usize = 6;

/// Normalize a timestamp-like JSON value into an ISO-8601 UTC string.
/// Anything absent or unparseable becomes the empty string.
pub fn normalize_timestamp(value: Option<&Value>) -> String {
    value
        .and_then(to_utc)
        .map(|dt| normalize_datetime(&dt))
        .unwrap_or_default()
}

/// Render an already-structured date/time as
/// `YYYY-MM-DDTHH:MM:SS[.ffffff]Z`. The fraction only appears when non-zero.
/// Naive values should be pinned with `and_utc()` first.
pub fn normalize_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    let dt = dt.with_timezone(&Utc);
    let micros = dt.timestamp_subsec_micros();
    if micros == 0 {
        dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    } else {
        format!("{}.{:06}Z", dt.format("%Y-%m-%dT%H:%M:%S"), micros)
    }
}

fn to_utc(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(secs) => DateTime::from_timestamp(secs, 0),
            None => n.as_f64().and_then(from_unix_seconds),
        },
        Value::String(s) => parse_text(s),
        _ => None,
    }
}

fn from_unix_seconds(secs: f64) -> Option<DateTime<Utc>> {
    let micros = (secs * 1_000_000.0).round();
    if !micros.is_finite() {
        return None;
    }
    let micros = micros as i64;
    let whole = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(whole, nanos)
}

fn parse_text(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    let text = match text.strip_suffix('Z') {
        Some(head) => format!("{}+00:00", head),
        None => text.to_string(),
    };
    if fraction_digits(&text) > MAX_FRACTION_DIGITS {
        return None;
    }

    FORMATS.iter().find_map(|(fmt, layout)| {
        // chrono lets a format space match zero whitespace; these layouts need one.
        if fmt.contains(' ') && !date_then_whitespace(&text) {
            return None;
        }
        parse_with(&text, fmt, *layout)
    })
}

fn parse_with(text: &str, fmt: &str, layout: Layout) -> Option<DateTime<Utc>> {
    match layout {
        Layout::Offset => DateTime::parse_from_str(text, fmt)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Layout::Naive => NaiveDateTime::parse_from_str(text, fmt)
            .ok()
            .map(|dt| dt.and_utc()),
        Layout::Date => NaiveDate::parse_from_str(text, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc()),
    }
}

/// True when the text opens with a full date followed by whitespace.
fn date_then_whitespace(text: &str) -> bool {
    text.split_once(char::is_whitespace)
        .is_some_and(|(date, _)| NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok())
}

/// Digits in the run following the first `.`, zero when there is none.
fn fraction_digits(text: &str) -> usize {
    text.split_once('.').map_or(0, |(_, rest)| {
        rest.chars().take_while(char::is_ascii_digit).count()
    })
}
