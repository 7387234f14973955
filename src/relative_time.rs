//! Natural-language instants
//!
//! Post age bounds are stored as phrases like "3 days ago" and resolved
//! against the clock every time they are used, so a bound always means
//! "that long before now". `humanize` renders an instant back into the same
//! family of phrases; rendering a parsed phrase and parsing it again is stable.

use chrono::{DateTime, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Units that move by calendar months rather than a fixed length
fn months_per_unit(unit: &str) -> Option<u32> {
    match unit {
        "mo" | "mos" | "month" | "months" => Some(1),
        "y" | "yr" | "yrs" | "year" | "years" => Some(12),
        _ => None,
    }
}

/// Total distance described by the body of a relative phrase
#[derive(Debug)]
struct Offset {
    months: u32,
    fixed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Past,
    Future,
}

/// Resolve a free-form expression to an absolute instant relative to `now`.
///
/// Returns `None` when the text isn't a recognizable date or offset.
pub fn parse_instant(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = expr.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(instant) = parse_absolute(trimmed) {
        return Some(instant);
    }

    let text = trimmed.to_lowercase();
    match text.as_str() {
        "now" | "just now" | "right now" | "today" => return Some(now),
        "yesterday" => return now.checked_sub_signed(Duration::days(1)),
        "tomorrow" => return now.checked_add_signed(Duration::days(1)),
        _ => {}
    }

    let (body, direction) = if let Some(rest) = text.strip_suffix(" ago") {
        (rest, Direction::Past)
    } else if let Some(rest) = text.strip_prefix("in ") {
        (rest, Direction::Future)
    } else if let Some(rest) = text.strip_suffix(" from now") {
        (rest, Direction::Future)
    } else {
        return None;
    };

    let offset = parse_offset(body)?;
    shift(now, &offset, direction)
}

/// Dates in the formats the chain and users commonly paste
fn parse_absolute(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    // Bare dates resolve to midday
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    date.and_hms_opt(12, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_quantity(token: &str) -> Option<u64> {
    let amount = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" | "few" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        _ => return token.parse().ok(),
    };
    Some(amount)
}

/// Split on whitespace/commas and pull glued forms like "5d" apart
fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for word in body.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty()) {
        let starts_numeric = word.chars().next().is_some_and(|c| c.is_ascii_digit());
        match word.find(|c: char| c.is_alphabetic()) {
            Some(split) if starts_numeric && split > 0 => {
                tokens.push(word[..split].to_string());
                tokens.push(word[split..].to_string());
            }
            _ => tokens.push(word.to_string()),
        }
    }
    tokens
}

/// Word quantities and calendar units are resolved here; the remaining
/// "<n><unit>" pairs are handed to humantime as one duration.
fn parse_offset(body: &str) -> Option<Offset> {
    let mut tokens = tokenize(body).into_iter().peekable();
    let mut months: u32 = 0;
    let mut fixed_parts = Vec::new();
    let mut seen_any = false;

    while let Some(token) = tokens.next() {
        if token == "and" {
            continue;
        }
        let mut amount = parse_quantity(&token)?;
        // "a few seconds"
        if token == "a" && tokens.peek().map(String::as_str) == Some("few") {
            tokens.next();
            amount = 3;
        }
        let unit = tokens.next().filter(|unit| unit.chars().all(char::is_alphabetic))?;
        seen_any = true;
        match months_per_unit(&unit) {
            Some(per_unit) => {
                let added = u32::try_from(amount).ok()?.checked_mul(per_unit)?;
                months = months.checked_add(added)?;
            }
            None => fixed_parts.push(format!("{amount}{unit}")),
        }
    }

    if !seen_any {
        return None;
    }
    let fixed = if fixed_parts.is_empty() {
        Duration::zero()
    } else {
        let parsed = humantime::parse_duration(&fixed_parts.join(" ")).ok()?;
        Duration::from_std(parsed).ok()?
    };
    Some(Offset { months, fixed })
}

fn shift(now: DateTime<Utc>, offset: &Offset, direction: Direction) -> Option<DateTime<Utc>> {
    let months = Months::new(offset.months);
    match direction {
        Direction::Past => now.checked_sub_months(months)?.checked_sub_signed(offset.fixed),
        Direction::Future => now.checked_add_months(months)?.checked_add_signed(offset.fixed),
    }
}

/// Render `instant` as a phrase relative to `now` ("3 days ago", "in an hour").
pub fn humanize(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta_ms = (instant - now).num_milliseconds();
    let ms = (delta_ms as f64).abs();

    let seconds = (ms / 1_000.0).round() as i64;
    let minutes = (ms / 60_000.0).round() as i64;
    let hours = (ms / 3_600_000.0).round() as i64;
    let exact_days = ms / 86_400_000.0;
    let days = exact_days.round() as i64;
    // 400 years hold 146097 days
    let exact_months = exact_days * 4_800.0 / 146_097.0;
    let months = exact_months.round() as i64;
    let years = (exact_months / 12.0).round() as i64;

    let phrase = if seconds <= 44 {
        "a few seconds".to_string()
    } else if minutes <= 1 {
        "a minute".to_string()
    } else if minutes < 45 {
        format!("{minutes} minutes")
    } else if hours <= 1 {
        "an hour".to_string()
    } else if hours < 22 {
        format!("{hours} hours")
    } else if days <= 1 {
        "a day".to_string()
    } else if days < 26 {
        format!("{days} days")
    } else if months <= 1 {
        "a month".to_string()
    } else if months < 11 {
        format!("{months} months")
    } else if years <= 1 {
        "a year".to_string()
    } else {
        format!("{years} years")
    };

    if delta_ms > 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}
