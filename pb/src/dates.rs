//! Date expression parsing and relative date display
//!
//! Every function takes the reference date explicitly. Callers resolve "today"
//! once per command invocation and pass it down, so relative expressions inside
//! one run agree with each other.
//!
//! Recognized grammars, tried in order:
//!
//! - ISO `YYYY-MM-DD`
//! - Short `M/D`, resolved to the nearest present-or-future occurrence
//! - Relative `today`, `tomorrow`, `in N day(s)`, `in N week(s)`

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("valid ISO date regex"));

static SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})$").expect("valid short date regex"));

static RELATIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^in\s+(\d+)\s+(day|days|week|weeks)$").expect("valid relative date regex"));

/// How many years ahead a short date may roll forward (covers Feb 29)
const MAX_ROLLOVER_YEARS: i32 = 8;

/// Errors from date parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("Invalid date '{expr}'. Use YYYY-MM-DD, M/D, today, tomorrow, 'in N days' or 'in N weeks'")]
    Invalid { expr: String },
}

impl DateError {
    fn invalid(expr: &str) -> Self {
        Self::Invalid { expr: expr.to_string() }
    }
}

/// Parse a date expression against a reference date
pub fn parse(expr: &str, reference: NaiveDate) -> Result<NaiveDate, DateError> {
    debug!(%expr, %reference, "parse: called");
    let normalized = expr.trim().to_lowercase();

    if let Some(caps) = ISO_RE.captures(&normalized) {
        let year: i32 = caps[1].parse().map_err(|_| DateError::invalid(expr))?;
        let month: u32 = caps[2].parse().map_err(|_| DateError::invalid(expr))?;
        let day: u32 = caps[3].parse().map_err(|_| DateError::invalid(expr))?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::invalid(expr));
    }

    if let Some(caps) = SHORT_RE.captures(&normalized) {
        let month: u32 = caps[1].parse().map_err(|_| DateError::invalid(expr))?;
        let day: u32 = caps[2].parse().map_err(|_| DateError::invalid(expr))?;
        return next_occurrence(month, day, reference).ok_or_else(|| DateError::invalid(expr));
    }

    match normalized.as_str() {
        "today" => return Ok(reference),
        "tomorrow" => return add_days(reference, 1).ok_or_else(|| DateError::invalid(expr)),
        _ => {}
    }

    if let Some(caps) = RELATIVE_RE.captures(&normalized) {
        let n: u64 = caps[1].parse().map_err(|_| DateError::invalid(expr))?;
        if n == 0 {
            return Err(DateError::invalid(expr));
        }
        let days = if caps[2].starts_with("week") {
            n.checked_mul(7).ok_or_else(|| DateError::invalid(expr))?
        } else {
            n
        };
        return add_days(reference, days).ok_or_else(|| DateError::invalid(expr));
    }

    debug!(%expr, "parse: no grammar matched");
    Err(DateError::invalid(expr))
}

/// Smallest date on or after `reference` with the given month and day
fn next_occurrence(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    (reference.year()..=reference.year() + MAX_ROLLOVER_YEARS)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= reference)
}

fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

/// Signed number of days from `today` until `date`
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Human-friendly rendering of a date relative to `today`
pub fn format_date(date: NaiveDate, today: NaiveDate) -> String {
    match days_until(date, today) {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        n @ 2..=7 => format!("In {} days ({})", n, date.format("%a")),
        n @ -7..=-2 => format!("{} days ago", -n),
        _ => date.format("%a, %b %d").to_string(),
    }
}

/// Canonical ISO rendering used in prompts and listings
pub fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
