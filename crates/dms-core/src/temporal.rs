//! Date parsing, canonical formatting and inclusive date ranges.
//!
//! Dates enter the system as user text in one of the accepted formats,
//! are stored in canonical ISO form (`%Y-%m-%d`) and are displayed in
//! the configured display format.

use std::sync::OnceLock;

use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, TimeDelta};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::defaults::ISO_DATE_FORMAT;
use crate::error::{Error, Result};

/// Parse `value` with the first matching format.
///
/// Surrounding whitespace is ignored. Fails with [`Error::InvalidDate`] when
/// no format matches.
pub fn parse_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Result<NaiveDate> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format.as_ref()).ok())
        .ok_or_else(|| Error::InvalidDate(value.to_string()))
}

/// Parse a canonical ISO date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    parse_date(value, &[ISO_DATE_FORMAT])
}

/// Shape of a stored date index: ISO `YYYY-MM-DD` with month 01-12 and day
/// 01-31. Shared with the SQL filter so both stores accept the same values.
pub const ISO_DATE_PATTERN: &str = r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$";

fn iso_date_shape() -> Option<&'static Regex> {
    static SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(ISO_DATE_PATTERN).ok()).as_ref()
}

/// Whether a stored value has the canonical ISO date shape.
pub fn is_iso_shaped(value: &str) -> bool {
    iso_date_shape().is_some_and(|re| re.is_match(value))
}

/// Whether `format` is a usable chrono `strftime` format.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render `date` with `format`, falling back to ISO form when the format is
/// not usable.
pub fn format_date(date: NaiveDate, format: &str) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    match write!(out, "{}", date.format(format)) {
        Ok(()) => out,
        Err(_) => format_iso(date),
    }
}

/// Render a date in canonical ISO form.
pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

// =============================================================================
// DATE RANGE
// =============================================================================

/// Inclusive date range; `None` on either side means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Range with the given bounds.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Range matching every date.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Range of `days` either side of `date`.
    ///
    /// Negative padding counts as zero. A side that leaves the calendar is
    /// left open.
    pub fn around(date: NaiveDate, days: i64) -> Self {
        let delta = TimeDelta::try_days(days.max(0));
        Self {
            from: delta.and_then(|d| date.checked_sub_signed(d)),
            to: delta.and_then(|d| date.checked_add_signed(d)),
        }
    }

    /// Range covering exactly one day.
    pub fn on(date: NaiveDate) -> Self {
        Self::around(date, 0)
    }

    /// True when neither side is bounded.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Bounds with open sides replaced by `floor` / `ceiling`.
    pub fn resolve(&self, floor: NaiveDate, ceiling: NaiveDate) -> (NaiveDate, NaiveDate) {
        (self.from.unwrap_or(floor), self.to.unwrap_or(ceiling))
    }

    /// Inclusive check of a stored date index.
    ///
    /// Only ISO shaped values match. They are compared as text against the
    /// ISO bounds, which orders them the same way as dates.
    pub fn contains_stored(&self, stored: &str, floor: NaiveDate, ceiling: NaiveDate) -> bool {
        if !is_iso_shaped(stored) {
            return false;
        }
        let (from, to) = self.resolve(floor, ceiling);
        format_iso(from).as_str() <= stored && stored <= format_iso(to).as_str()
    }

    /// Inclusive containment check with open sides resolved to `floor` / `ceiling`.
    pub fn contains(&self, date: NaiveDate, floor: NaiveDate, ceiling: NaiveDate) -> bool {
        let (from, to) = self.resolve(floor, ceiling);
        from <= date && date <= to
    }
}

// =============================================================================
// TESTS
// =============================================================================
