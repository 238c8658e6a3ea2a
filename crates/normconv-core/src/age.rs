//! Chronological age calculation.
//!
//! Clinicians report age as years/months plus a total month count used for
//! norm lookup. The total rounds up when 15 or more days remain, and a
//! negative day difference borrows the length of the month before the test
//! month. Both rules are fixed business requirements; do not "correct" them.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Remainder days at or above this count round the total up by one month.
const ROUND_UP_DAYS: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AgeResult {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub total_months: u32,
}

/// Compute the age on `test_date` of a child born on `birth_date`.
pub fn calculate_age(
    birth_date: NaiveDate,
    test_date: NaiveDate,
) -> Result<AgeResult, ValidationError> {
    if birth_date > test_date {
        return Err(ValidationError::InvalidDateRange);
    }

    let mut years = test_date.year() - birth_date.year();
    let mut months = test_date.month() as i32 - birth_date.month() as i32;
    let mut days = test_date.day() as i32 - birth_date.day() as i32;

    if days < 0 {
        months -= 1;
        days += days_in_previous_month(test_date) as i32;
    }

    if months < 0 {
        years -= 1;
        months += 12;
    }

    let total_months = years * 12 + months + if days >= ROUND_UP_DAYS { 1 } else { 0 };

    // A single borrow can leave days negative when the previous month is
    // shorter than the birth day (Jan 31 -> Mar 1). Neither months nor the
    // total depend on it, so report zero.
    Ok(AgeResult {
        years: years as u32,
        months: months as u32,
        days: days.max(0) as u32,
        total_months: total_months as u32,
    })
}

/// Same as [`calculate_age`] but for timestamps. The time of day is dropped:
/// each instant is reduced to its calendar date in its own time zone.
pub fn calculate_age_at<Tz: TimeZone>(
    birth: &DateTime<Tz>,
    test: &DateTime<Tz>,
) -> Result<AgeResult, ValidationError> {
    calculate_age(birth.date_naive(), test.date_naive())
}

/// Number of days in the month immediately before `date`'s month.
fn days_in_previous_month(date: NaiveDate) -> u32 {
    // Day 0 of the test month, i.e. the last day of the previous one.
    date.with_day(1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// "3세 6개월 (총 42개월)"
pub fn format_age_result(age: &AgeResult) -> String {
    format!("{}세 {}개월 (총 {}개월)", age.years, age.months, age.total_months)
}

/// Short form used in copied reports: "3세 6개월", "3세", or "6개월".
pub fn format_age_short(age: &AgeResult) -> String {
    if age.years == 0 {
        format!("{}개월", age.months)
    } else if age.months == 0 {
        format!("{}세", age.years)
    } else {
        format!("{}세 {}개월", age.years, age.months)
    }
}

/// Format an equivalent (developmental) age given in months.
pub fn format_equivalent_age(months: u32) -> String {
    if months < 12 {
        return format!("{}개월", months);
    }
    let years = months / 12;
    let remaining = months % 12;
    if remaining == 0 {
        format!("{}세", years)
    } else {
        format!("{}세 {}개월", years, remaining)
    }
}
