//! Calendar facts used by rate resolution and legal deductions.
//!
//! All month-level facts are taken from a reference date: the Monday of the
//! pay week for weekly employees, the pay date itself for biweekly ones.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{HalfMonth, PayFrequency};

/// Returns the Monday of the week containing `date`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::monday_of_week;
/// use chrono::NaiveDate;
///
/// // 2026-01-16 is a Friday
/// let friday = NaiveDate::from_ymd_opt(2026, 1, 16).unwrap();
/// assert_eq!(monday_of_week(friday), NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
/// ```
pub fn monday_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Iterates every date of the month containing `date`.
fn month_days(date: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let first = date - Duration::days(i64::from(date.day0()));
    let month = first.month();
    first.iter_days().take_while(move |d| d.month() == month)
}

/// Counts Monday to Friday in the month containing `date`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::business_days_in_month;
/// use chrono::NaiveDate;
///
/// assert_eq!(business_days_in_month(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()), 22);
/// assert_eq!(business_days_in_month(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()), 20);
/// ```
pub fn business_days_in_month(date: NaiveDate) -> u32 {
    month_days(date)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .count() as u32
}

/// Counts the days in the month containing `date`.
pub fn calendar_days_in_month(date: NaiveDate) -> u32 {
    month_days(date).count() as u32
}

/// Counts the Mondays in the month containing `date`.
pub fn mondays_in_month(date: NaiveDate) -> u32 {
    month_days(date)
        .filter(|d| d.weekday() == Weekday::Mon)
        .count() as u32
}

/// Counts the Mondays inside one half of the month containing `date`.
///
/// The two halves always add up to [`mondays_in_month`].
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::mondays_in_half;
/// use payroll_engine::models::HalfMonth;
/// use chrono::NaiveDate;
///
/// // January 2026 Mondays: 5, 12, 19, 26
/// let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
/// assert_eq!(mondays_in_half(date, HalfMonth::First), 2);
/// assert_eq!(mondays_in_half(date, HalfMonth::Second), 2);
/// ```
pub fn mondays_in_half(date: NaiveDate, half: HalfMonth) -> u32 {
    month_days(date)
        .filter(|d| half.contains_day(d.day()) && d.weekday() == Weekday::Mon)
        .count() as u32
}

/// Days in one half of the month: 15 for the first, the remainder for the second.
pub fn days_in_half(date: NaiveDate, half: HalfMonth) -> u32 {
    match half {
        HalfMonth::First => HalfMonth::SPLIT_DAY,
        HalfMonth::Second => calendar_days_in_month(date) - HalfMonth::SPLIT_DAY,
    }
}

/// Returns the date whose month governs rate and proration math.
pub fn reference_date(pay_date: NaiveDate, frequency: PayFrequency) -> NaiveDate {
    match frequency {
        PayFrequency::Weekly => monday_of_week(pay_date),
        PayFrequency::Biweekly => pay_date,
    }
}

/// Month-level facts for a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarFacts {
    /// The date the facts were taken from.
    pub reference_date: NaiveDate,
    /// Monday to Friday count in the reference month.
    pub business_days_in_month: u32,
    /// Total days in the reference month.
    pub calendar_days_in_month: u32,
}

impl CalendarFacts {
    /// Collects the facts for a pay date under a given frequency.
    pub fn for_pay_date(pay_date: NaiveDate, frequency: PayFrequency) -> Self {
        let reference_date = reference_date(pay_date, frequency);
        Self {
            reference_date,
            business_days_in_month: business_days_in_month(reference_date),
            calendar_days_in_month: calendar_days_in_month(reference_date),
        }
    }
}
