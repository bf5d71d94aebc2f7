//! Pay window and half-month models.
//!
//! This module contains the [`PayWindow`], [`HalfMonth`] and [`WeekdayKey`]
//! types used to define the date range a payment covers.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Which half of a calendar month a biweekly period covers.
///
/// The first half is days 1 to 15, the second half is day 16 to month end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfMonth {
    /// Days 1 to 15.
    First,
    /// Day 16 to the end of the month.
    Second,
}

impl HalfMonth {
    /// The last day of the first half.
    pub const SPLIT_DAY: u32 = 15;

    /// Returns the half a date falls in.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::HalfMonth;
    /// use chrono::NaiveDate;
    ///
    /// assert_eq!(HalfMonth::of(NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()), HalfMonth::First);
    /// assert_eq!(HalfMonth::of(NaiveDate::from_ymd_opt(2026, 2, 16).unwrap()), HalfMonth::Second);
    /// ```
    pub fn of(date: NaiveDate) -> Self {
        if date.day() <= Self::SPLIT_DAY {
            HalfMonth::First
        } else {
            HalfMonth::Second
        }
    }

    /// Returns true if the day-of-month belongs to this half.
    pub fn contains_day(self, day: u32) -> bool {
        match self {
            HalfMonth::First => day <= Self::SPLIT_DAY,
            HalfMonth::Second => day > Self::SPLIT_DAY,
        }
    }

    /// Returns the snake_case key used in audit output.
    pub fn as_str(self) -> &'static str {
        match self {
            HalfMonth::First => "first",
            HalfMonth::Second => "second",
        }
    }
}

/// Weekday keys in pay-week order, Saturday first.
///
/// Contractor headcount grids and payment lines are keyed by these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayKey {
    /// Saturday.
    Saturday,
    /// Sunday.
    Sunday,
    /// Monday.
    Monday,
    /// Tuesday.
    Tuesday,
    /// Wednesday.
    Wednesday,
    /// Thursday.
    Thursday,
    /// Friday.
    Friday,
}

impl WeekdayKey {
    /// Returns the key for a date's weekday.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat => WeekdayKey::Saturday,
            Weekday::Sun => WeekdayKey::Sunday,
            Weekday::Mon => WeekdayKey::Monday,
            Weekday::Tue => WeekdayKey::Tuesday,
            Weekday::Wed => WeekdayKey::Wednesday,
            Weekday::Thu => WeekdayKey::Thursday,
            Weekday::Fri => WeekdayKey::Friday,
        }
    }

    /// Days elapsed since the Saturday that opens the pay week.
    pub fn offset_from_saturday(self) -> u32 {
        self as u32
    }
}

/// An inclusive date range a payment covers.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayWindow;
/// use chrono::NaiveDate;
///
/// let window = PayWindow::new(
///     NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 16).unwrap(),
/// );
///
/// assert_eq!(window.len_days(), 7);
/// assert!(window.contains_date(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()));
/// assert!(!window.contains_date(NaiveDate::from_ymd_opt(2026, 1, 17).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayWindow {
    /// First day of the window (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive).
    pub end_date: NaiveDate,
}

impl PayWindow {
    /// Creates a window from its inclusive bounds.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// Checks if a given date falls within this window, inclusive of both ends.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns every date in the window in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start_date
            .iter_days()
            .take_while(|d| *d <= self.end_date)
            .collect()
    }

    /// Number of calendar days in the window.
    pub fn len_days(&self) -> u32 {
        if self.end_date < self.start_date {
            return 0;
        }
        ((self.end_date - self.start_date).num_days() + 1) as u32
    }
}
