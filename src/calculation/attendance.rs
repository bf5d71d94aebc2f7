//! Attendance aggregation for employee pay windows.
//!
//! Weekly employees are paid for the days they were marked present in a
//! Saturday to Friday window. Biweekly employees are paid the full half month
//! less the days they were explicitly marked absent. A date with no record at
//! all is never an absence and never an error.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    AttendanceRecord, AuditStep, AuditWarning, DaysOverride, Employee, HalfMonth, PayFrequency,
    PayWindow,
};

use super::calendar::{calendar_days_in_month, days_in_half, monday_of_week};

/// Returns the weekly pay window for a pay date.
///
/// The window runs from the Saturday before the Monday of the pay date's week
/// through the Friday of that week.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::weekly_pay_window;
/// use chrono::NaiveDate;
///
/// // 2026-01-14 is a Wednesday
/// let window = weekly_pay_window(NaiveDate::from_ymd_opt(2026, 1, 14).unwrap());
/// assert_eq!(window.start_date, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
/// assert_eq!(window.end_date, NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());
/// ```
pub fn weekly_pay_window(pay_date: NaiveDate) -> PayWindow {
    let monday = monday_of_week(pay_date);
    PayWindow::new(monday - Duration::days(2), monday + Duration::days(4))
}

/// Returns the window covering one half of the month containing `date`.
pub fn half_month_window(date: NaiveDate, half: HalfMonth) -> PayWindow {
    let first = date - Duration::days(i64::from(date.day0()));
    let split = i64::from(HalfMonth::SPLIT_DAY);
    match half {
        HalfMonth::First => PayWindow::new(first, first + Duration::days(split - 1)),
        HalfMonth::Second => PayWindow::new(
            first + Duration::days(split),
            first + Duration::days(i64::from(calendar_days_in_month(date)) - 1),
        ),
    }
}

/// The result of aggregating one employee's attendance for a pay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceResult {
    /// The window that was aggregated.
    pub window: PayWindow,
    /// Days to pay as derived from attendance.
    pub derived_days: u32,
    /// Days the employee was marked present.
    pub days_present: u32,
    /// Days the employee was explicitly marked absent.
    pub days_absent: u32,
    /// Hours summed over present days.
    pub hours_worked: Decimal,
    /// Window dates with no attendance record at all.
    pub dates_without_record: Vec<NaiveDate>,
    /// Warnings raised while aggregating.
    pub warnings: Vec<AuditWarning>,
    /// The audit step documenting the aggregation.
    pub audit_step: AuditStep,
}

/// Aggregates an employee's attendance for the pay run.
///
/// Weekly employees get the count of present days in [`weekly_pay_window`].
/// Biweekly employees get the days in the selected half less explicit
/// absences, never below zero.
///
/// `records` may contain dates outside the window; they are ignored.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::aggregate_attendance;
/// use payroll_engine::models::*;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_001".to_string(),
///     name: "Ana Torres".to_string(),
///     national_id: "V-1".to_string(),
///     position: "Supervisor".to_string(),
///     payroll_type: PayrollType::LawBasedExecution,
///     direct_salary: None,
///     pay_frequency: PayFrequency::Biweekly,
///     legal_base_amount: Decimal::from(600),
///     company_bonus_amount: Decimal::ZERO,
///     income_tax_withholding_percentage: Decimal::ZERO,
///     legal_bases: LegalBases::default(),
///     bank_account: None,
///     status: EmployeeStatus::Active,
/// };
///
/// // No records at all: the full first half is paid
/// let pay_date = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
/// let result = aggregate_attendance(&employee, &[], pay_date, HalfMonth::First, 1);
/// assert_eq!(result.derived_days, 15);
/// ```
pub fn aggregate_attendance(
    employee: &Employee,
    records: &[AttendanceRecord],
    pay_date: NaiveDate,
    half: HalfMonth,
    step_number: u32,
) -> AttendanceResult {
    let window = match employee.pay_frequency {
        PayFrequency::Weekly => weekly_pay_window(pay_date),
        PayFrequency::Biweekly => half_month_window(pay_date, half),
    };

    let by_date: BTreeMap<NaiveDate, &AttendanceRecord> = records
        .iter()
        .filter(|r| window.contains_date(r.date))
        .map(|r| (r.date, r))
        .collect();

    let mut days_present = 0u32;
    let mut days_absent = 0u32;
    let mut hours_worked = Decimal::ZERO;
    let mut dates_without_record = Vec::new();

    for date in window.dates() {
        let Some(record) = by_date.get(&date) else {
            dates_without_record.push(date);
            continue;
        };
        match record.entries.get(&employee.id) {
            Some(entry) if entry.present => {
                days_present += 1;
                hours_worked += entry.hours_worked;
            }
            Some(_) => days_absent += 1,
            None => {}
        }
    }

    let (derived_days, formula, reasoning) = match employee.pay_frequency {
        PayFrequency::Weekly => (
            days_present,
            "count(days marked present in window)",
            format!(
                "Weekly window {} to {}: {} days present",
                window.start_date, window.end_date, days_present
            ),
        ),
        PayFrequency::Biweekly => {
            let default_days = days_in_half(pay_date, half);
            let days = default_days.saturating_sub(days_absent);
            (
                days,
                "days_in_half - explicit absences",
                format!(
                    "{} half {} to {}: {} days less {} explicit absences = {} days",
                    half.as_str(),
                    window.start_date,
                    window.end_date,
                    default_days,
                    days_absent,
                    days
                ),
            )
        }
    };

    let mut warnings = Vec::new();
    if !dates_without_record.is_empty() {
        let dates: Vec<String> = dates_without_record.iter().map(|d| d.to_string()).collect();
        warnings.push(AuditWarning::new(
            "MISSING_ATTENDANCE",
            format!(
                "No attendance record for employee '{}' on {}; counted as not worked",
                employee.id,
                dates.join(", ")
            ),
            "low",
        ));
    }

    let audit_step = AuditStep {
        step_number,
        rule_id: "attendance_aggregation".to_string(),
        rule_name: "Attendance Aggregation".to_string(),
        formula: formula.to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "pay_frequency": employee.pay_frequency.as_str(),
            "window_start": window.start_date.to_string(),
            "window_end": window.end_date.to_string(),
            "records_in_window": by_date.len()
        }),
        output: serde_json::json!({
            "derived_days": derived_days,
            "days_present": days_present,
            "days_absent": days_absent,
            "hours_worked": hours_worked.normalize().to_string(),
            "dates_without_record": dates_without_record.len()
        }),
        reasoning,
    };

    AttendanceResult {
        window,
        derived_days,
        days_present,
        days_absent,
        hours_worked,
        dates_without_record,
        warnings,
        audit_step,
    }
}

/// The days actually paid after considering a manual override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysToPayResult {
    /// Days to pay.
    pub days: Decimal,
    /// Whether the override replaced the derived value.
    pub override_applied: bool,
    /// Set when a stale override was discarded.
    pub warning: Option<AuditWarning>,
    /// The audit step documenting the decision.
    pub audit_step: AuditStep,
}

/// Applies a manual day-count override to the derived value.
///
/// The override holds only while the run matches the one it was typed for:
/// same derived value, same pay date, same half. Once attendance or the half
/// selection changes, the derived value wins and a warning is raised, even
/// when both halves happen to derive the same count.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::resolve_days_to_pay;
/// use payroll_engine::models::{DaysOverride, HalfMonth};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let pay_date = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();
/// let manual = DaysOverride {
///     days: Decimal::from(12),
///     entered_against: Decimal::from(15),
///     pay_date,
///     half: HalfMonth::First,
/// };
///
/// let kept = resolve_days_to_pay("emp_001", 15, Some(manual), pay_date, HalfMonth::First, 2);
/// assert_eq!(kept.days, Decimal::from(12));
///
/// let discarded = resolve_days_to_pay("emp_001", 15, Some(manual), pay_date, HalfMonth::Second, 2);
/// assert_eq!(discarded.days, Decimal::from(15));
/// assert!(discarded.warning.is_some());
/// ```
pub fn resolve_days_to_pay(
    employee_id: &str,
    derived_days: u32,
    days_override: Option<DaysOverride>,
    pay_date: NaiveDate,
    half: HalfMonth,
    step_number: u32,
) -> DaysToPayResult {
    let derived = Decimal::from(derived_days);

    let (days, override_applied, warning, reasoning) = match days_override {
        None => (
            derived,
            false,
            None,
            format!("No override; paying {} derived days", derived_days),
        ),
        Some(manual) if manual.applies_to(derived, pay_date, half) => (
            manual.days,
            true,
            None,
            format!(
                "Override of {} days entered against {} derived days still applies",
                manual.days.normalize(),
                derived_days
            ),
        ),
        Some(manual) => (
            derived,
            false,
            Some(AuditWarning::new(
                "OVERRIDE_DISCARDED",
                format!(
                    "Day override of {} for employee '{}' was entered against {} days for {} ({} half) but the run derives {} for {} ({} half); using derived value",
                    manual.days.normalize(),
                    employee_id,
                    manual.entered_against.normalize(),
                    manual.pay_date,
                    manual.half.as_str(),
                    derived_days,
                    pay_date,
                    half.as_str()
                ),
                "medium",
            )),
            format!(
                "Override entered against {} days for {} ({} half) is stale; paying {} derived days",
                manual.entered_against.normalize(),
                manual.pay_date,
                manual.half.as_str(),
                derived_days
            ),
        ),
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "days_to_pay".to_string(),
        rule_name: "Days To Pay".to_string(),
        formula: "override if entered_against, pay_date and half match the run else derived".to_string(),
        input: serde_json::json!({
            "employee_id": employee_id,
            "derived_days": derived_days,
            "pay_date": pay_date.to_string(),
            "half": half.as_str(),
            "override_days": days_override.map(|o| o.days.normalize().to_string()),
            "override_entered_against": days_override.map(|o| o.entered_against.normalize().to_string())
        }),
        output: serde_json::json!({
            "days": days.normalize().to_string(),
            "override_applied": override_applied
        }),
        reasoning,
    };

    DaysToPayResult {
        days,
        override_applied,
        warning,
        audit_step,
    }
}
