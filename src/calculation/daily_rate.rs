//! Daily and hourly rate resolution.
//!
//! ## Rate Structure
//!
//! - **Law-based:** `(legal_base + company_bonus) / divisor`
//! - **Direct salary, daily:** the salary is the daily rate
//! - **Direct salary, weekly:** `salary / working_days_per_week`
//! - **Direct salary, monthly:** `salary / divisor`
//!
//! The monthly divisor is the business days of the reference month for weekly
//! employees and the calendar days of the pay month for biweekly employees.
//! The hourly rate is always `daily_rate / hours_per_day`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Employee, PayFrequency, PayrollType, SalaryType};

use super::calendar::CalendarFacts;

/// The result of resolving an employee's rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRateResult {
    /// Rate per day worked, foreign currency.
    pub daily_rate: Decimal,
    /// Rate per hour, foreign currency.
    pub hourly_rate: Decimal,
    /// Calendar facts the rate was derived from.
    pub calendar: CalendarFacts,
    /// The audit step documenting the resolution.
    pub audit_step: AuditStep,
}

/// Resolves the daily and hourly rate of an employee for a pay date.
///
/// # Errors
///
/// Returns [`EngineError::InvalidEmployee`] when a direct-salary employee has
/// no salary terms, or when the monthly divisor is zero.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_daily_rate;
/// use payroll_engine::config::PayrollConfig;
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
///     pay_frequency: PayFrequency::Weekly,
///     legal_base_amount: Decimal::from(600),
///     company_bonus_amount: Decimal::from(50),
///     income_tax_withholding_percentage: Decimal::ZERO,
///     legal_bases: LegalBases::default(),
///     bank_account: None,
///     status: EmployeeStatus::Active,
/// };
///
/// // January 2026 has 22 business days
/// let pay_date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
/// let result = resolve_daily_rate(&employee, pay_date, &PayrollConfig::default(), 1).unwrap();
/// assert_eq!(result.daily_rate, Decimal::from(650) / Decimal::from(22));
/// assert_eq!(result.hourly_rate, result.daily_rate / Decimal::from(8));
/// ```
pub fn resolve_daily_rate(
    employee: &Employee,
    pay_date: NaiveDate,
    config: &PayrollConfig,
    step_number: u32,
) -> EngineResult<DailyRateResult> {
    let calendar = CalendarFacts::for_pay_date(pay_date, employee.pay_frequency);
    let rules = config.work_rules();

    let (monthly_divisor, divisor_name) = match employee.pay_frequency {
        PayFrequency::Weekly => (
            Decimal::from(calendar.business_days_in_month),
            "business_days_in_month",
        ),
        PayFrequency::Biweekly => (
            Decimal::from(calendar.calendar_days_in_month),
            "calendar_days_in_month",
        ),
    };

    let divide_monthly = |amount: Decimal| -> EngineResult<Decimal> {
        amount
            .checked_div(monthly_divisor)
            .ok_or_else(|| EngineError::InvalidEmployee {
                employee_id: employee.id.clone(),
                message: format!("{} is zero for {}", divisor_name, calendar.reference_date),
            })
    };

    let (daily_rate, formula, reasoning) = match employee.payroll_type {
        PayrollType::LawBasedAdministrative | PayrollType::LawBasedExecution => {
            let monthly_total = employee.legal_base_amount + employee.company_bonus_amount;
            let daily_rate = divide_monthly(monthly_total)?;
            (
                daily_rate,
                format!("(legal_base + company_bonus) / {}", divisor_name),
                format!(
                    "Law-based: ({} + {}) / {} {} = {}",
                    employee.legal_base_amount.normalize(),
                    employee.company_bonus_amount.normalize(),
                    monthly_divisor,
                    divisor_name,
                    daily_rate.normalize()
                ),
            )
        }
        PayrollType::DirectSalary => {
            let salary = employee
                .direct_salary
                .ok_or_else(|| EngineError::InvalidEmployee {
                    employee_id: employee.id.clone(),
                    message: "direct-salary employee has no salary terms".to_string(),
                })?;

            match salary.salary_type {
                SalaryType::Daily => (
                    salary.amount,
                    "salary".to_string(),
                    format!("Daily salary used as-is: {}", salary.amount.normalize()),
                ),
                SalaryType::Weekly => {
                    let daily_rate = salary.amount / rules.working_days_per_week;
                    (
                        daily_rate,
                        "salary / working_days_per_week".to_string(),
                        format!(
                            "Weekly salary: {} / {} = {}",
                            salary.amount.normalize(),
                            rules.working_days_per_week.normalize(),
                            daily_rate.normalize()
                        ),
                    )
                }
                SalaryType::Monthly => {
                    let daily_rate = divide_monthly(salary.amount)?;
                    (
                        daily_rate,
                        format!("salary / {}", divisor_name),
                        format!(
                            "Monthly salary: {} / {} {} = {}",
                            salary.amount.normalize(),
                            monthly_divisor,
                            divisor_name,
                            daily_rate.normalize()
                        ),
                    )
                }
            }
        }
    };

    let hourly_rate = daily_rate / rules.hours_per_day;

    let audit_step = AuditStep {
        step_number,
        rule_id: "daily_rate".to_string(),
        rule_name: "Daily Rate Resolution".to_string(),
        formula: format!("daily_rate = {}; hourly_rate = daily_rate / hours_per_day", formula),
        input: serde_json::json!({
            "employee_id": employee.id,
            "payroll_type": employee.payroll_type.as_str(),
            "pay_frequency": employee.pay_frequency.as_str(),
            "pay_date": pay_date.to_string(),
            "reference_date": calendar.reference_date.to_string(),
            "business_days_in_month": calendar.business_days_in_month,
            "calendar_days_in_month": calendar.calendar_days_in_month,
            "hours_per_day": rules.hours_per_day.normalize().to_string()
        }),
        output: serde_json::json!({
            "daily_rate": daily_rate.normalize().to_string(),
            "hourly_rate": hourly_rate.normalize().to_string()
        }),
        reasoning,
    };

    Ok(DailyRateResult {
        daily_rate,
        hourly_rate,
        calendar,
        audit_step,
    })
}
