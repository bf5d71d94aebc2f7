//! Payment line and batch assembly.
//!
//! Combines attendance, rates, overtime and legal deductions into immutable
//! [`PaymentLine`]s. Every function here is pure over already-fetched inputs;
//! persistence is left to the caller.
//!
//! ## Line Formulas
//!
//! ```text
//! subtotal_foreign = daily_rate × days + overtime − manual_deduction − advance
//! subtotal_local   = subtotal_foreign × exchange_rate
//! payable_local    = subtotal_local − legal_deductions
//! bonus_foreign    = bonus_local / exchange_rate
//! final_take_home  = subtotal_foreign + bonus_foreign + advance
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AuditStep, AuditTrace, AuditWarning, BatchTotals, Employee,
    EmployeeSnapshot, HalfMonth, ManualInputs, PaymentBatch, PaymentLine,
};

use super::attendance::{aggregate_attendance, resolve_days_to_pay};
use super::daily_rate::resolve_daily_rate;
use super::legal_deductions::calculate_legal_deductions;
use super::overtime::calculate_overtime_premium;

/// Largest exchange rate a run accepts.
pub const MAX_EXCHANGE_RATE: i64 = 1_000_000_000_000;

/// Largest manual money amount (deduction, advance, bonus) accepted.
pub const MAX_MANUAL_AMOUNT: i64 = 1_000_000_000_000;

/// Overtime hours are capped at every hour of a 31-day month.
pub const MAX_OVERTIME_HOURS: i64 = 744;

/// A day override can never exceed the longest month.
pub const MAX_OVERRIDE_DAYS: i64 = 31;

/// Rejects a zero or negative exchange rate, or one above
/// [`MAX_EXCHANGE_RATE`].
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::validate_exchange_rate;
/// use rust_decimal::Decimal;
///
/// assert!(validate_exchange_rate(Decimal::from(36)).is_ok());
/// assert!(validate_exchange_rate(Decimal::ZERO).is_err());
/// assert!(validate_exchange_rate(Decimal::MAX).is_err());
/// ```
pub fn validate_exchange_rate(rate: Decimal) -> EngineResult<Decimal> {
    if rate <= Decimal::ZERO {
        return Err(EngineError::InvalidExchangeRate { rate });
    }
    if rate > Decimal::from(MAX_EXCHANGE_RATE) {
        return Err(EngineError::InvalidInput {
            field: "exchange_rate".to_string(),
            message: format!("must not exceed {}, got {}", MAX_EXCHANGE_RATE, rate),
        });
    }
    Ok(rate)
}

/// Rejects negative or out-of-range manual quantities for an employee.
pub fn validate_manual_inputs(employee_id: &str, inputs: &ManualInputs) -> EngineResult<()> {
    let hours_cap = Decimal::from(MAX_OVERTIME_HOURS);
    let amount_cap = Decimal::from(MAX_MANUAL_AMOUNT);

    let mut quantities = vec![
        ("day_overtime_hours", inputs.day_overtime_hours, hours_cap),
        ("night_overtime_hours", inputs.night_overtime_hours, hours_cap),
        ("manual_deduction", inputs.manual_deduction, amount_cap),
        ("advance", inputs.advance, amount_cap),
        ("bonus_local", inputs.bonus_local, amount_cap),
    ];
    if let Some(days_override) = inputs.days_override {
        quantities.push((
            "days_override.days",
            days_override.days,
            Decimal::from(MAX_OVERRIDE_DAYS),
        ));
    }

    for (field, value, cap) in quantities {
        let message = if value.is_sign_negative() && !value.is_zero() {
            format!("must not be negative, got {}", value)
        } else if value > cap {
            format!("must not exceed {}, got {}", cap, value)
        } else {
            continue;
        };
        return Err(EngineError::InvalidInput {
            field: format!("manual_inputs.{}.{}", employee_id, field),
            message,
        });
    }
    Ok(())
}

/// Maps a failed checked operation to a calculation error.
pub(crate) fn checked(value: Option<Decimal>, what: &str, subject: &str) -> EngineResult<Decimal> {
    value.ok_or_else(|| EngineError::CalculationError {
        message: format!("{} overflowed for '{}'", what, subject),
    })
}

fn checked_totals(lines: &[PaymentLine], project_id: &str) -> EngineResult<BatchTotals> {
    BatchTotals::from_lines(lines).ok_or_else(|| EngineError::CalculationError {
        message: format!("batch totals overflowed for '{}'", project_id),
    })
}

/// The parameters shared by every line of one pay run.
#[derive(Debug, Clone, Copy)]
pub struct PaymentRun<'a> {
    /// The project being paid.
    pub project_id: &'a str,
    /// The pay date.
    pub pay_date: NaiveDate,
    /// Half-month selection for biweekly days and legal deductions.
    pub half: HalfMonth,
    /// Local currency units per foreign unit; must be positive.
    pub exchange_rate: Decimal,
    /// Statutory rates and work rules.
    pub config: &'a PayrollConfig,
}

/// The result of assembling one payment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLineResult {
    /// The computed line.
    pub line: PaymentLine,
    /// Audit steps in computation order.
    pub audit_steps: Vec<AuditStep>,
    /// Warnings raised for this employee.
    pub warnings: Vec<AuditWarning>,
}

/// Assembles a single employee's payment line.
///
/// This is a pure function of the employee, the attendance sheets covering
/// the window, the operator's manual inputs and the run parameters.
///
/// # Errors
///
/// Returns [`EngineError::InvalidExchangeRate`] for a non-positive rate,
/// [`EngineError::InvalidInput`] for a negative or out-of-range manual
/// quantity, [`EngineError::InvalidEmployee`] when the employee carries a
/// negative amount or its rate cannot be resolved, and
/// [`EngineError::CalculationError`] when an amount overflows.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{PaymentRun, assemble_payment_line};
/// use payroll_engine::config::PayrollConfig;
/// use payroll_engine::models::*;
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let employee = Employee {
///     id: "emp_002".to_string(),
///     name: "Luis Mora".to_string(),
///     national_id: "V-2".to_string(),
///     position: "Welder".to_string(),
///     payroll_type: PayrollType::DirectSalary,
///     direct_salary: Some(DirectSalary { salary_type: SalaryType::Daily, amount: Decimal::from(40) }),
///     pay_frequency: PayFrequency::Weekly,
///     legal_base_amount: Decimal::ZERO,
///     company_bonus_amount: Decimal::ZERO,
///     income_tax_withholding_percentage: Decimal::ZERO,
///     legal_bases: LegalBases::default(),
///     bank_account: None,
///     status: EmployeeStatus::Active,
/// };
/// let pay_date = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
/// let mut sheet = AttendanceRecord::new("proj_01", pay_date);
/// sheet.entries.insert(
///     "emp_002".to_string(),
///     EmployeeAttendance { present: true, hours_worked: Decimal::from(8), notes: None },
/// );
///
/// let config = PayrollConfig::default();
/// let run = PaymentRun {
///     project_id: "proj_01",
///     pay_date,
///     half: HalfMonth::First,
///     exchange_rate: Decimal::from(36),
///     config: &config,
/// };
///
/// let result = assemble_payment_line(&employee, &[sheet], &ManualInputs::default(), &run, 1).unwrap();
/// assert_eq!(result.line.subtotal_foreign, Decimal::from(40));
/// assert_eq!(result.line.subtotal_local, Decimal::from(1440));
/// ```
pub fn assemble_payment_line(
    employee: &Employee,
    attendance: &[AttendanceRecord],
    inputs: &ManualInputs,
    run: &PaymentRun<'_>,
    step_number_start: u32,
) -> EngineResult<PaymentLineResult> {
    let exchange_rate = validate_exchange_rate(run.exchange_rate)?;
    validate_manual_inputs(&employee.id, inputs)?;
    employee.validate()?;

    let mut audit_steps = Vec::new();
    let mut warnings = Vec::new();
    let mut step_number = step_number_start;

    // Days
    let attendance_result =
        aggregate_attendance(employee, attendance, run.pay_date, run.half, step_number);
    audit_steps.push(attendance_result.audit_step);
    warnings.extend(attendance_result.warnings);
    step_number += 1;

    let days_result = resolve_days_to_pay(
        &employee.id,
        attendance_result.derived_days,
        inputs.days_override,
        run.pay_date,
        run.half,
        step_number,
    );
    let days_worked = days_result.days;
    audit_steps.push(days_result.audit_step);
    warnings.extend(days_result.warning);
    step_number += 1;

    // Rates
    let rate_result = resolve_daily_rate(employee, run.pay_date, run.config, step_number)?;
    let daily_rate = rate_result.daily_rate;
    let hourly_rate = rate_result.hourly_rate;
    let reference_date = rate_result.calendar.reference_date;
    audit_steps.push(rate_result.audit_step);
    step_number += 1;

    // Overtime
    let overtime_result = calculate_overtime_premium(
        hourly_rate,
        inputs.day_overtime_hours,
        inputs.night_overtime_hours,
        run.config,
        step_number,
    )?;
    let overtime = overtime_result.breakdown;
    audit_steps.push(overtime_result.audit_step);
    step_number += 1;

    // Legal deductions
    let legal_result = calculate_legal_deductions(
        employee,
        reference_date,
        run.half,
        exchange_rate,
        run.config,
        step_number,
    )?;
    let legal_deductions = legal_result.breakdown;
    audit_steps.push(legal_result.audit_step);
    step_number += 1;

    // Totals
    let id = employee.id.as_str();
    let base_pay = checked(daily_rate.checked_mul(days_worked), "base pay", id)?;
    let subtotal_foreign = checked(
        base_pay
            .checked_add(overtime.total_pay)
            .and_then(|v| v.checked_sub(inputs.manual_deduction))
            .and_then(|v| v.checked_sub(inputs.advance)),
        "foreign subtotal",
        id,
    )?;
    let subtotal_local = checked(subtotal_foreign.checked_mul(exchange_rate), "local subtotal", id)?;
    let payable_local = checked(
        subtotal_local.checked_sub(legal_deductions.total),
        "payable amount",
        id,
    )?;
    let bonus_foreign = checked(inputs.bonus_local.checked_div(exchange_rate), "bonus", id)?;
    let final_take_home = checked(
        subtotal_foreign
            .checked_add(bonus_foreign)
            .and_then(|v| v.checked_add(inputs.advance)),
        "take-home amount",
        id,
    )?;

    if subtotal_foreign.is_sign_negative() && !subtotal_foreign.is_zero() {
        warnings.push(AuditWarning::new(
            "NEGATIVE_SUBTOTAL",
            format!(
                "Deductions and advance exceed earnings for employee '{}': subtotal {}",
                employee.id,
                subtotal_foreign.round_dp(2)
            ),
            "high",
        ));
    }

    audit_steps.push(AuditStep {
        step_number,
        rule_id: "payment_totals".to_string(),
        rule_name: "Payment Totals".to_string(),
        formula: "subtotal_foreign = daily_rate × days + overtime − manual_deduction − advance; payable_local = subtotal_foreign × fx − legal; final = subtotal_foreign + bonus_local / fx + advance".to_string(),
        input: serde_json::json!({
            "daily_rate": daily_rate.normalize().to_string(),
            "days_worked": days_worked.normalize().to_string(),
            "overtime_pay": overtime.total_pay.normalize().to_string(),
            "manual_deduction": inputs.manual_deduction.normalize().to_string(),
            "advance": inputs.advance.normalize().to_string(),
            "bonus_local": inputs.bonus_local.normalize().to_string(),
            "legal_deductions": legal_deductions.total.normalize().to_string(),
            "exchange_rate": exchange_rate.normalize().to_string()
        }),
        output: serde_json::json!({
            "subtotal_foreign": subtotal_foreign.normalize().to_string(),
            "subtotal_local": subtotal_local.normalize().to_string(),
            "payable_local": payable_local.normalize().to_string(),
            "bonus_foreign": bonus_foreign.normalize().to_string(),
            "final_take_home": final_take_home.normalize().to_string()
        }),
        reasoning: format!(
            "{} days × ${} + ${} overtime − ${} deduction − ${} advance = ${}",
            days_worked.normalize(),
            daily_rate.round_dp(4).normalize(),
            overtime.total_pay.round_dp(4).normalize(),
            inputs.manual_deduction.normalize(),
            inputs.advance.normalize(),
            subtotal_foreign.round_dp(4).normalize()
        ),
    });

    let line = PaymentLine {
        employee: EmployeeSnapshot::from(employee),
        days_worked,
        daily_rate,
        hourly_rate,
        overtime,
        manual_deduction: inputs.manual_deduction,
        advance: inputs.advance,
        bonus_local: inputs.bonus_local,
        bonus_foreign,
        legal_deductions,
        bank_account: employee.bank_account.clone(),
        notes: inputs.notes.clone(),
        subtotal_foreign,
        subtotal_local,
        payable_local,
        final_take_home,
    };

    Ok(PaymentLineResult {
        line,
        audit_steps,
        warnings,
    })
}

/// A computed batch that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedBatch {
    /// The batch as it will be stored.
    pub batch: PaymentBatch,
    /// Steps and warnings for every line.
    pub audit_trace: AuditTrace,
}

/// Assembles the employee payment batch for a pay run.
///
/// Inactive employees are excluded. Employees with neither days nor overtime
/// to pay are skipped with a warning. Manual inputs keyed by an id that is not
/// on the roster are ignored with a warning.
///
/// # Errors
///
/// Validation errors are returned before any line is computed.
/// [`EngineError::NoEligibleEmployees`] is returned when no line remains.
pub fn assemble_batch(
    employees: &[Employee],
    attendance: &[AttendanceRecord],
    inputs: &BTreeMap<String, ManualInputs>,
    run: &PaymentRun<'_>,
) -> EngineResult<PreparedBatch> {
    let start_time = Instant::now();
    let exchange_rate = validate_exchange_rate(run.exchange_rate)?;
    for (employee_id, employee_inputs) in inputs {
        validate_manual_inputs(employee_id, employee_inputs)?;
    }

    let mut lines = Vec::new();
    let mut steps = Vec::new();
    let mut warnings = Vec::new();
    let mut step_number: u32 = 1;
    let default_inputs = ManualInputs::default();

    for employee_id in inputs.keys() {
        if !employees.iter().any(|e| &e.id == employee_id) {
            warnings.push(AuditWarning::new(
                "UNKNOWN_EMPLOYEE_INPUT",
                format!("Manual inputs for unknown employee '{}' were ignored", employee_id),
                "medium",
            ));
        }
    }

    for employee in employees.iter().filter(|e| e.is_active()) {
        let employee_inputs = inputs.get(&employee.id).unwrap_or(&default_inputs);
        let result = assemble_payment_line(employee, attendance, employee_inputs, run, step_number)?;

        let overtime = &result.line.overtime;
        let nothing_to_pay = result.line.days_worked.is_zero()
            && overtime.day_hours.is_zero()
            && overtime.night_hours.is_zero();
        if nothing_to_pay {
            warnings.push(AuditWarning::new(
                "NO_DAYS_TO_PAY",
                format!(
                    "Employee '{}' has no days or overtime to pay and was skipped",
                    employee.id
                ),
                "low",
            ));
            continue;
        }

        step_number += result.audit_steps.len() as u32;
        steps.extend(result.audit_steps);
        warnings.extend(result.warnings);
        lines.push(result.line);
    }

    if lines.is_empty() {
        return Err(EngineError::NoEligibleEmployees {
            project_id: run.project_id.to_string(),
            pay_date: run.pay_date,
        });
    }

    let totals = checked_totals(&lines, run.project_id)?;
    let duration_us = start_time.elapsed().as_micros() as u64;

    Ok(PreparedBatch {
        batch: PaymentBatch {
            id: Uuid::new_v4(),
            project_id: run.project_id.to_string(),
            pay_date: run.pay_date,
            half: run.half,
            exchange_rate,
            lines,
            totals,
            created_at: Utc::now(),
        },
        audit_trace: AuditTrace {
            steps,
            warnings,
            duration_us,
        },
    })
}
