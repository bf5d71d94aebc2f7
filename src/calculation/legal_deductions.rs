//! Statutory deductions for law-based payroll.
//!
//! ## Formulas
//!
//! - **Social security:** `base × mondays_in_half × 0.04`
//! - **Unemployment fund:** `base × mondays_in_half × 0.005`
//! - **Housing fund:** `base / calendar_days_in_month × days_in_half × 0.01`
//! - **Income tax:** `base / 2 × exchange_rate × withholding% / 100`
//!
//! The first three are prorated over the half month; income tax is not.
//! Direct-salary employees carry no statutory deductions.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{AuditStep, Employee, HalfMonth, LegalDeductionBreakdown};

use super::assembler::checked;
use super::calendar::{calendar_days_in_month, days_in_half, mondays_in_half};

/// The result of the legal deduction calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalDeductionResult {
    /// The four deductions and their total, local currency.
    pub breakdown: LegalDeductionBreakdown,
    /// Mondays in the selected half of the reference month.
    pub mondays_in_half: u32,
    /// Days in the selected half of the reference month.
    pub days_in_half: u32,
    /// The audit step documenting the calculation.
    pub audit_step: AuditStep,
}

/// Computes the four statutory deductions for an employee.
///
/// `reference_date` selects the month whose Mondays and days are counted.
/// All outputs are zero for direct-salary employees. An overflowing
/// deduction is a [`EngineError::CalculationError`].
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_legal_deductions;
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
///     income_tax_withholding_percentage: Decimal::from(3),
///     legal_bases: LegalBases {
///         social_security: Decimal::from(130),
///         unemployment_fund: Decimal::from(130),
///         housing_fund: Decimal::from(600),
///         income_tax: Decimal::from(400),
///     },
///     bank_account: None,
///     status: EmployeeStatus::Active,
/// };
///
/// let result = calculate_legal_deductions(
///     &employee,
///     NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
///     HalfMonth::First,
///     Decimal::from(36),
///     &PayrollConfig::default(),
///     1,
/// )
/// .unwrap();
/// assert!(result.breakdown.is_zero());
/// ```
pub fn calculate_legal_deductions(
    employee: &Employee,
    reference_date: NaiveDate,
    half: HalfMonth,
    exchange_rate: Decimal,
    config: &PayrollConfig,
    step_number: u32,
) -> EngineResult<LegalDeductionResult> {
    let mondays = mondays_in_half(reference_date, half);
    let half_days = days_in_half(reference_date, half);

    if !employee.is_law_based() {
        let audit_step = AuditStep {
            step_number,
            rule_id: "legal_deductions".to_string(),
            rule_name: "Legal Deductions".to_string(),
            formula: "not applicable".to_string(),
            input: serde_json::json!({
                "employee_id": employee.id,
                "payroll_type": employee.payroll_type.as_str()
            }),
            output: serde_json::json!({
                "total": "0"
            }),
            reasoning: format!(
                "Payroll type '{}' is not subject to legal deductions",
                employee.payroll_type.as_str()
            ),
        };
        return Ok(LegalDeductionResult {
            breakdown: LegalDeductionBreakdown::default(),
            mondays_in_half: mondays,
            days_in_half: half_days,
            audit_step,
        });
    }

    let rates = config.deductions();
    let bases = &employee.legal_bases;
    let mondays_dec = Decimal::from(mondays);
    let month_days = Decimal::from(calendar_days_in_month(reference_date));

    let overflow = |value, what| checked(value, what, &employee.id);

    let social_security = overflow(
        bases
            .social_security
            .checked_mul(mondays_dec)
            .and_then(|v| v.checked_mul(rates.social_security.rate)),
        "social security",
    )?;
    let unemployment_fund = overflow(
        bases
            .unemployment_fund
            .checked_mul(mondays_dec)
            .and_then(|v| v.checked_mul(rates.unemployment_fund.rate)),
        "unemployment fund",
    )?;
    let housing_fund = overflow(
        bases
            .housing_fund
            .checked_div(month_days)
            .and_then(|v| v.checked_mul(Decimal::from(half_days)))
            .and_then(|v| v.checked_mul(rates.housing_fund.rate)),
        "housing fund",
    )?;
    // Percentage points, e.g. 3 means 3%
    let income_tax_withholding = overflow(
        bases
            .income_tax
            .checked_div(rates.income_tax.base_divisor)
            .and_then(|v| v.checked_mul(exchange_rate))
            .and_then(|v| v.checked_mul(employee.income_tax_withholding_percentage))
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
        "income tax withholding",
    )?;

    let breakdown = overflow_total(
        LegalDeductionBreakdown::new(
            social_security,
            unemployment_fund,
            housing_fund,
            income_tax_withholding,
        ),
        &employee.id,
    )?;

    let audit_step = AuditStep {
        step_number,
        rule_id: "legal_deductions".to_string(),
        rule_name: "Legal Deductions".to_string(),
        formula: "ss = base × mondays × rate; uf = base × mondays × rate; hf = base / month_days × half_days × rate; itw = base / divisor × fx × pct / 100".to_string(),
        input: serde_json::json!({
            "employee_id": employee.id,
            "reference_date": reference_date.to_string(),
            "half": half.as_str(),
            "mondays_in_half": mondays,
            "days_in_half": half_days,
            "calendar_days_in_month": calendar_days_in_month(reference_date),
            "exchange_rate": exchange_rate.normalize().to_string(),
            "withholding_percentage": employee.income_tax_withholding_percentage.normalize().to_string(),
            "bases": {
                "social_security": bases.social_security.normalize().to_string(),
                "unemployment_fund": bases.unemployment_fund.normalize().to_string(),
                "housing_fund": bases.housing_fund.normalize().to_string(),
                "income_tax": bases.income_tax.normalize().to_string()
            }
        }),
        output: serde_json::json!({
            "social_security": social_security.normalize().to_string(),
            "unemployment_fund": unemployment_fund.normalize().to_string(),
            "housing_fund": housing_fund.normalize().to_string(),
            "income_tax_withholding": income_tax_withholding.normalize().to_string(),
            "total": breakdown.total.normalize().to_string()
        }),
        reasoning: format!(
            "{} half of {}: {} Mondays, {} days; social security ({}), unemployment fund ({}), housing fund ({}), income tax ({})",
            half.as_str(),
            reference_date.format("%Y-%m"),
            mondays,
            half_days,
            rates.social_security.reference,
            rates.unemployment_fund.reference,
            rates.housing_fund.reference,
            rates.income_tax.reference
        ),
    };

    Ok(LegalDeductionResult {
        breakdown,
        mondays_in_half: mondays,
        days_in_half: half_days,
        audit_step,
    })
}

fn overflow_total(
    breakdown: Option<LegalDeductionBreakdown>,
    employee_id: &str,
) -> EngineResult<LegalDeductionBreakdown> {
    breakdown.ok_or_else(|| EngineError::CalculationError {
        message: format!("legal deduction total overflowed for '{}'", employee_id),
    })
}
