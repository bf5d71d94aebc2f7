//! Payment line and batch models.
//!
//! This module contains the [`PaymentBatch`] and [`ContractorPaymentBatch`]
//! types, the lines they hold, and the manual inputs an operator supplies per
//! employee. A persisted batch is a historical fact: lines carry a frozen
//! snapshot of the employee so later edits never rewrite history.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Contractor, Employee, HalfMonth, LegalBases, PayFrequency, PayWindow, PayrollType, SalaryType,
    WeekdayKey,
};

/// Decimal places money is shown with.
pub const PRESENTATION_DECIMAL_PLACES: u32 = 2;

/// Rounds a money amount for presentation, half away from zero.
///
/// # Example
///
/// ```
/// use payroll_engine::models::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("158.8068").unwrap()), Decimal::from_str("158.81").unwrap());
/// assert_eq!(round_money(Decimal::from_str("0.125").unwrap()), Decimal::from_str("0.13").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        PRESENTATION_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// The sub-ledger a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ledger {
    /// Employee payroll.
    Employee,
    /// External contractor billing.
    Contractor,
}

impl std::fmt::Display for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ledger::Employee => write!(f, "employee"),
            Ledger::Contractor => write!(f, "contractor"),
        }
    }
}

/// An operator-entered day count replacing the derived one.
///
/// The override is pinned to the run it was typed for: the derived value shown
/// at the time, the pay date and the half selection. Once any of them differs
/// from the current run, the override no longer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysOverride {
    /// Days to pay.
    pub days: Decimal,
    /// The derived value the override replaced.
    pub entered_against: Decimal,
    /// The pay date selected when the override was entered.
    pub pay_date: NaiveDate,
    /// The half selected when the override was entered.
    pub half: HalfMonth,
}

impl DaysOverride {
    /// Returns true while the override still matches the run it was typed for.
    pub fn applies_to(&self, derived: Decimal, pay_date: NaiveDate, half: HalfMonth) -> bool {
        self.entered_against == derived && self.pay_date == pay_date && self.half == half
    }
}

/// Values an operator types in per employee for one pay run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualInputs {
    /// Daytime overtime hours.
    #[serde(default)]
    pub day_overtime_hours: Decimal,
    /// Night overtime hours.
    #[serde(default)]
    pub night_overtime_hours: Decimal,
    /// Ad-hoc deduction, foreign currency.
    #[serde(default)]
    pub manual_deduction: Decimal,
    /// Advance already disbursed, foreign currency.
    #[serde(default)]
    pub advance: Decimal,
    /// Bonus, local currency.
    #[serde(default)]
    pub bonus_local: Decimal,
    /// Optional day-count override.
    #[serde(default)]
    pub days_override: Option<DaysOverride>,
    /// Free-form notes copied to the line.
    #[serde(default)]
    pub notes: Option<String>,
}

/// The employee attributes frozen into a payment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSnapshot {
    /// Employee id.
    pub id: String,
    /// Full name at pay time.
    pub name: String,
    /// National identity document number.
    pub national_id: String,
    /// Position at pay time.
    pub position: String,
    /// Payroll regime at pay time.
    pub payroll_type: PayrollType,
    /// Salary unit for direct-salary employees.
    pub salary_type: Option<SalaryType>,
    /// Pay frequency at pay time.
    pub pay_frequency: PayFrequency,
    /// Monthly legal base amount.
    pub legal_base_amount: Decimal,
    /// Monthly company bonus.
    pub company_bonus_amount: Decimal,
    /// Direct salary amount, zero for law-based employees.
    pub salary_amount: Decimal,
    /// Income tax withholding percentage points.
    pub income_tax_withholding_percentage: Decimal,
    /// Statutory deduction bases.
    pub legal_bases: LegalBases,
}

impl From<&Employee> for EmployeeSnapshot {
    fn from(employee: &Employee) -> Self {
        EmployeeSnapshot {
            id: employee.id.clone(),
            name: employee.name.clone(),
            national_id: employee.national_id.clone(),
            position: employee.position.clone(),
            payroll_type: employee.payroll_type,
            salary_type: employee.direct_salary.map(|s| s.salary_type),
            pay_frequency: employee.pay_frequency,
            legal_base_amount: employee.legal_base_amount,
            company_bonus_amount: employee.company_bonus_amount,
            salary_amount: employee
                .direct_salary
                .map(|s| s.amount)
                .unwrap_or(Decimal::ZERO),
            income_tax_withholding_percentage: employee.income_tax_withholding_percentage,
            legal_bases: employee.legal_bases,
        }
    }
}

/// Overtime hours and the premiums they earn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeBreakdown {
    /// Daytime overtime hours.
    pub day_hours: Decimal,
    /// Night overtime hours.
    pub night_hours: Decimal,
    /// Value of one daytime overtime hour.
    pub day_value: Decimal,
    /// Value of one night overtime hour.
    pub night_value: Decimal,
    /// Total overtime pay, foreign currency.
    pub total_pay: Decimal,
}

/// The four statutory deductions, local currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalDeductionBreakdown {
    /// Social security contribution.
    pub social_security: Decimal,
    /// Unemployment fund contribution.
    pub unemployment_fund: Decimal,
    /// Housing fund contribution.
    pub housing_fund: Decimal,
    /// Income tax withheld.
    pub income_tax_withholding: Decimal,
    /// Sum of the four.
    pub total: Decimal,
}

impl LegalDeductionBreakdown {
    /// Builds a breakdown, computing the total from its parts.
    ///
    /// Returns `None` if the total overflows.
    pub fn new(
        social_security: Decimal,
        unemployment_fund: Decimal,
        housing_fund: Decimal,
        income_tax_withholding: Decimal,
    ) -> Option<Self> {
        let total = social_security
            .checked_add(unemployment_fund)?
            .checked_add(housing_fund)?
            .checked_add(income_tax_withholding)?;
        Some(Self {
            social_security,
            unemployment_fund,
            housing_fund,
            income_tax_withholding,
            total,
        })
    }

    /// Returns true if every deduction is zero.
    pub fn is_zero(&self) -> bool {
        self.total.is_zero()
            && self.social_security.is_zero()
            && self.unemployment_fund.is_zero()
            && self.housing_fund.is_zero()
            && self.income_tax_withholding.is_zero()
    }
}

/// One employee's payment for a pay run.
///
/// Amounts are kept at full precision; use [`PaymentLine::for_presentation`]
/// for a copy rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    /// Frozen employee attributes.
    pub employee: EmployeeSnapshot,
    /// Days paid.
    pub days_worked: Decimal,
    /// Resolved daily rate, foreign currency.
    pub daily_rate: Decimal,
    /// Resolved hourly rate, foreign currency.
    pub hourly_rate: Decimal,
    /// Overtime hours and premiums.
    pub overtime: OvertimeBreakdown,
    /// Ad-hoc deduction, foreign currency.
    pub manual_deduction: Decimal,
    /// Advance already disbursed, foreign currency.
    pub advance: Decimal,
    /// Bonus, local currency.
    pub bonus_local: Decimal,
    /// Bonus converted to foreign currency.
    pub bonus_foreign: Decimal,
    /// Statutory deductions, local currency.
    pub legal_deductions: LegalDeductionBreakdown,
    /// Bank account at pay time.
    pub bank_account: Option<String>,
    /// Operator notes.
    pub notes: Option<String>,
    /// Base pay plus overtime minus deduction and advance, foreign currency.
    pub subtotal_foreign: Decimal,
    /// Subtotal converted to local currency.
    pub subtotal_local: Decimal,
    /// Local subtotal minus legal deductions.
    pub payable_local: Decimal,
    /// Total received in foreign currency, advance included.
    pub final_take_home: Decimal,
}

impl PaymentLine {
    /// Returns a copy with every money amount rounded to cents.
    pub fn for_presentation(&self) -> PaymentLine {
        let legal = &self.legal_deductions;
        PaymentLine {
            daily_rate: round_money(self.daily_rate),
            hourly_rate: round_money(self.hourly_rate),
            overtime: OvertimeBreakdown {
                day_value: round_money(self.overtime.day_value),
                night_value: round_money(self.overtime.night_value),
                total_pay: round_money(self.overtime.total_pay),
                ..self.overtime
            },
            manual_deduction: round_money(self.manual_deduction),
            advance: round_money(self.advance),
            bonus_local: round_money(self.bonus_local),
            bonus_foreign: round_money(self.bonus_foreign),
            legal_deductions: LegalDeductionBreakdown {
                social_security: round_money(legal.social_security),
                unemployment_fund: round_money(legal.unemployment_fund),
                housing_fund: round_money(legal.housing_fund),
                income_tax_withholding: round_money(legal.income_tax_withholding),
                total: round_money(legal.total),
            },
            subtotal_foreign: round_money(self.subtotal_foreign),
            subtotal_local: round_money(self.subtotal_local),
            payable_local: round_money(self.payable_local),
            final_take_home: round_money(self.final_take_home),
            ..self.clone()
        }
    }
}

/// Column sums over every line of a batch, at full precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    /// Total days paid.
    pub days_worked: Decimal,
    /// Total overtime pay, foreign currency.
    pub overtime_pay: Decimal,
    /// Total manual deductions, foreign currency.
    pub manual_deductions: Decimal,
    /// Total advances, foreign currency.
    pub advances: Decimal,
    /// Total bonus, local currency.
    pub bonus_local: Decimal,
    /// Total bonus, foreign currency.
    pub bonus_foreign: Decimal,
    /// Total legal deductions, local currency.
    pub legal_deductions: Decimal,
    /// Total subtotal, foreign currency.
    pub subtotal_foreign: Decimal,
    /// Total subtotal, local currency.
    pub subtotal_local: Decimal,
    /// Total payable, local currency.
    pub payable_local: Decimal,
    /// Total take-home, foreign currency.
    pub final_take_home: Decimal,
}

impl BatchTotals {
    /// Sums the lines of a batch, or returns `None` if any total overflows.
    pub fn from_lines(lines: &[PaymentLine]) -> Option<Self> {
        lines.iter().try_fold(BatchTotals::default(), |acc, line| {
            Some(BatchTotals {
                days_worked: acc.days_worked.checked_add(line.days_worked)?,
                overtime_pay: acc.overtime_pay.checked_add(line.overtime.total_pay)?,
                manual_deductions: acc.manual_deductions.checked_add(line.manual_deduction)?,
                advances: acc.advances.checked_add(line.advance)?,
                bonus_local: acc.bonus_local.checked_add(line.bonus_local)?,
                bonus_foreign: acc.bonus_foreign.checked_add(line.bonus_foreign)?,
                legal_deductions: acc
                    .legal_deductions
                    .checked_add(line.legal_deductions.total)?,
                subtotal_foreign: acc.subtotal_foreign.checked_add(line.subtotal_foreign)?,
                subtotal_local: acc.subtotal_local.checked_add(line.subtotal_local)?,
                payable_local: acc.payable_local.checked_add(line.payable_local)?,
                final_take_home: acc.final_take_home.checked_add(line.final_take_home)?,
            })
        })
    }

    /// Returns a copy with every amount rounded to cents.
    pub fn for_presentation(&self) -> BatchTotals {
        BatchTotals {
            days_worked: self.days_worked,
            overtime_pay: round_money(self.overtime_pay),
            manual_deductions: round_money(self.manual_deductions),
            advances: round_money(self.advances),
            bonus_local: round_money(self.bonus_local),
            bonus_foreign: round_money(self.bonus_foreign),
            legal_deductions: round_money(self.legal_deductions),
            subtotal_foreign: round_money(self.subtotal_foreign),
            subtotal_local: round_money(self.subtotal_local),
            payable_local: round_money(self.payable_local),
            final_take_home: round_money(self.final_take_home),
        }
    }
}

/// An employee payment batch for one project and pay date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentBatch {
    /// Unique identifier for the batch.
    pub id: Uuid,
    /// The project paid.
    pub project_id: String,
    /// The pay date; unique per project.
    pub pay_date: NaiveDate,
    /// Half-month selection used for biweekly days and legal deductions.
    pub half: HalfMonth,
    /// Local currency units per foreign unit.
    pub exchange_rate: Decimal,
    /// Lines in employee order.
    pub lines: Vec<PaymentLine>,
    /// Column sums.
    pub totals: BatchTotals,
    /// When the batch was computed.
    pub created_at: DateTime<Utc>,
}

/// Contractor attributes frozen into a contractor payment line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorSnapshot {
    /// Contractor id.
    pub id: String,
    /// Name at pay time.
    pub name: String,
    /// Trade at pay time.
    pub trade: String,
    /// Headcount ceiling at pay time.
    pub max_personnel: u32,
}

impl From<&Contractor> for ContractorSnapshot {
    fn from(contractor: &Contractor) -> Self {
        ContractorSnapshot {
            id: contractor.id.clone(),
            name: contractor.name.clone(),
            trade: contractor.trade.clone(),
            max_personnel: contractor.max_personnel,
        }
    }
}

/// One contractor's billing for a rolling week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorPaymentLine {
    /// Frozen contractor attributes.
    pub contractor: ContractorSnapshot,
    /// Billable headcount per weekday in the window.
    pub headcount_by_weekday: BTreeMap<WeekdayKey, u32>,
    /// Sum of billable headcount over the window.
    pub total_headcount_days: u32,
    /// Rate per headcount-day, foreign currency.
    pub daily_rate: Decimal,
    /// Billing in foreign currency.
    pub payment_foreign: Decimal,
    /// Billing in local currency.
    pub payment_local: Decimal,
}

/// A contractor payment batch for one project and pay date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorPaymentBatch {
    /// Unique identifier for the batch.
    pub id: Uuid,
    /// The project billed.
    pub project_id: String,
    /// The pay date; unique per project.
    pub pay_date: NaiveDate,
    /// Saturday through the pay date.
    pub window: PayWindow,
    /// Local currency units per foreign unit.
    pub exchange_rate: Decimal,
    /// Lines in contractor order.
    pub lines: Vec<ContractorPaymentLine>,
    /// Sum of foreign payments.
    pub total_foreign: Decimal,
    /// Sum of local payments.
    pub total_local: Decimal,
    /// When the batch was computed.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_line(subtotal: &str) -> PaymentLine {
        PaymentLine {
            employee: EmployeeSnapshot {
                id: "emp_001".to_string(),
                name: "Ana Torres".to_string(),
                national_id: "V-1".to_string(),
                position: "Supervisor".to_string(),
                payroll_type: PayrollType::LawBasedExecution,
                salary_type: None,
                pay_frequency: PayFrequency::Weekly,
                legal_base_amount: dec("600"),
                company_bonus_amount: dec("50"),
                salary_amount: Decimal::ZERO,
                income_tax_withholding_percentage: Decimal::ZERO,
                legal_bases: LegalBases::default(),
            },
            days_worked: dec("5"),
            daily_rate: dec("29.545454545"),
            hourly_rate: dec("3.693181818"),
            overtime: OvertimeBreakdown::default(),
            manual_deduction: Decimal::ZERO,
            advance: Decimal::ZERO,
            bonus_local: Decimal::ZERO,
            bonus_foreign: Decimal::ZERO,
            legal_deductions: LegalDeductionBreakdown::default(),
            bank_account: None,
            notes: None,
            subtotal_foreign: dec(subtotal),
            subtotal_local: dec(subtotal),
            payable_local: dec(subtotal),
            final_take_home: dec(subtotal),
        }
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec("2.345")), dec("2.35"));
        assert_eq!(round_money(dec("-2.345")), dec("-2.35"));
        assert_eq!(round_money(dec("2.344")), dec("2.34"));
    }

    #[test]
    fn test_legal_breakdown_total_is_sum() {
        let breakdown =
            LegalDeductionBreakdown::new(dec("10.4"), dec("1.3"), dec("2.9"), dec("5")).unwrap();
        assert_eq!(breakdown.total, dec("19.6"));
        assert!(!breakdown.is_zero());
        assert!(LegalDeductionBreakdown::default().is_zero());
    }

    #[test]
    fn test_batch_totals_keep_full_precision() {
        // Three lines of 0.004 each round to 0.00 individually but sum to 0.012
        let lines = vec![
            sample_line("0.004"),
            sample_line("0.004"),
            sample_line("0.004"),
        ];
        let totals = BatchTotals::from_lines(&lines).unwrap();
        assert_eq!(totals.subtotal_foreign, dec("0.012"));
        assert_eq!(totals.for_presentation().subtotal_foreign, dec("0.01"));
        assert_eq!(totals.days_worked, dec("15"));
    }

    #[test]
    fn test_batch_totals_overflow_is_none() {
        let lines = vec![
            sample_line("79228162514264337593543950335"),
            sample_line("1"),
        ];
        assert!(BatchTotals::from_lines(&lines).is_none());
    }

    #[test]
    fn test_line_presentation_rounds_money_only() {
        let line = sample_line("158.8068181");
        let shown = line.for_presentation();
        assert_eq!(shown.subtotal_foreign, dec("158.81"));
        assert_eq!(shown.daily_rate, dec("29.55"));
        assert_eq!(shown.days_worked, dec("5"));
        assert_eq!(shown.employee, line.employee);
    }

    #[test]
    fn test_ledger_display() {
        assert_eq!(Ledger::Employee.to_string(), "employee");
        assert_eq!(Ledger::Contractor.to_string(), "contractor");
    }

    #[test]
    fn test_manual_inputs_default_from_empty_json() {
        let inputs: ManualInputs = serde_json::from_str("{}").unwrap();
        assert_eq!(inputs, ManualInputs::default());
    }
}
