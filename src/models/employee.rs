//! Employee model and related types.
//!
//! This module defines the [`Employee`] struct together with the payroll,
//! salary and pay-frequency enums that drive rate resolution and legal
//! deductions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// The payroll regime an employee is paid under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollType {
    /// Law-based payroll for administrative staff.
    LawBasedAdministrative,
    /// Law-based payroll for site execution staff.
    LawBasedExecution,
    /// Flat daily/weekly/monthly salary, outside the statutory regime.
    DirectSalary,
}

impl PayrollType {
    /// Returns true for the two law-based payroll types.
    ///
    /// Only law-based employees are subject to legal deductions.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::PayrollType;
    ///
    /// assert!(PayrollType::LawBasedExecution.is_law_based());
    /// assert!(!PayrollType::DirectSalary.is_law_based());
    /// ```
    pub fn is_law_based(self) -> bool {
        matches!(
            self,
            PayrollType::LawBasedAdministrative | PayrollType::LawBasedExecution
        )
    }

    /// Returns the snake_case key used in audit output.
    pub fn as_str(self) -> &'static str {
        match self {
            PayrollType::LawBasedAdministrative => "law_based_administrative",
            PayrollType::LawBasedExecution => "law_based_execution",
            PayrollType::DirectSalary => "direct_salary",
        }
    }
}

/// The unit a direct salary is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalaryType {
    /// Salary is a daily rate.
    Daily,
    /// Salary is a weekly amount covering five working days.
    Weekly,
    /// Salary is a monthly amount.
    Monthly,
}

/// How often an employee is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayFrequency {
    /// Paid every week for a Saturday to Friday window.
    Weekly,
    /// Paid twice a month, per half-month period.
    Biweekly,
}

impl PayFrequency {
    /// Returns the snake_case key used in audit output.
    pub fn as_str(self) -> &'static str {
        match self {
            PayFrequency::Weekly => "weekly",
            PayFrequency::Biweekly => "biweekly",
        }
    }
}

/// Whether an employee is currently on the payroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// Included in payroll runs.
    #[default]
    Active,
    /// Kept for history, excluded from payroll runs.
    Inactive,
}

/// Salary terms for a direct-salary employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectSalary {
    /// The unit the amount is quoted in.
    pub salary_type: SalaryType,
    /// The salary amount in foreign currency.
    pub amount: Decimal,
}

/// Per-employee base amounts feeding the four statutory deductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LegalBases {
    /// Base for the social security contribution.
    #[serde(default)]
    pub social_security: Decimal,
    /// Base for the unemployment fund contribution.
    #[serde(default)]
    pub unemployment_fund: Decimal,
    /// Base for the housing fund contribution.
    #[serde(default)]
    pub housing_fund: Decimal,
    /// Base for income tax withholding, in foreign currency.
    #[serde(default)]
    pub income_tax: Decimal,
}

/// Represents an employee on a project payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Full name.
    pub name: String,
    /// National identity document number.
    pub national_id: String,
    /// Job position on the project.
    pub position: String,
    /// The payroll regime.
    pub payroll_type: PayrollType,
    /// Salary terms; required for direct-salary employees.
    #[serde(default)]
    pub direct_salary: Option<DirectSalary>,
    /// How often the employee is paid.
    pub pay_frequency: PayFrequency,
    /// Monthly statutory base amount (law-based payroll).
    #[serde(default)]
    pub legal_base_amount: Decimal,
    /// Monthly company bonus added to the legal base (law-based payroll).
    #[serde(default)]
    pub company_bonus_amount: Decimal,
    /// Income tax withholding, expressed in percentage points (e.g. 3 for 3%).
    #[serde(default)]
    pub income_tax_withholding_percentage: Decimal,
    /// Base amounts for the statutory deductions.
    #[serde(default)]
    pub legal_bases: LegalBases,
    /// Bank account the payment is deposited into.
    #[serde(default)]
    pub bank_account: Option<String>,
    /// Active or inactive.
    #[serde(default)]
    pub status: EmployeeStatus,
}

impl Employee {
    /// Returns true if the employee should be included in payroll runs.
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Returns true if the employee is paid under a law-based payroll.
    pub fn is_law_based(&self) -> bool {
        self.payroll_type.is_law_based()
    }

    /// Rejects a negative amount, percentage or legal base.
    pub fn validate(&self) -> EngineResult<()> {
        let mut amounts = vec![
            ("legal_base_amount", self.legal_base_amount),
            ("company_bonus_amount", self.company_bonus_amount),
            (
                "income_tax_withholding_percentage",
                self.income_tax_withholding_percentage,
            ),
            ("legal_bases.social_security", self.legal_bases.social_security),
            ("legal_bases.unemployment_fund", self.legal_bases.unemployment_fund),
            ("legal_bases.housing_fund", self.legal_bases.housing_fund),
            ("legal_bases.income_tax", self.legal_bases.income_tax),
        ];
        if let Some(salary) = self.direct_salary {
            amounts.push(("direct_salary.amount", salary.amount));
        }

        match amounts
            .into_iter()
            .find(|(_, value)| value.is_sign_negative() && !value.is_zero())
        {
            Some((field, value)) => Err(EngineError::InvalidEmployee {
                employee_id: self.id.clone(),
                message: format!("{} must not be negative, got {}", field, value),
            }),
            None => Ok(()),
        }
    }
}
