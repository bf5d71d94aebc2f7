//! Configuration types for payroll computation.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Metadata about the payroll policy in force.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PolicyMetadata {
    /// Short policy code.
    pub code: String,
    /// The human-readable name of the policy.
    pub name: String,
    /// The version or effective date of the policy.
    pub version: String,
}

/// Working-time rules used to turn salaries into rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkRules {
    /// Hours in a working day; divides the daily rate into an hourly rate.
    pub hours_per_day: Decimal,
    /// Working days in a week; divides a weekly salary into a daily rate.
    pub working_days_per_week: Decimal,
}

/// The policy file structure (`policy.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    /// Policy metadata.
    #[serde(flatten)]
    pub metadata: PolicyMetadata,
    /// Working-time rules.
    pub work_rules: WorkRules,
}

/// A statutory contribution rate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContributionRate {
    /// The rate applied to the prorated base (e.g. 0.04).
    pub rate: Decimal,
    /// Legal reference for the contribution.
    pub reference: String,
}

/// Income tax withholding settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IncomeTaxConfig {
    /// Divisor applied to the income tax base per pay run (2 = half a month).
    pub base_divisor: Decimal,
    /// Legal reference for the withholding.
    pub reference: String,
}

/// The statutory deductions file structure (`deductions.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeductionRates {
    /// Social security, prorated by Mondays in the half.
    pub social_security: ContributionRate,
    /// Unemployment fund, prorated by Mondays in the half.
    pub unemployment_fund: ContributionRate,
    /// Housing fund, prorated by days in the half.
    pub housing_fund: ContributionRate,
    /// Income tax withholding, not prorated.
    pub income_tax: IncomeTaxConfig,
}

/// The overtime file structure (`overtime.yaml`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OvertimeRates {
    /// Multiplier on the hourly rate for a daytime overtime hour.
    pub day_multiplier: Decimal,
    /// Multiplier on the daytime overtime value for a night overtime hour.
    pub night_multiplier: Decimal,
    /// Legal reference for overtime premiums.
    pub reference: String,
}

/// The complete payroll configuration loaded from YAML files.
///
/// [`PayrollConfig::default`] carries the statutory values shipped in
/// `config/default`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayrollConfig {
    metadata: PolicyMetadata,
    work_rules: WorkRules,
    deductions: DeductionRates,
    overtime: OvertimeRates,
}

impl PayrollConfig {
    /// Creates a new PayrollConfig from its component parts.
    pub fn new(
        metadata: PolicyMetadata,
        work_rules: WorkRules,
        deductions: DeductionRates,
        overtime: OvertimeRates,
    ) -> Self {
        Self {
            metadata,
            work_rules,
            deductions,
            overtime,
        }
    }

    /// Returns the policy metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns the working-time rules.
    pub fn work_rules(&self) -> &WorkRules {
        &self.work_rules
    }

    /// Returns the statutory deduction rates.
    pub fn deductions(&self) -> &DeductionRates {
        &self.deductions
    }

    /// Returns the overtime multipliers.
    pub fn overtime(&self) -> &OvertimeRates {
        &self.overtime
    }
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            metadata: PolicyMetadata {
                code: "STATUTORY".to_string(),
                name: "Statutory payroll policy".to_string(),
                version: "2026-01-01".to_string(),
            },
            work_rules: WorkRules {
                hours_per_day: Decimal::new(8, 0),
                working_days_per_week: Decimal::new(5, 0),
            },
            deductions: DeductionRates {
                social_security: ContributionRate {
                    rate: Decimal::new(4, 2),
                    reference: "Social Security Law".to_string(),
                },
                unemployment_fund: ContributionRate {
                    rate: Decimal::new(5, 3),
                    reference: "Employment Benefit Regime Law".to_string(),
                },
                housing_fund: ContributionRate {
                    rate: Decimal::new(1, 2),
                    reference: "Housing and Habitat Law".to_string(),
                },
                income_tax: IncomeTaxConfig {
                    base_divisor: Decimal::new(2, 0),
                    reference: "Income Tax Withholding Regulation".to_string(),
                },
            },
            overtime: OvertimeRates {
                day_multiplier: Decimal::new(15, 1),
                night_multiplier: Decimal::new(13, 1),
                reference: "Labour Law overtime and night premium".to_string(),
            },
        }
    }
}
