//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configurations from YAML files.

use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{EngineError, EngineResult};

use super::types::{DeductionRates, OvertimeRates, PayrollConfig, PolicyFile};

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// The configuration directory should have the following structure:
/// ```text
/// config/default/
/// ├── policy.yaml      # Policy metadata and working-time rules
/// ├── deductions.yaml  # Statutory deduction rates
/// └── overtime.yaml    # Overtime multipliers
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
/// println!("Loaded policy: {}", loader.config().metadata().name);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if any required file is missing or contains invalid
    /// YAML, or if a loaded rate is out of range.
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let policy = Self::load_yaml::<PolicyFile>(&path.join("policy.yaml"))?;
        let deductions = Self::load_yaml::<DeductionRates>(&path.join("deductions.yaml"))?;
        let overtime = Self::load_yaml::<OvertimeRates>(&path.join("overtime.yaml"))?;

        let config = PayrollConfig::new(policy.metadata, policy.work_rules, deductions, overtime);
        Self::validate(&config, path)?;

        debug!(
            path = %path.display(),
            policy = %config.metadata().code,
            version = %config.metadata().version,
            "Loaded payroll configuration"
        );

        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Rejects divisors that would divide by zero and negative rates.
    fn validate(config: &PayrollConfig, path: &Path) -> EngineResult<()> {
        let invalid = |message: &str| EngineError::ConfigParseError {
            path: path.display().to_string(),
            message: message.to_string(),
        };

        let rules = config.work_rules();
        if rules.hours_per_day <= Decimal::ZERO {
            return Err(invalid("work_rules.hours_per_day must be greater than zero"));
        }
        if rules.working_days_per_week <= Decimal::ZERO {
            return Err(invalid(
                "work_rules.working_days_per_week must be greater than zero",
            ));
        }

        let deductions = config.deductions();
        if deductions.income_tax.base_divisor <= Decimal::ZERO {
            return Err(invalid("income_tax.base_divisor must be greater than zero"));
        }
        let rates = [
            deductions.social_security.rate,
            deductions.unemployment_fund.rate,
            deductions.housing_fund.rate,
            config.overtime().day_multiplier,
            config.overtime().night_multiplier,
        ];
        if rates.iter().any(|r| r.is_sign_negative()) {
            return Err(invalid("rates and multipliers must not be negative"));
        }

        Ok(())
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }
}
