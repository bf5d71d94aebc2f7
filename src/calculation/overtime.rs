//! Overtime premium calculation.
//!
//! A daytime overtime hour is worth the hourly rate times the day multiplier
//! (150%). A night overtime hour carries a further night premium on top of the
//! daytime value (130%), so it is worth 195% of the hourly rate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::PayrollConfig;
use crate::error::EngineResult;
use crate::models::{AuditStep, OvertimeBreakdown};

use super::assembler::checked;

/// The result of an overtime premium calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePremiumResult {
    /// Hours, hourly values and total pay.
    pub breakdown: OvertimeBreakdown,
    /// The audit step documenting the calculation.
    pub audit_step: AuditStep,
}

/// Converts day and night overtime hours into pay.
///
/// # Errors
///
/// Returns [`crate::error::EngineError::CalculationError`] when the premium
/// overflows.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::calculate_overtime_premium;
/// use payroll_engine::config::PayrollConfig;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// let result = calculate_overtime_premium(
///     Decimal::from(10),
///     Decimal::from(2),
///     Decimal::from(1),
///     &PayrollConfig::default(),
///     1,
/// )
/// .unwrap();
///
/// assert_eq!(result.breakdown.day_value, Decimal::from(15));
/// assert_eq!(result.breakdown.night_value, Decimal::from_str("19.5").unwrap());
/// assert_eq!(result.breakdown.total_pay, Decimal::from_str("49.5").unwrap());
/// ```
pub fn calculate_overtime_premium(
    hourly_rate: Decimal,
    day_hours: Decimal,
    night_hours: Decimal,
    config: &PayrollConfig,
    step_number: u32,
) -> EngineResult<OvertimePremiumResult> {
    let rates = config.overtime();
    let subject = format!("hourly rate {}", hourly_rate.normalize());
    let overflow = |value| checked(value, "overtime premium", &subject);

    let day_value = overflow(hourly_rate.checked_mul(rates.day_multiplier))?;
    let night_value = overflow(day_value.checked_mul(rates.night_multiplier))?;
    let total_pay = overflow(
        day_hours
            .checked_mul(day_value)
            .zip(night_hours.checked_mul(night_value))
            .and_then(|(day, night)| day.checked_add(night)),
    )?;

    let breakdown = OvertimeBreakdown {
        day_hours,
        night_hours,
        day_value,
        night_value,
        total_pay,
    };

    let reasoning = if day_hours.is_zero() && night_hours.is_zero() {
        "No overtime hours".to_string()
    } else {
        format!(
            "{} day hours × ${} + {} night hours × ${} = ${}",
            day_hours.normalize(),
            day_value.normalize(),
            night_hours.normalize(),
            night_value.normalize(),
            total_pay.normalize()
        )
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_premium".to_string(),
        rule_name: "Overtime Premium".to_string(),
        formula: "day_hours × hourly × day_multiplier + night_hours × hourly × day_multiplier × night_multiplier".to_string(),
        input: serde_json::json!({
            "hourly_rate": hourly_rate.normalize().to_string(),
            "day_hours": day_hours.normalize().to_string(),
            "night_hours": night_hours.normalize().to_string(),
            "day_multiplier": rates.day_multiplier.normalize().to_string(),
            "night_multiplier": rates.night_multiplier.normalize().to_string()
        }),
        output: serde_json::json!({
            "day_value": day_value.normalize().to_string(),
            "night_value": night_value.normalize().to_string(),
            "total_pay": total_pay.normalize().to_string()
        }),
        reasoning,
    };

    Ok(OvertimePremiumResult {
        breakdown,
        audit_step,
    })
}
