//! Request types for the payroll API.
//!
//! The project id comes from the path, so the bodies here carry only the run
//! parameters.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::HeadcountEntry;
use crate::error::{EngineError, EngineResult};
use crate::models::{HalfMonth, ManualInputs, WeekdayKey};
use crate::service::{BatchRequest, ContractorBatchRequest};

/// Request body for previewing, creating or replacing an employee batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRequest {
    /// The pay date.
    pub pay_date: NaiveDate,
    /// Half-month selection; defaults to the half the pay date falls in.
    #[serde(default)]
    pub half: Option<HalfMonth>,
    /// Local currency units per foreign unit.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// Operator inputs keyed by employee id.
    #[serde(default)]
    pub manual_inputs: BTreeMap<String, ManualInputs>,
}

impl PayrollRequest {
    /// Binds the body to a project.
    ///
    /// A missing exchange rate is rejected here rather than defaulted.
    pub fn into_batch_request(self, project_id: &str) -> EngineResult<BatchRequest> {
        Ok(BatchRequest {
            project_id: project_id.to_string(),
            pay_date: self.pay_date,
            half: self.half,
            exchange_rate: require_exchange_rate(self.exchange_rate)?,
            manual_inputs: self.manual_inputs,
        })
    }
}

/// Request body for creating a contractor batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorPayrollRequest {
    /// The pay date.
    pub pay_date: NaiveDate,
    /// Local currency units per foreign unit.
    #[serde(default)]
    pub exchange_rate: Option<Decimal>,
    /// A distinct rate for contractor billing.
    #[serde(default)]
    pub contractor_exchange_rate: Option<Decimal>,
}

impl ContractorPayrollRequest {
    /// Binds the body to a project.
    pub fn into_batch_request(self, project_id: &str) -> EngineResult<ContractorBatchRequest> {
        Ok(ContractorBatchRequest {
            project_id: project_id.to_string(),
            pay_date: self.pay_date,
            exchange_rate: require_exchange_rate(self.exchange_rate)?,
            contractor_exchange_rate: self.contractor_exchange_rate,
        })
    }
}

/// Request body for recording a contractor's week of headcount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorWeekRequest {
    /// Any date in the Saturday-to-Friday week being recorded.
    pub week_of: NaiveDate,
    /// Headcount per weekday; omitted days are left untouched.
    pub days: BTreeMap<WeekdayKey, HeadcountEntry>,
}

fn require_exchange_rate(rate: Option<Decimal>) -> EngineResult<Decimal> {
    rate.ok_or_else(|| EngineError::InvalidInput {
        field: "exchange_rate".to_string(),
        message: "an exchange rate is required".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_payroll_request() {
        let json = r#"{
            "pay_date": "2026-01-12",
            "exchange_rate": "36.5",
            "manual_inputs": {
                "emp_001": {
                    "day_overtime_hours": "2",
                    "advance": "10"
                }
            }
        }"#;

        let request: PayrollRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.pay_date, NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
        assert_eq!(request.half, None);
        assert_eq!(request.exchange_rate, Some(Decimal::new(365, 1)));
        assert_eq!(
            request.manual_inputs["emp_001"].day_overtime_hours,
            Decimal::from(2)
        );
    }

    #[test]
    fn test_missing_exchange_rate_is_invalid_input() {
        let request: PayrollRequest =
            serde_json::from_str(r#"{"pay_date": "2026-01-12"}"#).unwrap();
        let result = request.into_batch_request("proj_01");
        assert!(matches!(
            result,
            Err(EngineError::InvalidInput { ref field, .. }) if field == "exchange_rate"
        ));
    }

    #[test]
    fn test_explicit_half_is_kept() {
        let request: PayrollRequest = serde_json::from_str(
            r#"{"pay_date": "2026-01-30", "half": "first", "exchange_rate": "36"}"#,
        )
        .unwrap();
        let bound = request.into_batch_request("proj_01").unwrap();
        assert_eq!(bound.half, Some(HalfMonth::First));
        assert_eq!(bound.project_id, "proj_01");
    }

    #[test]
    fn test_deserialize_contractor_week() {
        let json = r#"{
            "week_of": "2026-01-12",
            "days": {
                "saturday": {"active": true, "count": 5},
                "sunday": {"active": false, "count": 0},
                "monday": {"active": true, "count": 8}
            }
        }"#;

        let request: ContractorWeekRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.days.len(), 3);
        assert_eq!(request.days[&WeekdayKey::Monday].count, 8);
        assert!(!request.days[&WeekdayKey::Sunday].active);
    }
}
