//! Attendance models for employees and contractors.
//!
//! Employee attendance is recorded once per (project, date) with an entry per
//! employee. Contractor attendance is recorded once per (project, contractor,
//! date) as a headcount.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One employee's attendance on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAttendance {
    /// Whether the employee was present.
    pub present: bool,
    /// Hours worked on the day.
    #[serde(default)]
    pub hours_worked: Decimal,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// The attendance sheet for a project on one date.
///
/// # Example
///
/// ```
/// use payroll_engine::models::{AttendanceRecord, EmployeeAttendance};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut record = AttendanceRecord::new("proj_01", NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
/// record.entries.insert(
///     "emp_001".to_string(),
///     EmployeeAttendance { present: true, hours_worked: Decimal::from(8), notes: None },
/// );
///
/// assert_eq!(record.is_present("emp_001"), Some(true));
/// assert_eq!(record.is_present("emp_999"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The project the sheet belongs to.
    pub project_id: String,
    /// The day the sheet covers.
    pub date: NaiveDate,
    /// Attendance keyed by employee id.
    #[serde(default)]
    pub entries: BTreeMap<String, EmployeeAttendance>,
}

impl AttendanceRecord {
    /// Creates an empty attendance sheet.
    pub fn new(project_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            project_id: project_id.into(),
            date,
            entries: BTreeMap::new(),
        }
    }

    /// Returns the recorded presence flag for an employee, if any.
    pub fn is_present(&self, employee_id: &str) -> Option<bool> {
        self.entries.get(employee_id).map(|e| e.present)
    }

    /// Rejects a sheet with negative hours for any employee.
    pub fn validate(&self) -> EngineResult<()> {
        let negative = self.entries.iter().find(|(_, entry)| {
            entry.hours_worked.is_sign_negative() && !entry.hours_worked.is_zero()
        });
        match negative {
            Some((employee_id, entry)) => Err(EngineError::InvalidInput {
                field: format!("attendance.{}.{}.hours_worked", self.date, employee_id),
                message: format!("must not be negative, got {}", entry.hours_worked),
            }),
            None => Ok(()),
        }
    }
}

/// Whether a contractor is currently engaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractorStatus {
    /// Engaged and billable.
    #[default]
    Active,
    /// No longer engaged.
    Inactive,
}

/// An external contractor supplying workers to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contractor {
    /// Unique identifier for the contractor.
    pub id: String,
    /// Company or crew name.
    pub name: String,
    /// Trade supplied (e.g. "masonry").
    #[serde(default)]
    pub trade: String,
    /// Rate billed per worker per day, in foreign currency.
    pub daily_rate: Decimal,
    /// Maximum number of workers the contractor may place on site.
    pub max_personnel: u32,
    /// Active or inactive.
    #[serde(default)]
    pub status: ContractorStatus,
}

impl Contractor {
    /// Returns true if the contractor is billable.
    pub fn is_active(&self) -> bool {
        self.status == ContractorStatus::Active
    }

    /// Rejects a negative daily rate.
    pub fn validate(&self) -> EngineResult<()> {
        if self.daily_rate.is_sign_negative() && !self.daily_rate.is_zero() {
            return Err(EngineError::InvalidInput {
                field: format!("contractors.{}.daily_rate", self.id),
                message: format!("must not be negative, got {}", self.daily_rate),
            });
        }
        Ok(())
    }

    /// Rejects a headcount above the contractor's ceiling.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::{Contractor, ContractorStatus};
    /// use rust_decimal::Decimal;
    ///
    /// let contractor = Contractor {
    ///     id: "ctr_01".to_string(),
    ///     name: "Masonry crew".to_string(),
    ///     trade: "masonry".to_string(),
    ///     daily_rate: Decimal::from(50),
    ///     max_personnel: 10,
    ///     status: ContractorStatus::Active,
    /// };
    ///
    /// assert!(contractor.check_headcount(10).is_ok());
    /// assert!(contractor.check_headcount(12).is_err());
    /// ```
    pub fn check_headcount(&self, headcount: u32) -> EngineResult<()> {
        if headcount > self.max_personnel {
            return Err(EngineError::HeadcountExceedsCeiling {
                contractor_id: self.id.clone(),
                requested: headcount,
                max_personnel: self.max_personnel,
            });
        }
        Ok(())
    }
}

/// A contractor's headcount on one project day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorAttendanceRecord {
    /// The project the record belongs to.
    pub project_id: String,
    /// The contractor the record is for.
    pub contractor_id: String,
    /// The day the record covers.
    pub date: NaiveDate,
    /// Whether the contractor's crew worked that day.
    pub attended: bool,
    /// Number of workers present.
    pub headcount_present: u32,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl ContractorAttendanceRecord {
    /// Builds a record, rejecting a headcount above the contractor's ceiling.
    pub fn new(
        project_id: impl Into<String>,
        contractor: &Contractor,
        date: NaiveDate,
        attended: bool,
        headcount_present: u32,
    ) -> EngineResult<Self> {
        contractor.validate()?;
        contractor.check_headcount(headcount_present)?;
        Ok(Self {
            project_id: project_id.into(),
            contractor_id: contractor.id.clone(),
            date,
            attended,
            headcount_present,
            notes: None,
        })
    }

    /// Headcount-days this record contributes to billing.
    pub fn billable_headcount(&self) -> u32 {
        if self.attended {
            self.headcount_present
        } else {
            0
        }
    }
}
