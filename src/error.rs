//! Error types for the payroll engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while computing or persisting
//! payment batches.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::calculation::PreparedBatch;
use crate::models::Ledger;

/// The main error type for the payroll engine.
///
/// Validation variants are raised before any computation starts; nothing is
/// persisted when one of them is returned.
///
/// # Example
///
/// ```
/// use payroll_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// The exchange rate was missing, zero or negative.
    #[error("Exchange rate must be greater than zero, got {rate}")]
    InvalidExchangeRate {
        /// The rejected rate.
        rate: Decimal,
    },

    /// A request field was missing or out of range.
    #[error("Invalid input '{field}': {message}")]
    InvalidInput {
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// An employee record was inconsistent with its payroll type.
    #[error("Invalid employee '{employee_id}': {message}")]
    InvalidEmployee {
        /// The employee id.
        employee_id: String,
        /// A description of what made the record invalid.
        message: String,
    },

    /// No employee had days or overtime to pay.
    #[error("No eligible employees to pay for project '{project_id}' on {pay_date}")]
    NoEligibleEmployees {
        /// The project.
        project_id: String,
        /// The pay date.
        pay_date: NaiveDate,
    },

    /// No contractor had billable headcount in the window.
    #[error("No billable contractor headcount for project '{project_id}' on {pay_date}")]
    NoBillableContractors {
        /// The project.
        project_id: String,
        /// The pay date.
        pay_date: NaiveDate,
    },

    /// A batch already exists for the pay date in the named sub-ledger.
    #[error("A {ledger} payment batch already exists for project '{project_id}' on {pay_date}")]
    DuplicatePayDate {
        /// Which sub-ledger holds the existing batch.
        ledger: Ledger,
        /// The project.
        project_id: String,
        /// The pay date.
        pay_date: NaiveDate,
    },

    /// A headcount above the contractor's ceiling was submitted.
    #[error(
        "Headcount {requested} exceeds max personnel {max_personnel} for contractor '{contractor_id}'"
    )]
    HeadcountExceedsCeiling {
        /// The contractor.
        contractor_id: String,
        /// The rejected headcount.
        requested: u32,
        /// The contractor's ceiling.
        max_personnel: u32,
    },

    /// The contractor is not registered on the project.
    #[error("Contractor not found: {contractor_id}")]
    ContractorNotFound {
        /// The contractor id.
        contractor_id: String,
    },

    /// The batch does not exist.
    #[error("Payment batch not found: {batch_id}")]
    BatchNotFound {
        /// The batch id.
        batch_id: Uuid,
    },

    /// Saving the replacement batch failed.
    ///
    /// The prepared batch is handed back for a retry. `restored` reports
    /// whether the original batch was put back.
    #[error("Replacing payment batch {batch_id} failed: {source}")]
    ReplaceFailed {
        /// The batch being replaced.
        batch_id: Uuid,
        /// Whether the original batch is stored again.
        restored: bool,
        /// The computed replacement.
        prepared: Box<PreparedBatch>,
        /// The save error.
        source: Box<EngineError>,
    },

    /// A collaborator store failed.
    #[error("Storage error: {message}")]
    StorageError {
        /// A description of the failure.
        message: String,
    },

    /// A general calculation error occurred.
    #[error("Calculation error: {message}")]
    CalculationError {
        /// A description of the calculation error.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors raised before computation from bad input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::InvalidExchangeRate { .. }
                | EngineError::InvalidInput { .. }
                | EngineError::InvalidEmployee { .. }
                | EngineError::NoEligibleEmployees { .. }
                | EngineError::NoBillableContractors { .. }
                | EngineError::HeadcountExceedsCeiling { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
