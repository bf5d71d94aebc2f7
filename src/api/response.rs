//! Response types for the payroll API.
//!
//! This module defines the batch response bodies, the error response
//! structures, and the mapping from engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::calculation::{PreparedBatch, PreparedContractorBatch};
use crate::error::EngineError;
use crate::models::{AuditTrace, ContractorPaymentBatch, PaymentBatch, round_money};

/// An employee batch as shown to the operator, with its audit trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Whether the batch was stored.
    pub persisted: bool,
    /// The batch, amounts rounded to cents.
    pub batch: PaymentBatch,
    /// Every calculation step and warning behind the batch.
    pub audit_trace: AuditTrace,
}

impl BatchResponse {
    /// Builds the presentation view of a prepared batch.
    pub fn from_prepared(prepared: PreparedBatch, persisted: bool) -> Self {
        let PreparedBatch {
            mut batch,
            audit_trace,
        } = prepared;
        batch.lines = batch.lines.iter().map(|l| l.for_presentation()).collect();
        batch.totals = batch.totals.for_presentation();
        Self {
            persisted,
            batch,
            audit_trace,
        }
    }
}

/// A contractor batch with its audit trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorBatchResponse {
    /// Whether the batch was stored.
    pub persisted: bool,
    /// The batch, amounts rounded to cents.
    pub batch: ContractorPaymentBatch,
    /// Every calculation step and warning behind the batch.
    pub audit_trace: AuditTrace,
}

impl ContractorBatchResponse {
    /// Builds the presentation view of a prepared contractor batch.
    pub fn from_prepared(prepared: PreparedContractorBatch, persisted: bool) -> Self {
        let PreparedContractorBatch {
            mut batch,
            audit_trace,
        } = prepared;
        for line in &mut batch.lines {
            line.payment_foreign = round_money(line.payment_foreign);
            line.payment_local = round_money(line.payment_local);
        }
        batch.total_foreign = round_money(batch.total_foreign);
        batch.total_local = round_money(batch.total_local);
        Self {
            persisted,
            batch,
            audit_trace,
        }
    }
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    fn new(status: StatusCode, error: ApiError) -> Self {
        Self { status, error }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ApiErrorResponse::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::with_details("CONFIG_ERROR", "Configuration error", message),
                )
            }
            EngineError::InvalidExchangeRate { .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details(
                    "INVALID_EXCHANGE_RATE",
                    message,
                    "Enter an exchange rate greater than zero before computing payroll",
                ),
            ),
            EngineError::InvalidInput { field, .. } => ApiErrorResponse::new(
                StatusCode::BAD_REQUEST,
                ApiError::with_details("VALIDATION_ERROR", message, field),
            ),
            EngineError::InvalidEmployee { employee_id, .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details(
                    "INVALID_EMPLOYEE",
                    message,
                    format!("Fix the payroll terms of employee '{}'", employee_id),
                ),
            ),
            EngineError::NoEligibleEmployees { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("NO_ELIGIBLE_EMPLOYEES", message),
            ),
            EngineError::NoBillableContractors { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("NO_BILLABLE_CONTRACTORS", message),
            ),
            EngineError::DuplicatePayDate { .. } => ApiErrorResponse::new(
                StatusCode::CONFLICT,
                ApiError::with_details(
                    "DUPLICATE_PAY_DATE",
                    message,
                    "Delete or replace the existing batch to pay this date again",
                ),
            ),
            EngineError::HeadcountExceedsCeiling { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new("HEADCOUNT_EXCEEDS_CEILING", message),
            ),
            EngineError::ContractorNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("CONTRACTOR_NOT_FOUND", message),
            ),
            EngineError::BatchNotFound { .. } => ApiErrorResponse::new(
                StatusCode::NOT_FOUND,
                ApiError::new("BATCH_NOT_FOUND", message),
            ),
            EngineError::StorageError { .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "STORAGE_ERROR",
                    "The batch could not be saved",
                    message,
                ),
            ),
            EngineError::ReplaceFailed { restored, .. } => ApiErrorResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "REPLACE_FAILED",
                    if restored {
                        "The replacement could not be saved; the original batch was kept"
                    } else {
                        "The replacement could not be saved and the original batch could not be restored"
                    },
                    message,
                ),
            ),
            EngineError::CalculationError { .. } => ApiErrorResponse::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::with_details("CALCULATION_ERROR", "Calculation failed", message),
            ),
        }
    }
}
