//! HTTP API module for the payroll engine.
//!
//! This module provides the REST endpoints for previewing, creating,
//! replacing, listing and deleting payment batches, and for recording
//! contractor headcount.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ContractorPayrollRequest, ContractorWeekRequest, PayrollRequest};
pub use response::{ApiError, ApiErrorResponse, BatchResponse, ContractorBatchResponse};
pub use state::AppState;
