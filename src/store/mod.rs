//! Collaborator seams for the payroll engine.
//!
//! The engine reads employees, contractors and attendance, and writes payment
//! batches, through the traits in this module. [`MemoryStore`] implements all
//! of them and is what the server binary and the tests wire in.

mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AttendanceRecord, Contractor, ContractorAttendanceRecord, ContractorPaymentBatch, Employee,
    PaymentBatch,
};

pub use memory::MemoryStore;

/// The roster of a project.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Employees on a project, active or not, in roster order.
    async fn list_employees(&self, project_id: &str) -> EngineResult<Vec<Employee>>;

    /// Contractors engaged on a project, active or not.
    async fn list_contractors(&self, project_id: &str) -> EngineResult<Vec<Contractor>>;
}

/// Day-keyed employee attendance sheets.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// The sheet for one project day, if one was recorded.
    async fn get_attendance(
        &self,
        project_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendanceRecord>>;

    /// Every sheet between `from` and `to` inclusive, in date order.
    async fn get_attendance_range(
        &self,
        project_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>>;
}

/// Contractor headcount records.
#[async_trait]
pub trait ContractorAttendanceStore: Send + Sync {
    /// Every contractor's record for one project day.
    async fn get_contractor_attendance(
        &self,
        project_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ContractorAttendanceRecord>>;

    /// Every record between `from` and `to` inclusive, in date order.
    async fn get_contractor_attendance_range(
        &self,
        project_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ContractorAttendanceRecord>>;

    /// Stores a batch of records for one contractor, all or nothing,
    /// replacing any record for the same contractor and day.
    ///
    /// Implementations reject a headcount above the contractor's ceiling.
    /// Every record is checked before any is written; a rejected record
    /// leaves the stored days untouched.
    async fn record_contractor_days(
        &self,
        contractor: &Contractor,
        records: Vec<ContractorAttendanceRecord>,
    ) -> EngineResult<()>;
}

/// Persisted payment batches, one sub-ledger each for employees and
/// contractors.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Stores an employee batch; rejects a second batch for the same pay date.
    async fn create_batch(&self, batch: &PaymentBatch) -> EngineResult<()>;

    /// Removes an employee batch and returns it.
    async fn delete_batch(&self, project_id: &str, batch_id: Uuid) -> EngineResult<PaymentBatch>;

    /// Employee batches of a project, most recent pay date first.
    async fn list_batches(&self, project_id: &str) -> EngineResult<Vec<PaymentBatch>>;

    /// Stores a contractor batch; rejects a second batch for the same pay date.
    async fn create_contractor_batch(&self, batch: &ContractorPaymentBatch) -> EngineResult<()>;

    /// Removes a contractor batch and returns it.
    async fn delete_contractor_batch(
        &self,
        project_id: &str,
        batch_id: Uuid,
    ) -> EngineResult<ContractorPaymentBatch>;

    /// Contractor batches of a project, most recent pay date first.
    async fn list_contractor_batches(
        &self,
        project_id: &str,
    ) -> EngineResult<Vec<ContractorPaymentBatch>>;
}
