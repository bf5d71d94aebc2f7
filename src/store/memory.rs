//! In-memory implementation of every store trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, Contractor, ContractorAttendanceRecord, ContractorPaymentBatch, Employee,
    Ledger, PaymentBatch,
};

use super::{AttendanceStore, ContractorAttendanceStore, EmployeeDirectory, PaymentStore};

type ContractorDayKey = (String, String, NaiveDate);

/// A process-local store backed by `tokio` read-write locks.
///
/// Pay-date uniqueness is enforced under the write lock, so two concurrent
/// creates for the same pay date cannot both succeed.
///
/// # Example
///
/// ```
/// use payroll_engine::store::{MemoryStore, PaymentStore};
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::new();
/// assert!(store.list_batches("proj_01").await.unwrap().is_empty());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    employees: RwLock<BTreeMap<String, Vec<Employee>>>,
    contractors: RwLock<BTreeMap<String, Vec<Contractor>>>,
    attendance: RwLock<BTreeMap<(String, NaiveDate), AttendanceRecord>>,
    contractor_attendance: RwLock<BTreeMap<ContractorDayKey, ContractorAttendanceRecord>>,
    batches: RwLock<Vec<PaymentBatch>>,
    contractor_batches: RwLock<Vec<ContractorPaymentBatch>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an employee to a project roster, replacing one with the same id.
    pub async fn upsert_employee(&self, project_id: &str, employee: Employee) {
        let mut employees = self.employees.write().await;
        let roster = employees.entry(project_id.to_string()).or_default();
        match roster.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => *existing = employee,
            None => roster.push(employee),
        }
    }

    /// Engages a contractor on a project, replacing one with the same id.
    pub async fn upsert_contractor(&self, project_id: &str, contractor: Contractor) {
        let mut contractors = self.contractors.write().await;
        let crews = contractors.entry(project_id.to_string()).or_default();
        match crews.iter_mut().find(|c| c.id == contractor.id) {
            Some(existing) => *existing = contractor,
            None => crews.push(contractor),
        }
    }

    /// Stores an attendance sheet, replacing the sheet for the same day.
    ///
    /// A sheet with negative hours is rejected.
    pub async fn put_attendance(&self, record: AttendanceRecord) -> EngineResult<()> {
        record.validate()?;
        self.attendance
            .write()
            .await
            .insert((record.project_id.clone(), record.date), record);
        Ok(())
    }
}

fn check_contractor_record(
    contractor: &Contractor,
    record: &ContractorAttendanceRecord,
) -> EngineResult<()> {
    if record.contractor_id != contractor.id {
        return Err(EngineError::InvalidInput {
            field: "contractor_id".to_string(),
            message: format!(
                "record is for '{}' but contractor is '{}'",
                record.contractor_id, contractor.id
            ),
        });
    }
    contractor.validate()?;
    contractor.check_headcount(record.headcount_present)
}

fn contractor_day_key(record: &ContractorAttendanceRecord) -> ContractorDayKey {
    (
        record.project_id.clone(),
        record.contractor_id.clone(),
        record.date,
    )
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn list_employees(&self, project_id: &str) -> EngineResult<Vec<Employee>> {
        Ok(self
            .employees
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_contractors(&self, project_id: &str) -> EngineResult<Vec<Contractor>> {
        Ok(self
            .contractors
            .read()
            .await
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn get_attendance(
        &self,
        project_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Option<AttendanceRecord>> {
        Ok(self
            .attendance
            .read()
            .await
            .get(&(project_id.to_string(), date))
            .cloned())
    }

    async fn get_attendance_range(
        &self,
        project_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        if to < from {
            return Ok(Vec::new());
        }
        let project = project_id.to_string();
        Ok(self
            .attendance
            .read()
            .await
            .range((project.clone(), from)..=(project, to))
            .map(|(_, record)| record.clone())
            .collect())
    }
}

#[async_trait]
impl ContractorAttendanceStore for MemoryStore {
    async fn get_contractor_attendance(
        &self,
        project_id: &str,
        date: NaiveDate,
    ) -> EngineResult<Vec<ContractorAttendanceRecord>> {
        self.get_contractor_attendance_range(project_id, date, date)
            .await
    }

    async fn get_contractor_attendance_range(
        &self,
        project_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> EngineResult<Vec<ContractorAttendanceRecord>> {
        let mut records: Vec<ContractorAttendanceRecord> = self
            .contractor_attendance
            .read()
            .await
            .values()
            .filter(|r| r.project_id == project_id && r.date >= from && r.date <= to)
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.contractor_id.cmp(&b.contractor_id))
        });
        Ok(records)
    }

    async fn record_contractor_days(
        &self,
        contractor: &Contractor,
        records: Vec<ContractorAttendanceRecord>,
    ) -> EngineResult<()> {
        for record in &records {
            check_contractor_record(contractor, record)?;
        }

        let mut stored = self.contractor_attendance.write().await;
        for record in records {
            stored.insert(contractor_day_key(&record), record);
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn create_batch(&self, batch: &PaymentBatch) -> EngineResult<()> {
        let mut batches = self.batches.write().await;
        if batches
            .iter()
            .any(|b| b.project_id == batch.project_id && b.pay_date == batch.pay_date)
        {
            return Err(EngineError::DuplicatePayDate {
                ledger: Ledger::Employee,
                project_id: batch.project_id.clone(),
                pay_date: batch.pay_date,
            });
        }
        batches.push(batch.clone());
        Ok(())
    }

    async fn delete_batch(&self, project_id: &str, batch_id: Uuid) -> EngineResult<PaymentBatch> {
        let mut batches = self.batches.write().await;
        let position = batches
            .iter()
            .position(|b| b.project_id == project_id && b.id == batch_id)
            .ok_or(EngineError::BatchNotFound { batch_id })?;
        Ok(batches.remove(position))
    }

    async fn list_batches(&self, project_id: &str) -> EngineResult<Vec<PaymentBatch>> {
        let mut batches: Vec<PaymentBatch> = self
            .batches
            .read()
            .await
            .iter()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect();
        batches.sort_by(|a, b| b.pay_date.cmp(&a.pay_date));
        Ok(batches)
    }

    async fn create_contractor_batch(&self, batch: &ContractorPaymentBatch) -> EngineResult<()> {
        let mut batches = self.contractor_batches.write().await;
        if batches
            .iter()
            .any(|b| b.project_id == batch.project_id && b.pay_date == batch.pay_date)
        {
            return Err(EngineError::DuplicatePayDate {
                ledger: Ledger::Contractor,
                project_id: batch.project_id.clone(),
                pay_date: batch.pay_date,
            });
        }
        batches.push(batch.clone());
        Ok(())
    }

    async fn delete_contractor_batch(
        &self,
        project_id: &str,
        batch_id: Uuid,
    ) -> EngineResult<ContractorPaymentBatch> {
        let mut batches = self.contractor_batches.write().await;
        let position = batches
            .iter()
            .position(|b| b.project_id == project_id && b.id == batch_id)
            .ok_or(EngineError::BatchNotFound { batch_id })?;
        Ok(batches.remove(position))
    }

    async fn list_contractor_batches(
        &self,
        project_id: &str,
    ) -> EngineResult<Vec<ContractorPaymentBatch>> {
        let mut batches: Vec<ContractorPaymentBatch> = self
            .contractor_batches
            .read()
            .await
            .iter()
            .filter(|b| b.project_id == project_id)
            .cloned()
            .collect();
        batches.sort_by(|a, b| b.pay_date.cmp(&a.pay_date));
        Ok(batches)
    }
}
