//! Payroll service: fetch, compute, persist.
//!
//! [`PayrollService`] validates a request, pulls the roster, attendance and
//! existing batches concurrently, hands them to the pure calculation pipeline
//! and persists the result through the [`PaymentStore`].
//!
//! Preparing and persisting are separate steps. A prepared batch is only
//! borrowed by the persist call, so a failed save can be retried with the same
//! batch.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::calculation::{
    HeadcountEntry, HeadcountGrid, PaymentRun, PreparedBatch, PreparedContractorBatch,
    assemble_batch, assemble_contractor_batch, contractor_pay_window, half_month_window,
    validate_exchange_rate, week_start, weekly_pay_window,
};
use crate::config::PayrollConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    ContractorAttendanceRecord, ContractorPaymentBatch, HalfMonth, Ledger, ManualInputs,
    PaymentBatch, WeekdayKey,
};
use crate::store::{AttendanceStore, ContractorAttendanceStore, EmployeeDirectory, PaymentStore};

/// Parameters for an employee pay run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// The project to pay.
    pub project_id: String,
    /// The pay date.
    pub pay_date: NaiveDate,
    /// Half-month selection; defaults to the half the pay date falls in.
    pub half: Option<HalfMonth>,
    /// Local currency units per foreign unit.
    pub exchange_rate: Decimal,
    /// Operator inputs keyed by employee id.
    pub manual_inputs: BTreeMap<String, ManualInputs>,
}

impl BatchRequest {
    /// The half the run uses.
    pub fn effective_half(&self) -> HalfMonth {
        self.half.unwrap_or_else(|| HalfMonth::of(self.pay_date))
    }
}

/// Parameters for a contractor billing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorBatchRequest {
    /// The project to bill.
    pub project_id: String,
    /// The pay date; the window is the Saturday on or before it through it.
    pub pay_date: NaiveDate,
    /// Local currency units per foreign unit for the project's payroll.
    pub exchange_rate: Decimal,
    /// A distinct rate for contractor billing, when one applies.
    pub contractor_exchange_rate: Option<Decimal>,
}

impl ContractorBatchRequest {
    /// The rate contractor lines convert at.
    pub fn effective_exchange_rate(&self) -> Decimal {
        self.contractor_exchange_rate.unwrap_or(self.exchange_rate)
    }
}

/// Orchestrates payroll runs over the store seams.
#[derive(Clone)]
pub struct PayrollService {
    config: Arc<PayrollConfig>,
    directory: Arc<dyn EmployeeDirectory>,
    attendance: Arc<dyn AttendanceStore>,
    contractor_attendance: Arc<dyn ContractorAttendanceStore>,
    payments: Arc<dyn PaymentStore>,
}

impl PayrollService {
    /// Creates a service over the given configuration and stores.
    pub fn new(
        config: PayrollConfig,
        directory: Arc<dyn EmployeeDirectory>,
        attendance: Arc<dyn AttendanceStore>,
        contractor_attendance: Arc<dyn ContractorAttendanceStore>,
        payments: Arc<dyn PaymentStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            directory,
            attendance,
            contractor_attendance,
            payments,
        }
    }

    /// Returns the payroll configuration in force.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Computes an employee batch without persisting it.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any fetch.
    /// [`EngineError::DuplicatePayDate`] is returned when the project already
    /// has an employee batch for the pay date.
    pub async fn prepare_batch(&self, request: &BatchRequest) -> EngineResult<PreparedBatch> {
        self.prepare(request, None).await
    }

    /// Stores a prepared employee batch.
    ///
    /// On failure the batch is left with the caller for a retry.
    pub async fn persist_batch(&self, prepared: &PreparedBatch) -> EngineResult<()> {
        let batch = &prepared.batch;
        match self.payments.create_batch(batch).await {
            Ok(()) => {
                info!(
                    project = %batch.project_id,
                    pay_date = %batch.pay_date,
                    batch_id = %batch.id,
                    lines = batch.lines.len(),
                    "Persisted payment batch"
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    project = %batch.project_id,
                    pay_date = %batch.pay_date,
                    error = %err,
                    "Failed to persist payment batch"
                );
                Err(err)
            }
        }
    }

    /// Computes and persists an employee batch.
    pub async fn create_batch(&self, request: &BatchRequest) -> EngineResult<PreparedBatch> {
        let prepared = self.prepare_batch(request).await?;
        self.persist_batch(&prepared).await?;
        Ok(prepared)
    }

    /// Replaces a persisted batch with a recomputation: the old batch is
    /// deleted and a new one created.
    ///
    /// The new batch is computed before anything is deleted, so a failed
    /// computation leaves the old batch in place. A failed save is handled by
    /// [`PayrollService::commit_replacement`].
    pub async fn replace_batch(
        &self,
        batch_id: Uuid,
        request: &BatchRequest,
    ) -> EngineResult<PreparedBatch> {
        let prepared = self.prepare(request, Some(batch_id)).await?;
        self.commit_replacement(batch_id, &prepared).await?;
        Ok(prepared)
    }

    /// Swaps a persisted batch for an already-prepared one.
    ///
    /// When the new batch cannot be saved, the old batch is put back and
    /// [`EngineError::ReplaceFailed`] hands the prepared batch back, so the
    /// same call can be retried without recomputing.
    pub async fn commit_replacement(
        &self,
        batch_id: Uuid,
        prepared: &PreparedBatch,
    ) -> EngineResult<()> {
        let project_id = &prepared.batch.project_id;
        let removed = self.payments.delete_batch(project_id, batch_id).await?;
        info!(
            project = %project_id,
            replaced = %batch_id,
            "Deleted payment batch for replacement"
        );

        let err = match self.persist_batch(prepared).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        let restored = match self.payments.create_batch(&removed).await {
            Ok(()) => {
                warn!(
                    project = %project_id,
                    batch_id = %batch_id,
                    "Restored payment batch after failed replacement"
                );
                true
            }
            Err(restore_err) => {
                error!(
                    project = %project_id,
                    batch_id = %batch_id,
                    pay_date = %removed.pay_date,
                    error = %restore_err,
                    "Failed to restore payment batch after failed replacement"
                );
                false
            }
        };

        Err(EngineError::ReplaceFailed {
            batch_id,
            restored,
            prepared: Box::new(prepared.clone()),
            source: Box::new(err),
        })
    }

    /// Employee batches of a project, most recent pay date first.
    pub async fn list_batches(&self, project_id: &str) -> EngineResult<Vec<PaymentBatch>> {
        self.payments.list_batches(project_id).await
    }

    /// Deletes an employee batch.
    pub async fn delete_batch(&self, project_id: &str, batch_id: Uuid) -> EngineResult<PaymentBatch> {
        let removed = self.payments.delete_batch(project_id, batch_id).await?;
        info!(
            project = %project_id,
            batch_id = %batch_id,
            pay_date = %removed.pay_date,
            "Deleted payment batch"
        );
        Ok(removed)
    }

    async fn prepare(
        &self,
        request: &BatchRequest,
        replacing: Option<Uuid>,
    ) -> EngineResult<PreparedBatch> {
        validate_exchange_rate(request.exchange_rate)?;
        let half = request.effective_half();

        // One range covers both the weekly and the half-month windows
        let weekly = weekly_pay_window(request.pay_date);
        let half_window = half_month_window(request.pay_date, half);
        let from = weekly.start_date.min(half_window.start_date);
        let to = weekly.end_date.max(half_window.end_date);

        let (employees, attendance, existing) = tokio::try_join!(
            self.directory.list_employees(&request.project_id),
            self.attendance
                .get_attendance_range(&request.project_id, from, to),
            self.payments.list_batches(&request.project_id),
        )?;

        if existing
            .iter()
            .any(|b| b.pay_date == request.pay_date && Some(b.id) != replacing)
        {
            return Err(EngineError::DuplicatePayDate {
                ledger: Ledger::Employee,
                project_id: request.project_id.clone(),
                pay_date: request.pay_date,
            });
        }
        if let Some(batch_id) = replacing {
            if !existing.iter().any(|b| b.id == batch_id) {
                return Err(EngineError::BatchNotFound { batch_id });
            }
        }

        debug!(
            project = %request.project_id,
            pay_date = %request.pay_date,
            employees = employees.len(),
            attendance_days = attendance.len(),
            "Fetched payroll inputs"
        );

        let run = PaymentRun {
            project_id: &request.project_id,
            pay_date: request.pay_date,
            half,
            exchange_rate: request.exchange_rate,
            config: &self.config,
        };
        let prepared = assemble_batch(&employees, &attendance, &request.manual_inputs, &run)?;

        for warning in &prepared.audit_trace.warnings {
            debug!(
                project = %request.project_id,
                code = %warning.code,
                message = %warning.message,
                "Payroll warning"
            );
        }
        info!(
            project = %request.project_id,
            pay_date = %request.pay_date,
            half = half.as_str(),
            lines = prepared.batch.lines.len(),
            warnings = prepared.audit_trace.warnings.len(),
            duration_us = prepared.audit_trace.duration_us,
            "Prepared payment batch"
        );
        Ok(prepared)
    }

    /// Computes a contractor batch without persisting it.
    pub async fn prepare_contractor_batch(
        &self,
        request: &ContractorBatchRequest,
    ) -> EngineResult<PreparedContractorBatch> {
        let exchange_rate = validate_exchange_rate(request.effective_exchange_rate())?;
        let window = contractor_pay_window(request.pay_date);

        let (contractors, records, existing) = tokio::try_join!(
            self.directory.list_contractors(&request.project_id),
            self.contractor_attendance.get_contractor_attendance_range(
                &request.project_id,
                window.start_date,
                window.end_date,
            ),
            self.payments.list_contractor_batches(&request.project_id),
        )?;

        if existing.iter().any(|b| b.pay_date == request.pay_date) {
            return Err(EngineError::DuplicatePayDate {
                ledger: Ledger::Contractor,
                project_id: request.project_id.clone(),
                pay_date: request.pay_date,
            });
        }

        let prepared = assemble_contractor_batch(
            &request.project_id,
            request.pay_date,
            &contractors,
            &records,
            exchange_rate,
        )?;
        info!(
            project = %request.project_id,
            pay_date = %request.pay_date,
            lines = prepared.batch.lines.len(),
            total_foreign = %prepared.batch.total_foreign,
            "Prepared contractor payment batch"
        );
        Ok(prepared)
    }

    /// Stores a prepared contractor batch.
    pub async fn persist_contractor_batch(
        &self,
        prepared: &PreparedContractorBatch,
    ) -> EngineResult<()> {
        let batch = &prepared.batch;
        if let Err(err) = self.payments.create_contractor_batch(batch).await {
            warn!(
                project = %batch.project_id,
                pay_date = %batch.pay_date,
                error = %err,
                "Failed to persist contractor payment batch"
            );
            return Err(err);
        }
        info!(
            project = %batch.project_id,
            pay_date = %batch.pay_date,
            batch_id = %batch.id,
            "Persisted contractor payment batch"
        );
        Ok(())
    }

    /// Computes and persists a contractor batch.
    pub async fn create_contractor_batch(
        &self,
        request: &ContractorBatchRequest,
    ) -> EngineResult<PreparedContractorBatch> {
        let prepared = self.prepare_contractor_batch(request).await?;
        self.persist_contractor_batch(&prepared).await?;
        Ok(prepared)
    }

    /// Contractor batches of a project, most recent pay date first.
    pub async fn list_contractor_batches(
        &self,
        project_id: &str,
    ) -> EngineResult<Vec<ContractorPaymentBatch>> {
        self.payments.list_contractor_batches(project_id).await
    }

    /// Deletes a contractor batch.
    pub async fn delete_contractor_batch(
        &self,
        project_id: &str,
        batch_id: Uuid,
    ) -> EngineResult<ContractorPaymentBatch> {
        self.payments
            .delete_contractor_batch(project_id, batch_id)
            .await
    }

    /// Records one contractor's headcount grid for the week containing
    /// `week_of`.
    ///
    /// Every cell is checked against the contractor's ceiling before anything
    /// is written; one bad cell rejects the whole grid. The week is stored in
    /// a single write.
    pub async fn record_contractor_week(
        &self,
        project_id: &str,
        contractor_id: &str,
        week_of: NaiveDate,
        days: &BTreeMap<WeekdayKey, HeadcountEntry>,
    ) -> EngineResult<Vec<ContractorAttendanceRecord>> {
        let contractors = self.directory.list_contractors(project_id).await?;
        let contractor = contractors
            .iter()
            .find(|c| c.id == contractor_id)
            .ok_or_else(|| EngineError::ContractorNotFound {
                contractor_id: contractor_id.to_string(),
            })?;

        let mut grid = HeadcountGrid::new(std::slice::from_ref(contractor));
        for (weekday, entry) in days {
            grid.set(contractor_id, *weekday, *entry)?;
        }

        let records = grid.to_records(project_id, week_of);
        self.contractor_attendance
            .record_contractor_days(contractor, records.clone())
            .await?;

        info!(
            project = %project_id,
            contractor_id = %contractor_id,
            week_start = %week_start(week_of),
            days = records.len(),
            "Recorded contractor headcount"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AttendanceRecord, Contractor, ContractorStatus, DirectSalary, Employee,
        EmployeeAttendance, EmployeeStatus, LegalBases, PayFrequency, PayrollType, SalaryType,
    };
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Luis Mora".to_string(),
            national_id: "V-87654321".to_string(),
            position: "Welder".to_string(),
            payroll_type: PayrollType::DirectSalary,
            direct_salary: Some(DirectSalary {
                salary_type: SalaryType::Daily,
                amount: dec("40"),
            }),
            pay_frequency: PayFrequency::Weekly,
            legal_base_amount: Decimal::ZERO,
            company_bonus_amount: Decimal::ZERO,
            income_tax_withholding_percentage: Decimal::ZERO,
            legal_bases: LegalBases::default(),
            bank_account: None,
            status: EmployeeStatus::Active,
        }
    }

    fn contractor() -> Contractor {
        Contractor {
            id: "ctr_01".to_string(),
            name: "Masonry crew".to_string(),
            trade: "masonry".to_string(),
            daily_rate: dec("50"),
            max_personnel: 10,
            status: ContractorStatus::Active,
        }
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.upsert_employee("proj_01", employee()).await;
        store.upsert_contractor("proj_01", contractor()).await;
        for day in 12..=16 {
            let mut record = AttendanceRecord::new("proj_01", date(2026, 1, day));
            record.entries.insert(
                "emp_001".to_string(),
                EmployeeAttendance {
                    present: true,
                    hours_worked: dec("8"),
                    notes: None,
                },
            );
            store.put_attendance(record).await.unwrap();
        }
        store
    }

    fn service_over(store: Arc<MemoryStore>) -> PayrollService {
        PayrollService::new(
            PayrollConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    fn request(pay_date: NaiveDate) -> BatchRequest {
        BatchRequest {
            project_id: "proj_01".to_string(),
            pay_date,
            half: None,
            exchange_rate: dec("36"),
            manual_inputs: BTreeMap::new(),
        }
    }

    /// A payment store whose writes always fail.
    struct UnavailablePayments;

    #[async_trait]
    impl PaymentStore for UnavailablePayments {
        async fn create_batch(&self, _batch: &PaymentBatch) -> EngineResult<()> {
            Err(EngineError::StorageError {
                message: "connection reset".to_string(),
            })
        }

        async fn delete_batch(&self, _project_id: &str, batch_id: Uuid) -> EngineResult<PaymentBatch> {
            Err(EngineError::BatchNotFound { batch_id })
        }

        async fn list_batches(&self, _project_id: &str) -> EngineResult<Vec<PaymentBatch>> {
            Ok(Vec::new())
        }

        async fn create_contractor_batch(&self, _batch: &ContractorPaymentBatch) -> EngineResult<()> {
            Err(EngineError::StorageError {
                message: "connection reset".to_string(),
            })
        }

        async fn delete_contractor_batch(
            &self,
            _project_id: &str,
            batch_id: Uuid,
        ) -> EngineResult<ContractorPaymentBatch> {
            Err(EngineError::BatchNotFound { batch_id })
        }

        async fn list_contractor_batches(
            &self,
            _project_id: &str,
        ) -> EngineResult<Vec<ContractorPaymentBatch>> {
            Ok(Vec::new())
        }
    }

    /// A payment store over [`MemoryStore`] whose next `failures` employee
    /// batch creates fail; deletes and reads always succeed.
    struct SaveFailingPayments {
        inner: Arc<MemoryStore>,
        failures: AtomicU32,
    }

    impl SaveFailingPayments {
        fn new(inner: Arc<MemoryStore>, failures: u32) -> Self {
            Self {
                inner,
                failures: AtomicU32::new(failures),
            }
        }
    }

    #[async_trait]
    impl PaymentStore for SaveFailingPayments {
        async fn create_batch(&self, batch: &PaymentBatch) -> EngineResult<()> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(EngineError::StorageError {
                    message: "write timed out".to_string(),
                });
            }
            self.inner.create_batch(batch).await
        }

        async fn delete_batch(&self, project_id: &str, batch_id: Uuid) -> EngineResult<PaymentBatch> {
            self.inner.delete_batch(project_id, batch_id).await
        }

        async fn list_batches(&self, project_id: &str) -> EngineResult<Vec<PaymentBatch>> {
            self.inner.list_batches(project_id).await
        }

        async fn create_contractor_batch(&self, batch: &ContractorPaymentBatch) -> EngineResult<()> {
            self.inner.create_contractor_batch(batch).await
        }

        async fn delete_contractor_batch(
            &self,
            project_id: &str,
            batch_id: Uuid,
        ) -> EngineResult<ContractorPaymentBatch> {
            self.inner.delete_contractor_batch(project_id, batch_id).await
        }

        async fn list_contractor_batches(
            &self,
            project_id: &str,
        ) -> EngineResult<Vec<ContractorPaymentBatch>> {
            self.inner.list_contractor_batches(project_id).await
        }
    }

    fn service_with_failing_saves(store: Arc<MemoryStore>, failures: u32) -> PayrollService {
        PayrollService::new(
            PayrollConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(SaveFailingPayments::new(store, failures)),
        )
    }

    fn with_advance(pay_date: NaiveDate, advance: &str) -> BatchRequest {
        let mut edited = request(pay_date);
        edited.manual_inputs.insert(
            "emp_001".to_string(),
            ManualInputs {
                advance: dec(advance),
                ..ManualInputs::default()
            },
        );
        edited
    }

    #[tokio::test]
    async fn test_create_then_duplicate_rejected() {
        let service = service_over(seeded_store().await);

        let prepared = service.create_batch(&request(date(2026, 1, 16))).await.unwrap();
        assert_eq!(prepared.batch.lines[0].subtotal_foreign, dec("200"));

        let duplicate = service.create_batch(&request(date(2026, 1, 16))).await;
        assert!(matches!(
            duplicate,
            Err(EngineError::DuplicatePayDate {
                ledger: Ledger::Employee,
                ..
            })
        ));
        assert_eq!(service.list_batches("proj_01").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_exchange_rate_persists_nothing() {
        let service = service_over(seeded_store().await);
        let mut zero_rate = request(date(2026, 1, 16));
        zero_rate.exchange_rate = Decimal::ZERO;

        let result = service.create_batch(&zero_rate).await;
        assert!(matches!(result, Err(EngineError::InvalidExchangeRate { .. })));
        assert!(service.list_batches("proj_01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_prepared_batch_for_retry() {
        let store = seeded_store().await;
        let failing = PayrollService::new(
            PayrollConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(UnavailablePayments),
        );

        let prepared = failing.prepare_batch(&request(date(2026, 1, 16))).await.unwrap();
        let result = failing.persist_batch(&prepared).await;
        assert!(matches!(result, Err(EngineError::StorageError { .. })));

        // Retry the very same batch against a healthy store
        let healthy = service_over(store);
        healthy.persist_batch(&prepared).await.unwrap();
        let stored = healthy.list_batches("proj_01").await.unwrap();
        assert_eq!(stored[0].id, prepared.batch.id);
    }

    #[tokio::test]
    async fn test_replace_batch_recomputes_with_new_inputs() {
        let service = service_over(seeded_store().await);
        let original = service.create_batch(&request(date(2026, 1, 16))).await.unwrap();

        let edited = with_advance(date(2026, 1, 16), "20");
        let replacement = service
            .replace_batch(original.batch.id, &edited)
            .await
            .unwrap();

        let stored = service.list_batches("proj_01").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, replacement.batch.id);
        assert_eq!(stored[0].lines[0].subtotal_foreign, dec("180"));
        assert_eq!(stored[0].lines[0].final_take_home, dec("200"));
    }

    #[tokio::test]
    async fn test_failed_replacement_restores_original_and_can_be_retried() {
        let store = seeded_store().await;
        let original = service_over(store.clone())
            .create_batch(&request(date(2026, 1, 16)))
            .await
            .unwrap();

        let flaky = service_with_failing_saves(store.clone(), 1);
        let result = flaky
            .replace_batch(original.batch.id, &with_advance(date(2026, 1, 16), "20"))
            .await;

        let prepared = match result {
            Err(EngineError::ReplaceFailed {
                batch_id,
                restored,
                prepared,
                source,
            }) => {
                assert_eq!(batch_id, original.batch.id);
                assert!(restored);
                assert!(matches!(*source, EngineError::StorageError { .. }));
                prepared
            }
            other => panic!("Expected ReplaceFailed, got {:?}", other),
        };

        let stored = flaky.list_batches("proj_01").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, original.batch.id);
        assert_eq!(stored[0].lines[0].subtotal_foreign, dec("200"));

        // Same prepared batch, no recomputation
        flaky
            .commit_replacement(original.batch.id, &prepared)
            .await
            .unwrap();
        let stored = flaky.list_batches("proj_01").await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, prepared.batch.id);
        assert_eq!(stored[0].lines[0].subtotal_foreign, dec("180"));
    }

    #[tokio::test]
    async fn test_failed_replacement_without_restore_hands_back_batch() {
        let store = seeded_store().await;
        let original = service_over(store.clone())
            .create_batch(&request(date(2026, 1, 16)))
            .await
            .unwrap();

        let flaky = service_with_failing_saves(store.clone(), 2);
        let result = flaky
            .replace_batch(original.batch.id, &with_advance(date(2026, 1, 16), "20"))
            .await;

        let prepared = match result {
            Err(EngineError::ReplaceFailed {
                restored, prepared, ..
            }) => {
                assert!(!restored);
                prepared
            }
            other => panic!("Expected ReplaceFailed, got {:?}", other),
        };
        assert!(flaky.list_batches("proj_01").await.unwrap().is_empty());

        flaky.persist_batch(&prepared).await.unwrap();
        let stored = flaky.list_batches("proj_01").await.unwrap();
        assert_eq!(stored[0].id, prepared.batch.id);
    }

    #[tokio::test]
    async fn test_replace_unknown_batch_is_not_found() {
        let service = service_over(seeded_store().await);
        let missing = Uuid::new_v4();
        let result = service.replace_batch(missing, &request(date(2026, 1, 16))).await;
        assert!(matches!(result, Err(EngineError::BatchNotFound { batch_id }) if batch_id == missing));
    }

    #[tokio::test]
    async fn test_employee_and_contractor_saves_are_independent() {
        let store = seeded_store().await;
        let service = service_over(store.clone());

        let mut days = BTreeMap::new();
        days.insert(WeekdayKey::Monday, HeadcountEntry { active: true, count: 4 });
        service
            .record_contractor_week("proj_01", "ctr_01", date(2026, 1, 12), &days)
            .await
            .unwrap();

        let failing = PayrollService::new(
            PayrollConfig::default(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(UnavailablePayments),
        );
        assert!(failing.create_batch(&request(date(2026, 1, 16))).await.is_err());

        let contractor_request = ContractorBatchRequest {
            project_id: "proj_01".to_string(),
            pay_date: date(2026, 1, 16),
            exchange_rate: dec("36"),
            contractor_exchange_rate: None,
        };
        let prepared = service
            .create_contractor_batch(&contractor_request)
            .await
            .unwrap();
        assert_eq!(prepared.batch.total_foreign, dec("200"));
        assert_eq!(prepared.batch.total_local, dec("7200"));
        assert!(service.list_batches("proj_01").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_week_rejects_whole_grid_above_ceiling() {
        let store = seeded_store().await;
        let service = service_over(store.clone());

        let mut days = BTreeMap::new();
        days.insert(WeekdayKey::Saturday, HeadcountEntry { active: true, count: 5 });
        days.insert(WeekdayKey::Monday, HeadcountEntry { active: true, count: 12 });
        let result = service
            .record_contractor_week("proj_01", "ctr_01", date(2026, 1, 12), &days)
            .await;

        assert!(matches!(
            result,
            Err(EngineError::HeadcountExceedsCeiling { requested: 12, max_personnel: 10, .. })
        ));
        let stored = store
            .get_contractor_attendance_range("proj_01", date(2026, 1, 10), date(2026, 1, 16))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_record_week_unknown_contractor() {
        let service = service_over(seeded_store().await);
        let result = service
            .record_contractor_week("proj_01", "ctr_99", date(2026, 1, 12), &BTreeMap::new())
            .await;
        assert!(matches!(result, Err(EngineError::ContractorNotFound { .. })));
    }

    #[test]
    fn test_contractor_rate_defaults_to_payroll_rate() {
        let mut req = ContractorBatchRequest {
            project_id: "proj_01".to_string(),
            pay_date: date(2026, 1, 16),
            exchange_rate: dec("36"),
            contractor_exchange_rate: None,
        };
        assert_eq!(req.effective_exchange_rate(), dec("36"));
        req.contractor_exchange_rate = Some(dec("37.5"));
        assert_eq!(req.effective_exchange_rate(), dec("37.5"));
    }

    #[test]
    fn test_effective_half_defaults_to_pay_date() {
        let mut req = request(date(2026, 1, 16));
        assert_eq!(req.effective_half(), HalfMonth::Second);
        req.half = Some(HalfMonth::First);
        assert_eq!(req.effective_half(), HalfMonth::First);
    }
}
