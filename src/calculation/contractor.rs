//! Contractor headcount billing.
//!
//! Contractors are billed per headcount-day: one worker present for one day.
//! The billing window rolls from the Saturday on or before the pay date
//! through the pay date itself. Contractors carry no legal deductions.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AuditStep, AuditTrace, AuditWarning, Contractor, ContractorAttendanceRecord,
    ContractorPaymentBatch, ContractorPaymentLine, ContractorSnapshot, PayWindow, WeekdayKey,
};

use super::assembler::{checked, validate_exchange_rate};

/// Returns the Saturday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(WeekdayKey::of(date).offset_from_saturday()))
}

/// Returns the contractor billing window: Saturday through the pay date.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::contractor_pay_window;
/// use chrono::NaiveDate;
///
/// // 2026-01-12 is a Monday
/// let window = contractor_pay_window(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap());
/// assert_eq!(window.start_date, NaiveDate::from_ymd_opt(2026, 1, 10).unwrap());
/// assert_eq!(window.len_days(), 3);
/// ```
pub fn contractor_pay_window(pay_date: NaiveDate) -> PayWindow {
    PayWindow::new(week_start(pay_date), pay_date)
}

/// One cell of a headcount grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadcountEntry {
    /// Whether the crew worked that day.
    pub active: bool,
    /// Workers present.
    pub count: u32,
}

/// Per-contractor, per-weekday headcount toggles for one pay week.
///
/// Every write is checked against the contractor's ceiling; a rejected write
/// leaves the grid unchanged.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{HeadcountEntry, HeadcountGrid};
/// use payroll_engine::models::{Contractor, ContractorStatus, WeekdayKey};
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
/// let mut grid = HeadcountGrid::new(&[contractor]);
///
/// assert!(grid.set("ctr_01", WeekdayKey::Monday, HeadcountEntry { active: true, count: 8 }).is_ok());
/// assert!(grid.set("ctr_01", WeekdayKey::Tuesday, HeadcountEntry { active: true, count: 12 }).is_err());
/// assert_eq!(grid.get("ctr_01", WeekdayKey::Tuesday), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadcountGrid {
    ceilings: BTreeMap<String, u32>,
    entries: BTreeMap<(String, WeekdayKey), HeadcountEntry>,
}

impl HeadcountGrid {
    /// Creates an empty grid for the given contractors.
    pub fn new(contractors: &[Contractor]) -> Self {
        Self {
            ceilings: contractors
                .iter()
                .map(|c| (c.id.clone(), c.max_personnel))
                .collect(),
            entries: BTreeMap::new(),
        }
    }

    /// Sets one cell.
    ///
    /// # Errors
    ///
    /// [`EngineError::ContractorNotFound`] for a contractor not in the grid,
    /// [`EngineError::HeadcountExceedsCeiling`] for a count above the
    /// contractor's max personnel.
    pub fn set(
        &mut self,
        contractor_id: &str,
        weekday: WeekdayKey,
        entry: HeadcountEntry,
    ) -> EngineResult<()> {
        let max_personnel = *self.ceilings.get(contractor_id).ok_or_else(|| {
            EngineError::ContractorNotFound {
                contractor_id: contractor_id.to_string(),
            }
        })?;

        if entry.count > max_personnel {
            return Err(EngineError::HeadcountExceedsCeiling {
                contractor_id: contractor_id.to_string(),
                requested: entry.count,
                max_personnel,
            });
        }

        self.entries
            .insert((contractor_id.to_string(), weekday), entry);
        Ok(())
    }

    /// Returns one cell, if set.
    pub fn get(&self, contractor_id: &str, weekday: WeekdayKey) -> Option<HeadcountEntry> {
        self.entries
            .get(&(contractor_id.to_string(), weekday))
            .copied()
    }

    /// Converts the grid into dated attendance records for the week starting
    /// on the Saturday on or before `week_of`.
    pub fn to_records(
        &self,
        project_id: &str,
        week_of: NaiveDate,
    ) -> Vec<ContractorAttendanceRecord> {
        let saturday = week_start(week_of);
        self.entries
            .iter()
            .map(|((contractor_id, weekday), entry)| ContractorAttendanceRecord {
                project_id: project_id.to_string(),
                contractor_id: contractor_id.clone(),
                date: saturday + Duration::days(i64::from(weekday.offset_from_saturday())),
                attended: entry.active,
                headcount_present: entry.count,
                notes: None,
            })
            .collect()
    }
}

/// The result of aggregating one contractor's headcount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractorHeadcountResult {
    /// Billable headcount per weekday.
    pub headcount_by_weekday: BTreeMap<WeekdayKey, u32>,
    /// Sum of billable headcount.
    pub total_headcount_days: u32,
    /// The audit step documenting the aggregation.
    pub audit_step: AuditStep,
}

/// Sums a contractor's billable headcount over a window.
///
/// Only days marked attended count. Records for other contractors or outside
/// the window are ignored.
pub fn aggregate_contractor_headcount(
    contractor: &Contractor,
    records: &[ContractorAttendanceRecord],
    window: PayWindow,
    step_number: u32,
) -> ContractorHeadcountResult {
    let mut headcount_by_weekday = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.contractor_id == contractor.id && window.contains_date(r.date))
    {
        *headcount_by_weekday
            .entry(WeekdayKey::of(record.date))
            .or_insert(0) += record.billable_headcount();
    }
    let total_headcount_days: u32 = headcount_by_weekday.values().sum();

    let audit_step = AuditStep {
        step_number,
        rule_id: "contractor_headcount".to_string(),
        rule_name: "Contractor Headcount Aggregation".to_string(),
        formula: "sum(headcount_present where attended)".to_string(),
        input: serde_json::json!({
            "contractor_id": contractor.id,
            "window_start": window.start_date.to_string(),
            "window_end": window.end_date.to_string()
        }),
        output: serde_json::json!({
            "headcount_by_weekday": headcount_by_weekday,
            "total_headcount_days": total_headcount_days
        }),
        reasoning: format!(
            "{} headcount-days for contractor '{}' from {} to {}",
            total_headcount_days, contractor.id, window.start_date, window.end_date
        ),
    };

    ContractorHeadcountResult {
        headcount_by_weekday,
        total_headcount_days,
        audit_step,
    }
}

/// A computed contractor batch that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedContractorBatch {
    /// The batch as it will be stored.
    pub batch: ContractorPaymentBatch,
    /// Steps and warnings for every line.
    pub audit_trace: AuditTrace,
}

/// Assembles the contractor payment batch for a pay date.
///
/// `payment_foreign = daily_rate × total_headcount_days` and
/// `payment_local = payment_foreign × exchange_rate`. Inactive contractors and
/// contractors with no billable headcount are skipped.
///
/// # Errors
///
/// [`EngineError::InvalidExchangeRate`] for a non-positive rate,
/// [`EngineError::NoBillableContractors`] when no line remains and
/// [`EngineError::CalculationError`] when a payment overflows.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::assemble_contractor_batch;
/// use payroll_engine::models::{Contractor, ContractorAttendanceRecord, ContractorStatus};
/// use chrono::NaiveDate;
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
/// let monday = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
/// let record = ContractorAttendanceRecord::new("proj_01", &contractor, monday, true, 8).unwrap();
///
/// let prepared = assemble_contractor_batch(
///     "proj_01", monday, &[contractor], &[record], Decimal::from(36),
/// ).unwrap();
/// assert_eq!(prepared.batch.total_foreign, Decimal::from(400));
/// ```
pub fn assemble_contractor_batch(
    project_id: &str,
    pay_date: NaiveDate,
    contractors: &[Contractor],
    records: &[ContractorAttendanceRecord],
    exchange_rate: Decimal,
) -> EngineResult<PreparedContractorBatch> {
    let start_time = Instant::now();
    let exchange_rate = validate_exchange_rate(exchange_rate)?;
    let window = contractor_pay_window(pay_date);

    let mut lines = Vec::new();
    let mut steps = Vec::new();
    let mut warnings = Vec::new();
    let mut step_number: u32 = 1;

    for contractor in contractors.iter().filter(|c| c.is_active()) {
        contractor.validate()?;
        let headcount = aggregate_contractor_headcount(contractor, records, window, step_number);
        if headcount.total_headcount_days == 0 {
            warnings.push(AuditWarning::new(
                "NO_HEADCOUNT",
                format!(
                    "Contractor '{}' has no billable headcount from {} to {} and was skipped",
                    contractor.id, window.start_date, window.end_date
                ),
                "low",
            ));
            continue;
        }
        steps.push(headcount.audit_step);
        step_number += 1;

        let payment_foreign = checked(
            contractor
                .daily_rate
                .checked_mul(Decimal::from(headcount.total_headcount_days)),
            "contractor payment",
            &contractor.id,
        )?;
        let payment_local = checked(
            payment_foreign.checked_mul(exchange_rate),
            "contractor local payment",
            &contractor.id,
        )?;

        steps.push(AuditStep {
            step_number,
            rule_id: "contractor_billing".to_string(),
            rule_name: "Contractor Billing".to_string(),
            formula: "payment_foreign = daily_rate × headcount_days; payment_local = payment_foreign × fx".to_string(),
            input: serde_json::json!({
                "contractor_id": contractor.id,
                "daily_rate": contractor.daily_rate.normalize().to_string(),
                "total_headcount_days": headcount.total_headcount_days,
                "exchange_rate": exchange_rate.normalize().to_string()
            }),
            output: serde_json::json!({
                "payment_foreign": payment_foreign.normalize().to_string(),
                "payment_local": payment_local.normalize().to_string()
            }),
            reasoning: format!(
                "{} headcount-days × ${} = ${}",
                headcount.total_headcount_days,
                contractor.daily_rate.normalize(),
                payment_foreign.normalize()
            ),
        });
        step_number += 1;

        lines.push(ContractorPaymentLine {
            contractor: ContractorSnapshot::from(contractor),
            headcount_by_weekday: headcount.headcount_by_weekday,
            total_headcount_days: headcount.total_headcount_days,
            daily_rate: contractor.daily_rate,
            payment_foreign,
            payment_local,
        });
    }

    if lines.is_empty() {
        return Err(EngineError::NoBillableContractors {
            project_id: project_id.to_string(),
            pay_date,
        });
    }

    let total_foreign = checked(
        lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.payment_foreign)),
        "contractor batch total",
        project_id,
    )?;
    let total_local = checked(
        lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.payment_local)),
        "contractor batch local total",
        project_id,
    )?;
    let duration_us = start_time.elapsed().as_micros() as u64;

    Ok(PreparedContractorBatch {
        batch: ContractorPaymentBatch {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            pay_date,
            window,
            exchange_rate,
            lines,
            total_foreign,
            total_local,
            created_at: Utc::now(),
        },
        audit_trace: AuditTrace {
            steps,
            warnings,
            duration_us,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContractorStatus;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn contractor(id: &str, daily_rate: &str, max_personnel: u32) -> Contractor {
        Contractor {
            id: id.to_string(),
            name: format!("Crew {}", id),
            trade: "masonry".to_string(),
            daily_rate: dec(daily_rate),
            max_personnel,
            status: ContractorStatus::Active,
        }
    }

    fn record(c: &Contractor, d: NaiveDate, attended: bool, count: u32) -> ContractorAttendanceRecord {
        ContractorAttendanceRecord::new("proj_01", c, d, attended, count).unwrap()
    }

    /// CT-001: Window runs Saturday through the pay date
    #[test]
    fn test_window_for_each_pay_day() {
        // Saturday 2026-01-10 to Friday 2026-01-16
        for day in 10..=16 {
            let window = contractor_pay_window(date(2026, 1, day));
            assert_eq!(window.start_date, date(2026, 1, 10));
            assert_eq!(window.end_date, date(2026, 1, day));
        }
    }

    /// CT-002: Scenario B, Saturday 5, Sunday 0, Monday 8 at $50
    #[test]
    fn test_scenario_b() {
        let crew = contractor("ctr_01", "50", 10);
        let records = vec![
            record(&crew, date(2026, 1, 10), true, 5),
            record(&crew, date(2026, 1, 11), false, 0),
            record(&crew, date(2026, 1, 12), true, 8),
        ];

        let prepared =
            assemble_contractor_batch("proj_01", date(2026, 1, 12), &[crew], &records, dec("36"))
                .unwrap();
        let line = &prepared.batch.lines[0];

        assert_eq!(line.total_headcount_days, 13);
        assert_eq!(line.payment_foreign, dec("650"));
        assert_eq!(line.payment_local, dec("23400"));
        assert_eq!(line.headcount_by_weekday[&WeekdayKey::Saturday], 5);
        assert_eq!(line.headcount_by_weekday[&WeekdayKey::Sunday], 0);
        assert_eq!(prepared.batch.total_foreign, dec("650"));
    }

    /// CT-003: Unattended days do not bill even with a headcount
    #[test]
    fn test_unattended_days_are_not_billed() {
        let crew = contractor("ctr_01", "50", 10);
        let mut off_day = record(&crew, date(2026, 1, 11), true, 4);
        off_day.attended = false;

        let result = aggregate_contractor_headcount(
            &crew,
            &[off_day, record(&crew, date(2026, 1, 12), true, 3)],
            contractor_pay_window(date(2026, 1, 12)),
            1,
        );
        assert_eq!(result.total_headcount_days, 3);
    }

    /// CT-004: Days after the pay date are outside the window
    #[test]
    fn test_days_after_pay_date_ignored() {
        let crew = contractor("ctr_01", "50", 10);
        let records = vec![
            record(&crew, date(2026, 1, 12), true, 2),
            record(&crew, date(2026, 1, 13), true, 9),
            record(&crew, date(2026, 1, 9), true, 9),
        ];

        let result = aggregate_contractor_headcount(
            &crew,
            &records,
            contractor_pay_window(date(2026, 1, 12)),
            1,
        );
        assert_eq!(result.total_headcount_days, 2);
    }

    /// CT-005: Headcount above the ceiling is rejected, not clamped
    #[test]
    fn test_grid_rejects_headcount_above_ceiling() {
        let crew = contractor("ctr_01", "50", 10);
        let mut grid = HeadcountGrid::new(&[crew]);
        grid.set(
            "ctr_01",
            WeekdayKey::Monday,
            HeadcountEntry {
                active: true,
                count: 6,
            },
        )
        .unwrap();

        let result = grid.set(
            "ctr_01",
            WeekdayKey::Monday,
            HeadcountEntry {
                active: true,
                count: 12,
            },
        );

        assert!(matches!(
            result,
            Err(EngineError::HeadcountExceedsCeiling {
                requested: 12,
                max_personnel: 10,
                ..
            })
        ));
        assert_eq!(
            grid.get("ctr_01", WeekdayKey::Monday),
            Some(HeadcountEntry {
                active: true,
                count: 6
            })
        );
    }

    #[test]
    fn test_grid_rejects_unknown_contractor() {
        let mut grid = HeadcountGrid::new(&[contractor("ctr_01", "50", 10)]);
        let result = grid.set("ctr_99", WeekdayKey::Friday, HeadcountEntry::default());
        assert!(matches!(result, Err(EngineError::ContractorNotFound { .. })));
    }

    #[test]
    fn test_grid_to_records_dates_from_saturday() {
        let mut grid = HeadcountGrid::new(&[contractor("ctr_01", "50", 10)]);
        grid.set(
            "ctr_01",
            WeekdayKey::Saturday,
            HeadcountEntry {
                active: true,
                count: 5,
            },
        )
        .unwrap();
        grid.set(
            "ctr_01",
            WeekdayKey::Friday,
            HeadcountEntry {
                active: false,
                count: 0,
            },
        )
        .unwrap();

        // Any day of the week anchors to Saturday 2026-01-10
        let records = grid.to_records("proj_01", date(2026, 1, 14));
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2026, 1, 10), date(2026, 1, 16)]);
        assert_eq!(records[0].headcount_present, 5);
        assert!(!records[1].attended);
    }

    #[test]
    fn test_inactive_and_idle_contractors_skipped() {
        let idle = contractor("ctr_02", "40", 5);
        let inactive = Contractor {
            status: ContractorStatus::Inactive,
            ..contractor("ctr_03", "40", 5)
        };
        let busy = contractor("ctr_01", "50", 10);
        let records = vec![
            record(&busy, date(2026, 1, 12), true, 2),
            record(&inactive, date(2026, 1, 12), true, 5),
        ];

        let prepared = assemble_contractor_batch(
            "proj_01",
            date(2026, 1, 12),
            &[busy, idle, inactive],
            &records,
            dec("36"),
        )
        .unwrap();

        assert_eq!(prepared.batch.lines.len(), 1);
        assert_eq!(prepared.batch.lines[0].contractor.id, "ctr_01");
        assert_eq!(prepared.audit_trace.warnings[0].code, "NO_HEADCOUNT");
    }

    #[test]
    fn test_no_billable_contractors() {
        let result = assemble_contractor_batch(
            "proj_01",
            date(2026, 1, 12),
            &[contractor("ctr_01", "50", 10)],
            &[],
            dec("36"),
        );
        assert!(matches!(result, Err(EngineError::NoBillableContractors { .. })));
    }

    #[test]
    fn test_negative_rate_contractor_rejected() {
        let crew = contractor("ctr_01", "50", 10);
        let records = [record(&crew, date(2026, 1, 12), true, 4)];
        let repriced = Contractor {
            daily_rate: dec("-50"),
            ..crew
        };

        let result =
            assemble_contractor_batch("proj_01", date(2026, 1, 12), &[repriced], &records, dec("36"));
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn test_overflowing_payment_is_calculation_error() {
        let crew = contractor("ctr_01", "79228162514264337593543950335", 10);
        let records = [record(&crew, date(2026, 1, 12), true, 2)];

        let result =
            assemble_contractor_batch("proj_01", date(2026, 1, 12), &[crew], &records, dec("36"));
        assert!(matches!(result, Err(EngineError::CalculationError { .. })));
    }

    #[test]
    fn test_zero_exchange_rate_rejected() {
        let result = assemble_contractor_batch(
            "proj_01",
            date(2026, 1, 12),
            &[contractor("ctr_01", "50", 10)],
            &[],
            Decimal::ZERO,
        );
        assert!(matches!(result, Err(EngineError::InvalidExchangeRate { .. })));
    }
}
