//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod employee;
mod pay_period;
mod payment;

pub use attendance::{
    AttendanceRecord, Contractor, ContractorAttendanceRecord, ContractorStatus,
    EmployeeAttendance,
};
pub use audit::{AuditStep, AuditTrace, AuditWarning};
pub use employee::{
    DirectSalary, Employee, EmployeeStatus, LegalBases, PayFrequency, PayrollType, SalaryType,
};
pub use pay_period::{HalfMonth, PayWindow, WeekdayKey};
pub use payment::{
    BatchTotals, ContractorPaymentBatch, ContractorPaymentLine, ContractorSnapshot, DaysOverride,
    EmployeeSnapshot, Ledger, LegalDeductionBreakdown, ManualInputs, OvertimeBreakdown,
    PRESENTATION_DECIMAL_PLACES, PaymentBatch, PaymentLine, round_money,
};
