//! Calculation logic for the payroll engine.
//!
//! This module contains the pure computation pipeline: calendar facts,
//! attendance aggregation, daily rate resolution, overtime premiums, legal
//! deductions, payment line and batch assembly, and contractor headcount
//! billing. Nothing here performs I/O.

mod assembler;
mod attendance;
mod calendar;
mod contractor;
mod daily_rate;
mod legal_deductions;
mod overtime;

pub use assembler::{
    PaymentLineResult, PaymentRun, PreparedBatch, assemble_batch, assemble_payment_line,
    validate_exchange_rate, validate_manual_inputs,
};
pub use attendance::{
    AttendanceResult, DaysToPayResult, aggregate_attendance, half_month_window,
    resolve_days_to_pay, weekly_pay_window,
};
pub use calendar::{
    CalendarFacts, business_days_in_month, calendar_days_in_month, days_in_half,
    monday_of_week, mondays_in_half, mondays_in_month, reference_date,
};
pub use contractor::{
    ContractorHeadcountResult, HeadcountEntry, HeadcountGrid, PreparedContractorBatch,
    aggregate_contractor_headcount, assemble_contractor_batch, contractor_pay_window,
    week_start,
};
pub use daily_rate::{DailyRateResult, resolve_daily_rate};
pub use legal_deductions::{LegalDeductionResult, calculate_legal_deductions};
pub use overtime::{OvertimePremiumResult, calculate_overtime_premium};
