//! Payroll and legal-deduction engine for project-cost management
//!
//! This crate computes per-project payment batches for employees and
//! contractors: attendance-driven day counts, daily rates, overtime premiums,
//! statutory deductions and exchange-rate conversion, each step recorded in an
//! audit trace.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
