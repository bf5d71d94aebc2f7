//! Configuration loading and management for the payroll engine.
//!
//! This module provides functionality to load the payroll policy from YAML
//! files: policy metadata, working-time rules, statutory deduction rates and
//! overtime multipliers.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded policy: {}", config.config().metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{
    ContributionRate, DeductionRates, IncomeTaxConfig, OvertimeRates, PayrollConfig,
    PolicyFile, PolicyMetadata, WorkRules,
};
