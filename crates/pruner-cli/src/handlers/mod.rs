//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod init;
pub mod providers;
pub mod run;

// Re-export handlers for convenient access
pub use init::{build_settings, execute_init, parse_answer, write_settings};
pub use providers::{execute_providers, render_providers};
pub use run::{coverage_warning, describe_plan, execute_run, exit_description, plan_headline, report_summary};
