//! Shared test utilities for userpool-domains
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection and unique resource names for live tests
//! - [`fixtures`]: Service descriptions and templates written to temp files

pub mod aws;
pub mod fixtures;

// Re-export commonly used items
pub use aws::{get_test_region, test_pool_name, test_run_id};
pub use fixtures::{service_file, template_file};
