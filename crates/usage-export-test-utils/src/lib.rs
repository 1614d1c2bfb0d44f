//! Shared test utilities for usage-export
//!
//! This crate provides in-memory collaborators and fixtures that can be used
//! across test modules without circular dependencies.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection for integration tests
//! - [`fakes`]: In-memory enumerator, fetcher, object store and carbon source
//! - [`fixtures`]: Builders for accounts, targets, datapoints and reports

pub mod aws;
pub mod fakes;
pub mod fixtures;

// Re-export commonly used items
pub use aws::{get_test_account, get_test_region};
pub use fakes::{
    FakeCarbonSource, FakeEnumerator, FakeFetcher, FakeObjectStore, FetchCall, Upload,
};
pub use fixtures::{account, datapoint, fixed_time, sample_carbon_report, target};
