//! AWS test utilities
//!
//! Provides region and account detection for AWS integration tests.

use usage_export_common::AccountId;

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to ca-central-1
///
/// # Example
///
/// ```
/// use usage_export_test_utils::aws::get_test_region;
///
/// let region = get_test_region();
/// assert!(!region.is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "ca-central-1".to_string())
}

/// Account to run integration tests against, from `USAGE_EXPORT_TEST_ACCOUNT`.
///
/// Returns `None` when unset or malformed so tests can fall back to the
/// caller identity.
pub fn get_test_account() -> Option<AccountId> {
    std::env::var("USAGE_EXPORT_TEST_ACCOUNT")
        .ok()
        .and_then(|s| AccountId::parse(&s).ok())
}
