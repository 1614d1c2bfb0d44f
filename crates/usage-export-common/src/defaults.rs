//! Default configuration values shared between the CLI and Lambda entry points
//!
//! These constants ensure consistent defaults across all usage-export components.

/// Maximum number of resource identifiers collected per run.
///
/// Bounds the number of CloudWatch calls a single collection can make. This is
/// a policy constant, not a platform limit.
pub const RESOURCE_CAP: usize = 60;

/// Default number of collection units in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;

/// Trailing window for metric queries, in hours
pub const METRIC_WINDOW_HOURS: i64 = 24;

/// Default CloudWatch period in seconds
pub const DEFAULT_PERIOD_SECONDS: i32 = 300;

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "ca-central-1";

/// Role assumed in member accounts
pub const DEFAULT_ASSUME_ROLE_NAME: &str = "OrganizationAccountAccessRole";

/// Service name under which all metric exports are filed
pub const METRIC_SERVICE_NAME: &str = "cloudwatch";

/// Service name for carbon footprint exports
pub const CARBON_SERVICE_NAME: &str = "cost";

/// Object storage partition for carbon footprint exports
pub const CARBON_PARTITION: &str = "misc";
