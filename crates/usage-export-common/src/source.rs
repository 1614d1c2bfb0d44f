//! Collaborator contracts consumed by the collector and sink.
//!
//! The AWS-backed implementations live in the collector crate; the test-utils
//! crate provides in-memory fakes.

use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};

use crate::carbon::{CarbonQuery, CarbonReport};
use crate::catalog::MetricSpec;
use crate::defaults::METRIC_WINDOW_HOURS;
use crate::error::AwsError;
use crate::record::Datapoint;
use crate::request::{AccountId, ResourceId, Target};
use crate::resource_kind::ResourceKind;

/// Closed time range for a metric query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `hours` ending at `end`
    pub fn trailing(end: DateTime<Utc>, hours: i64) -> Self {
        Self {
            start: end - Duration::hours(hours),
            end,
        }
    }

    /// The default trailing window ending now
    pub fn last_day() -> Self {
        Self::trailing(Utc::now(), METRIC_WINDOW_HOURS)
    }
}

/// Lists resource identifiers of one kind in one account/region.
pub trait ResourceEnumerator: Send + Sync {
    /// Return at most `limit` identifiers. Implementations stop paginating
    /// as soon as `limit` identifiers have been seen.
    fn list_resources(
        &self,
        target: &Target,
        kind: ResourceKind,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ResourceId>, AwsError>> + Send;
}

/// Lists the regions enabled for an account, for `regions = all` requests.
pub trait RegionLister: Send + Sync {
    fn enabled_regions(
        &self,
        account: &AccountId,
    ) -> impl Future<Output = Result<Vec<String>, AwsError>> + Send;
}

/// Retrieves metric datapoints for a single resource.
pub trait MetricFetcher: Send + Sync {
    fn fetch_datapoints(
        &self,
        target: &Target,
        kind: ResourceKind,
        resource: &ResourceId,
        spec: &MetricSpec,
        window: TimeWindow,
    ) -> impl Future<Output = Result<Vec<Datapoint>, AwsError>> + Send;
}

/// Uploads a local file to object storage.
pub trait ObjectStore: Send + Sync {
    fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
    ) -> impl Future<Output = Result<(), AwsError>> + Send;
}

/// Produces a carbon footprint report for the signed-in account.
///
/// The billing console endpoint behind this is private and unstable, so no
/// implementation ships with this crate.
pub trait CarbonFootprintSource: Send + Sync {
    fn fetch_report(
        &self,
        query: &CarbonQuery,
    ) -> impl Future<Output = anyhow::Result<CarbonReport>> + Send;
}
