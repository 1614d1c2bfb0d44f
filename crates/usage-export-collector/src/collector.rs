//! Bounded parallel collection across accounts, regions and resources
//!
//! Collection runs in two phases. Enumeration fans out one unit per
//! (account, region) target; fetching fans out one unit per enumerated
//! resource. Both phases run at most `max_concurrency` units at once and
//! gather results in completion order. A failing unit is logged and recorded
//! but never aborts its siblings.
//!
//! The resource cap is applied twice: each enumeration unit stops paginating
//! at the cap, then the merged identifiers are sorted on
//! (account, region, id) and truncated to the cap before any fetch starts.

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};
use usage_export_common::defaults::{DEFAULT_MAX_CONCURRENCY, RESOURCE_CAP};
use usage_export_common::record::metric_prefix_columns;
use usage_export_common::{
    AwsError, CollectionRequest, MetricFetcher, MetricRecord, RecordPrefix, ResourceEnumerator,
    ResourceId, ResourceKind, Row, ScopedResource, Table, Target, TimeWindow,
};

/// Fan-out limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Units in flight at once, per phase
    pub max_concurrency: usize,
    /// Maximum identifiers collected per run
    pub resource_cap: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            resource_cap: RESOURCE_CAP,
        }
    }
}

/// A unit that failed, with enough context to report it
#[derive(Debug, Clone, PartialEq)]
pub struct UnitFailure {
    pub target: Target,
    /// `None` for enumeration units
    pub resource: Option<ResourceId>,
    pub error: AwsError,
}

/// Result of one fetch unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    Fetched(MetricRecord),
    Failed(UnitFailure),
}

/// Merged, capped enumeration result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enumeration {
    /// Sorted on (account, region, id), at most the resource cap
    pub resources: Vec<ScopedResource>,
    pub failures: Vec<UnitFailure>,
    pub units: usize,
}

/// Overall status of a collection or job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every unit succeeded and produced data
    Complete,
    /// Some units failed, at least one succeeded
    Partial,
    /// Nothing failed, but there was nothing to collect
    Empty,
    /// Every attempted unit failed
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Partial => "partial",
            RunStatus::Empty => "empty",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_failed(self) -> bool {
        self == RunStatus::Failed
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a collection produced
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub resource_kind: ResourceKind,
    /// Sorted on (account, region, resource id)
    pub records: Vec<MetricRecord>,
    pub enumeration_failures: Vec<UnitFailure>,
    pub fetch_failures: Vec<UnitFailure>,
    pub enumeration_units: usize,
    pub fetch_units: usize,
}

impl CollectionReport {
    pub fn units_attempted(&self) -> usize {
        self.enumeration_units + self.fetch_units
    }

    pub fn failures(&self) -> usize {
        self.enumeration_failures.len() + self.fetch_failures.len()
    }

    pub fn status(&self) -> RunStatus {
        let attempted = self.units_attempted();
        let failures = self.failures();
        if attempted > 0 && failures == attempted {
            RunStatus::Failed
        } else if failures > 0 {
            RunStatus::Partial
        } else if self.records.iter().all(|r| r.datapoints.is_empty()) {
            RunStatus::Empty
        } else {
            RunStatus::Complete
        }
    }

    pub fn rows(&self) -> Vec<Row> {
        self.records.iter().flat_map(MetricRecord::rows).collect()
    }

    /// Rectangular table with the metric prefix columns first
    pub fn table(&self) -> Table {
        Table::build(&metric_prefix_columns(self.resource_kind), &self.rows())
    }
}

/// Drives an enumerator and a fetcher over a [`CollectionRequest`]
#[derive(Debug, Clone)]
pub struct Collector<E, F> {
    enumerator: E,
    fetcher: F,
    config: CollectorConfig,
}

impl<E, F> Collector<E, F>
where
    E: ResourceEnumerator,
    F: MetricFetcher,
{
    pub fn new(enumerator: E, fetcher: F, config: CollectorConfig) -> Self {
        Self {
            enumerator,
            fetcher,
            config,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn enumerator(&self) -> &E {
        &self.enumerator
    }

    fn concurrency(&self) -> usize {
        self.config.max_concurrency.max(1)
    }

    /// Enumerate `kind` across every target of `request`.
    pub async fn enumerate(&self, request: &CollectionRequest, kind: ResourceKind) -> Enumeration {
        let cap = self.config.resource_cap;
        let targets = request.targets();
        let units = targets.len();

        let outcomes: Vec<(Target, Result<Vec<ResourceId>, AwsError>)> = stream::iter(targets)
            .map(|target| {
                let span = info_span!(
                    "enumerate",
                    account = %target.account,
                    region = %target.region,
                    kind = %kind
                );
                async move {
                    let result = self.enumerator.list_resources(&target, kind, cap).await;
                    match &result {
                        Ok(ids) => debug!(count = ids.len(), "Enumerated resources"),
                        Err(e) => warn!(error = %e, kind = e.kind(), "Enumeration failed"),
                    }
                    (target, result)
                }
                .instrument(span)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await;

        let mut enumeration = Enumeration {
            units,
            ..Enumeration::default()
        };
        for (target, result) in outcomes {
            match result {
                Ok(ids) => enumeration.resources.extend(
                    ids.into_iter()
                        .take(cap)
                        .map(|id| ScopedResource {
                            target: target.clone(),
                            id,
                        }),
                ),
                Err(error) => enumeration.failures.push(UnitFailure {
                    target,
                    resource: None,
                    error,
                }),
            }
        }

        enumeration.resources.sort();
        enumeration.resources.dedup();
        if enumeration.resources.len() > cap {
            info!(
                found = enumeration.resources.len(),
                cap, "Resource cap reached, truncating"
            );
            enumeration.resources.truncate(cap);
        }
        enumeration.failures.sort_by(|a, b| a.target.cmp(&b.target));

        enumeration
    }

    /// Fetch datapoints for each resource, one unit per resource.
    ///
    /// The trailing window is evaluated when each unit starts.
    pub async fn fetch(
        &self,
        request: &CollectionRequest,
        kind: ResourceKind,
        resources: Vec<ScopedResource>,
    ) -> Vec<UnitOutcome> {
        let spec = request.metric_spec();
        let creation_date = Utc::now().date_naive();

        stream::iter(resources)
            .map(|resource| {
                let span = info_span!(
                    "fetch",
                    account = %resource.target.account,
                    region = %resource.target.region,
                    resource = %resource.id
                );
                async move {
                    let window = TimeWindow::last_day();
                    let result = self
                        .fetcher
                        .fetch_datapoints(&resource.target, kind, &resource.id, spec, window)
                        .await;
                    match result {
                        Ok(datapoints) => {
                            debug!(count = datapoints.len(), "Fetched datapoints");
                            UnitOutcome::Fetched(MetricRecord {
                                prefix: RecordPrefix {
                                    target: resource.target,
                                    creation_date,
                                    service_name: request.service_name().to_string(),
                                    function_name: request.function_name().to_string(),
                                    resource_kind: kind,
                                    resource_id: resource.id,
                                },
                                datapoints,
                            })
                        }
                        Err(error) => {
                            warn!(error = %error, kind = error.kind(), "Metric fetch failed");
                            UnitOutcome::Failed(UnitFailure {
                                target: resource.target,
                                resource: Some(resource.id),
                                error,
                            })
                        }
                    }
                }
                .instrument(span)
            })
            .buffer_unordered(self.concurrency())
            .collect()
            .await
    }

    /// Enumerate, cap and fetch.
    pub async fn collect(&self, request: &CollectionRequest) -> CollectionReport {
        let kind = request.metric_spec().namespace.resource_kind();
        info!(
            function = %request.function_name(),
            accounts = request.accounts().len(),
            regions = request.regions().len(),
            kind = %kind,
            "Starting collection"
        );

        let enumeration = self.enumerate(request, kind).await;
        let fetch_units = enumeration.resources.len();
        let outcomes = self.fetch(request, kind, enumeration.resources).await;

        let mut records = Vec::with_capacity(outcomes.len());
        let mut fetch_failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Fetched(record) => records.push(record),
                UnitOutcome::Failed(failure) => fetch_failures.push(failure),
            }
        }
        records.sort_by(|a, b| {
            (&a.prefix.target, &a.prefix.resource_id)
                .cmp(&(&b.prefix.target, &b.prefix.resource_id))
        });

        let report = CollectionReport {
            resource_kind: kind,
            records,
            enumeration_failures: enumeration.failures,
            fetch_failures,
            enumeration_units: enumeration.units,
            fetch_units,
        };
        info!(
            status = %report.status(),
            records = report.records.len(),
            failures = report.failures(),
            "Collection finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usage_export_common::MetricFunction;
    use usage_export_common::defaults::METRIC_WINDOW_HOURS;
    use usage_export_test_utils::{FakeEnumerator, FakeFetcher, account, datapoint, target};

    fn request(accounts: &[&str], regions: &[&str]) -> CollectionRequest {
        CollectionRequest::for_function(
            MetricFunction::CpuUtilization,
            accounts.iter().map(|a| account(a)).collect(),
            regions.iter().map(|r| r.to_string()).collect(),
        )
        .unwrap()
    }

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}-{i:03}")).collect()
    }

    #[tokio::test]
    async fn test_cap_holds_across_accounts_and_regions() {
        let accounts = ["111111111111", "222222222222", "333333333333"];
        let regions = ["ca-central-1", "us-east-1"];
        let mut enumerator = FakeEnumerator::new();
        for a in accounts {
            for r in regions {
                enumerator = enumerator.with_resources(target(a, r), ids("i", 45));
            }
        }
        let collector = Collector::new(enumerator, FakeFetcher::new(), CollectorConfig::default());

        let enumeration = collector
            .enumerate(&request(&accounts, &regions), ResourceKind::Ec2Instance)
            .await;

        assert_eq!(enumeration.resources.len(), RESOURCE_CAP);
        assert_eq!(enumeration.units, 6);
        // Lexicographic truncation keeps the first account's first region whole
        assert!(
            enumeration.resources[..45]
                .iter()
                .all(|r| r.target == target("111111111111", "ca-central-1"))
        );
        assert!(
            enumeration.resources[45..]
                .iter()
                .all(|r| r.target == target("111111111111", "us-east-1"))
        );
    }

    #[tokio::test]
    async fn test_each_unit_is_asked_for_at_most_the_cap() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ids("i", 100));
        let config = CollectorConfig {
            max_concurrency: 4,
            resource_cap: 10,
        };
        let collector = Collector::new(enumerator.clone(), FakeFetcher::new(), config);

        let enumeration = collector
            .enumerate(
                &request(&["111111111111"], &["ca-central-1"]),
                ResourceKind::Ec2Instance,
            )
            .await;

        assert_eq!(enumeration.resources.len(), 10);
        assert!(enumerator.calls().iter().all(|(_, _, limit)| *limit == 10));
    }

    #[tokio::test]
    async fn test_cap_applies_before_fetch() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ids("i", 80));
        let fetcher = FakeFetcher::new();
        let collector = Collector::new(enumerator, fetcher.clone(), CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;

        assert_eq!(fetcher.calls().len(), RESOURCE_CAP);
        assert_eq!(report.fetch_units, RESOURCE_CAP);
    }

    #[tokio::test]
    async fn test_partial_enumeration_failure() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["i-1"])
            .with_failure(
                target("111111111111", "us-east-1"),
                AwsError::AccessDenied {
                    message: "nope".to_string(),
                },
            );
        let now = Utc::now();
        let fetcher = FakeFetcher::new().with_datapoints("i-1", vec![datapoint(now, 1.0)]);
        let collector = Collector::new(enumerator, fetcher, CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1", "us-east-1"]))
            .await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.enumeration_failures.len(), 1);
        assert_eq!(report.enumeration_failures[0].resource, None);
        assert_eq!(report.status(), RunStatus::Partial);
    }

    #[tokio::test]
    async fn test_all_enumeration_units_failing() {
        let enumerator = FakeEnumerator::new()
            .with_failure(target("111111111111", "ca-central-1"), AwsError::Throttled)
            .with_failure(target("222222222222", "ca-central-1"), AwsError::Throttled);
        let collector = Collector::new(enumerator, FakeFetcher::new(), CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111", "222222222222"], &["ca-central-1"]))
            .await;

        assert!(report.records.is_empty());
        assert!(report.table().is_empty());
        assert_eq!(report.status(), RunStatus::Failed);
    }

    #[tokio::test]
    async fn test_fetch_failure_omits_record() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["i-1", "i-2"]);
        let now = Utc::now();
        let fetcher = FakeFetcher::new()
            .with_datapoints("i-1", vec![datapoint(now, 3.0)])
            .with_failure("i-2", AwsError::other("boom"));
        let collector = Collector::new(enumerator, fetcher, CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].prefix.resource_id, ResourceId::new("i-1"));
        assert_eq!(
            report.fetch_failures[0].resource,
            Some(ResourceId::new("i-2"))
        );
        assert_eq!(report.status(), RunStatus::Partial);
    }

    #[tokio::test]
    async fn test_every_fetch_failing_is_partial() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["i-1", "i-2"]);
        let fetcher = FakeFetcher::new()
            .with_failure("i-1", AwsError::Throttled)
            .with_failure("i-2", AwsError::Throttled);
        let collector = Collector::new(enumerator, fetcher, CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;

        // The enumeration unit succeeded, so the run is not a total failure
        assert!(report.records.is_empty());
        assert!(report.table().is_empty());
        assert_eq!(report.fetch_failures.len(), 2);
        assert_eq!(report.units_attempted(), 3);
        assert_eq!(report.status(), RunStatus::Partial);
    }

    #[tokio::test]
    async fn test_each_fetch_gets_a_fresh_trailing_day() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["i-1", "i-2", "i-3"]);
        let fetcher = FakeFetcher::new();
        let collector = Collector::new(enumerator, fetcher.clone(), CollectorConfig::default());

        let before = Utc::now();
        collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;
        let after = Utc::now();

        let calls = fetcher.calls();
        assert_eq!(calls.len(), 3);
        for call in calls {
            assert_eq!(
                call.window.end - call.window.start,
                chrono::Duration::hours(METRIC_WINDOW_HOURS)
            );
            assert!(call.window.end >= before && call.window.end <= after);
        }
    }

    #[tokio::test]
    async fn test_nothing_to_collect_is_empty() {
        let collector = Collector::new(
            FakeEnumerator::new(),
            FakeFetcher::new(),
            CollectorConfig::default(),
        );

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;

        assert_eq!(report.status(), RunStatus::Empty);
        assert_eq!(report.units_attempted(), 1);
    }

    #[tokio::test]
    async fn test_records_are_ordered_and_prefixed() {
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["i-b", "i-a"]);
        let now = Utc::now();
        let fetcher = FakeFetcher::new().with_default(vec![datapoint(now, 1.0)]);
        let collector = Collector::new(enumerator, fetcher, CollectorConfig::default());

        let report = collector
            .collect(&request(&["111111111111"], &["ca-central-1"]))
            .await;

        let ids: Vec<&str> = report
            .records
            .iter()
            .map(|r| r.prefix.resource_id.as_str())
            .collect();
        assert_eq!(ids, ["i-a", "i-b"]);
        assert_eq!(report.records[0].prefix.function_name, "cpu_utilization");
        assert_eq!(report.records[0].prefix.service_name, "cloudwatch");
        assert_eq!(report.status(), RunStatus::Complete);
    }
}
