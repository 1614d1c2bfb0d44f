//! In-memory implementations of the collaborator traits
//!
//! Each fake records the calls it receives so tests can assert on fan-out
//! and cap behavior without touching AWS.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use usage_export_common::carbon::{CarbonQuery, CarbonReport};
use usage_export_common::{
    AccountId, AwsError, CarbonFootprintSource, Datapoint, MetricFetcher, MetricSpec,
    ObjectStore, RegionLister, ResourceEnumerator, ResourceId, ResourceKind, Target, TimeWindow,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Enumerator backed by a fixed map of target -> identifiers.
///
/// Targets without an entry enumerate to nothing. The limit is honored the
/// way a paginating implementation would: at most `limit` ids are returned.
#[derive(Debug, Clone, Default)]
pub struct FakeEnumerator {
    responses: BTreeMap<Target, Result<Vec<ResourceId>, AwsError>>,
    enabled_regions: Option<Result<Vec<String>, AwsError>>,
    calls: Arc<Mutex<Vec<(Target, ResourceKind, usize)>>>,
}

impl FakeEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources<I, S>(mut self, target: Target, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(ResourceId::new).collect();
        self.responses.insert(target, Ok(ids));
        self
    }

    pub fn with_failure(mut self, target: Target, error: AwsError) -> Self {
        self.responses.insert(target, Err(error));
        self
    }

    /// Regions reported for any account
    pub fn with_enabled_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_regions = Some(Ok(regions.into_iter().map(Into::into).collect()));
        self
    }

    pub fn with_region_failure(mut self, error: AwsError) -> Self {
        self.enabled_regions = Some(Err(error));
        self
    }

    /// Every `(target, kind, limit)` this enumerator was asked for
    pub fn calls(&self) -> Vec<(Target, ResourceKind, usize)> {
        lock(&self.calls).clone()
    }
}

impl ResourceEnumerator for FakeEnumerator {
    async fn list_resources(
        &self,
        target: &Target,
        kind: ResourceKind,
        limit: usize,
    ) -> Result<Vec<ResourceId>, AwsError> {
        lock(&self.calls).push((target.clone(), kind, limit));
        match self.responses.get(target) {
            Some(Ok(ids)) => Ok(ids.iter().take(limit).cloned().collect()),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(Vec::new()),
        }
    }
}

impl RegionLister for FakeEnumerator {
    /// Configured regions, or else the regions this enumerator has entries
    /// for in `account`.
    async fn enabled_regions(&self, account: &AccountId) -> Result<Vec<String>, AwsError> {
        if let Some(configured) = &self.enabled_regions {
            return configured.clone();
        }
        let mut regions: Vec<String> = self
            .responses
            .keys()
            .filter(|t| &t.account == account)
            .map(|t| t.region.clone())
            .collect();
        regions.dedup();
        Ok(regions)
    }
}

/// One recorded `fetch_datapoints` call
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub target: Target,
    pub resource: ResourceId,
    pub spec: MetricSpec,
    pub window: TimeWindow,
}

/// Fetcher returning canned datapoints per resource id.
///
/// Resources without an entry get `default` (empty unless configured).
#[derive(Debug, Clone, Default)]
pub struct FakeFetcher {
    responses: BTreeMap<ResourceId, Result<Vec<Datapoint>, AwsError>>,
    default: Vec<Datapoint>,
    calls: Arc<Mutex<Vec<FetchCall>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_datapoints(mut self, id: &str, datapoints: Vec<Datapoint>) -> Self {
        self.responses.insert(ResourceId::new(id), Ok(datapoints));
        self
    }

    pub fn with_failure(mut self, id: &str, error: AwsError) -> Self {
        self.responses.insert(ResourceId::new(id), Err(error));
        self
    }

    /// Datapoints for resources with no explicit entry
    pub fn with_default(mut self, datapoints: Vec<Datapoint>) -> Self {
        self.default = datapoints;
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        lock(&self.calls).clone()
    }
}

impl MetricFetcher for FakeFetcher {
    async fn fetch_datapoints(
        &self,
        target: &Target,
        _kind: ResourceKind,
        resource: &ResourceId,
        spec: &MetricSpec,
        window: TimeWindow,
    ) -> Result<Vec<Datapoint>, AwsError> {
        lock(&self.calls).push(FetchCall {
            target: target.clone(),
            resource: resource.clone(),
            spec: spec.clone(),
            window,
        });
        match self.responses.get(resource) {
            Some(result) => result.clone(),
            None => Ok(self.default.clone()),
        }
    }
}

/// A captured upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub contents: Vec<u8>,
}

/// Object store that keeps uploads in memory, or fails every upload
#[derive(Debug, Clone, Default)]
pub struct FakeObjectStore {
    uploads: Arc<Mutex<Vec<Upload>>>,
    failure: Option<AwsError>,
}

impl FakeObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: AwsError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        lock(&self.uploads).clone()
    }
}

impl ObjectStore for FakeObjectStore {
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AwsError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let contents = std::fs::read(path)
            .map_err(|e| AwsError::other(format!("Failed to read {}: {e}", path.display())))?;
        lock(&self.uploads).push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            contents,
        });
        Ok(())
    }
}

/// Carbon source returning a fixed report, or an error when empty
#[derive(Debug, Clone, Default)]
pub struct FakeCarbonSource {
    report: Option<CarbonReport>,
    queries: Arc<Mutex<Vec<CarbonQuery>>>,
}

impl FakeCarbonSource {
    pub fn new(report: CarbonReport) -> Self {
        Self {
            report: Some(report),
            queries: Arc::default(),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn queries(&self) -> Vec<CarbonQuery> {
        lock(&self.queries).clone()
    }
}

impl CarbonFootprintSource for FakeCarbonSource {
    async fn fetch_report(&self, query: &CarbonQuery) -> anyhow::Result<CarbonReport> {
        lock(&self.queries).push(*query);
        let mut report = self
            .report
            .clone()
            .ok_or_else(|| anyhow!("carbon footprint source unavailable"))?;
        report.query = *query;
        Ok(report)
    }
}
