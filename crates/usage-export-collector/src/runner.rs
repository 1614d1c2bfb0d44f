//! Runs one job end to end: collect, format, sink

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use usage_export_common::carbon::{CarbonQuery, CarbonReport};
use usage_export_common::{
    AccountId, Artifact, CarbonFootprintSource, CollectionRequest, MetricFetcher, ObjectStore,
    ResourceEnumerator,
};

use crate::collector::{Collector, RunStatus};
use crate::dispatch::Job;
use crate::sink::{Sink, SinkOutcome};

/// Outcome of one job, as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub function: String,
    pub status: RunStatus,
    /// Records (metrics) or breakdowns (carbon footprint) collected
    pub records: usize,
    pub rows: usize,
    pub failures: usize,
    #[serde(default)]
    pub outputs: Vec<SinkOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobReport {
    /// Report for a job that could not run at all
    pub fn failed(function: &str, error: &anyhow::Error) -> Self {
        Self {
            function: function.to_string(),
            status: RunStatus::Failed,
            records: 0,
            rows: 0,
            failures: 1,
            outputs: Vec::new(),
            error: Some(format!("{error:#}")),
        }
    }
}

/// Carbon source used when no billing console integration is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCarbonSource;

impl CarbonFootprintSource for NoCarbonSource {
    async fn fetch_report(&self, _query: &CarbonQuery) -> Result<CarbonReport> {
        anyhow::bail!("No carbon footprint source is configured for this deployment")
    }
}

/// Drives jobs through the collector and the sink
#[derive(Debug)]
pub struct JobRunner<E, F, O, C> {
    collector: Collector<E, F>,
    sink: Sink<O>,
    carbon: C,
}

impl<E, F, O, C> JobRunner<E, F, O, C>
where
    E: ResourceEnumerator,
    F: MetricFetcher,
    O: ObjectStore,
    C: CarbonFootprintSource,
{
    pub fn new(collector: Collector<E, F>, sink: Sink<O>, carbon: C) -> Self {
        Self {
            collector,
            sink,
            carbon,
        }
    }

    pub fn collector(&self) -> &Collector<E, F> {
        &self.collector
    }

    pub fn sink(&self) -> &Sink<O> {
        &self.sink
    }

    pub async fn run(
        &self,
        job: Job,
        accounts: &[AccountId],
        regions: &[String],
    ) -> Result<JobReport> {
        match job {
            Job::Metric(function) => {
                let request =
                    CollectionRequest::for_function(function, accounts.to_vec(), regions.to_vec())?;
                self.run_request(&request).await
            }
            Job::CarbonFootprint => self.run_carbon().await,
        }
    }

    /// Collect `request` and export the result as one CSV file.
    ///
    /// Metric exports are partitioned by service name.
    pub async fn run_request(&self, request: &CollectionRequest) -> Result<JobReport> {
        let at = Utc::now();
        let report = self.collector.collect(request).await;
        let table = report.table();

        let artifact = Artifact::new(
            request.service_name(),
            request.function_name(),
            request.service_name(),
        );
        let outcome = self.sink.write_csv(&table, &artifact, at).await?;

        Ok(JobReport {
            function: request.function_name().to_string(),
            status: report.status(),
            records: report.records.len(),
            rows: table.rows().len(),
            failures: report.failures(),
            outputs: vec![outcome],
            error: None,
        })
    }

    /// Fetch the carbon footprint report and export it as JSON plus one CSV
    /// per emissions breakdown.
    pub async fn run_carbon(&self) -> Result<JobReport> {
        let at = Utc::now();
        let today = at.date_naive();
        let query = CarbonQuery::default_for(today);
        info!(
            start = %query.start_date,
            end = %query.end_date,
            "Fetching carbon footprint report"
        );

        let report = self
            .carbon
            .fetch_report(&query)
            .await
            .context("Failed to fetch carbon footprint report")?;

        let mut outputs = vec![
            self.sink
                .write_json(&report, &CarbonReport::json_artifact(), at)
                .await?,
        ];

        let tables = report.tables(today);
        let rows: usize = tables.iter().map(|(_, table)| table.rows().len()).sum();
        for (artifact, table) in &tables {
            outputs.push(self.sink.write_csv(table, artifact, at).await?);
        }

        Ok(JobReport {
            function: Job::CarbonFootprint.function_name().to_string(),
            status: if rows == 0 {
                RunStatus::Empty
            } else {
                RunStatus::Complete
            },
            records: tables.len(),
            rows,
            failures: 0,
            outputs,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::CollectorConfig;
    use tempfile::TempDir;
    use usage_export_common::MetricFunction;
    use usage_export_test_utils::{
        FakeCarbonSource, FakeEnumerator, FakeFetcher, FakeObjectStore, account, datapoint,
        sample_carbon_report, target,
    };

    type TestRunner = JobRunner<FakeEnumerator, FakeFetcher, FakeObjectStore, FakeCarbonSource>;

    fn runner(dir: &TempDir, enumerator: FakeEnumerator, carbon: FakeCarbonSource) -> TestRunner {
        let fetcher = FakeFetcher::new().with_default(vec![datapoint(Utc::now(), 0.5)]);
        JobRunner::new(
            Collector::new(enumerator, fetcher, CollectorConfig::default()),
            Sink::new(dir.path(), None, FakeObjectStore::new()),
            carbon,
        )
    }

    #[tokio::test]
    async fn test_metric_job_writes_csv() {
        let dir = TempDir::new().unwrap();
        let enumerator = FakeEnumerator::new()
            .with_resources(target("111111111111", "ca-central-1"), ["vol-1", "vol-2"]);
        let runner = runner(&dir, enumerator, FakeCarbonSource::unavailable());

        let report = runner
            .run(
                Job::Metric(MetricFunction::VolumeReadOps),
                &[account("111111111111")],
                &["ca-central-1".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(report.function, "volume_read_ops");
        assert_eq!(report.status, RunStatus::Complete);
        assert_eq!(report.rows, 2);
        let SinkOutcome::Written { path } = &report.outputs[0] else {
            panic!("expected a local file, got {:?}", report.outputs);
        };
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("cloudwatch_volume_read_ops_"));
        let csv = std::fs::read_to_string(path).unwrap();
        assert!(csv.starts_with(
            "Account,Region,Creation_Date,Service_Name,Function_Name,Volume_ID,Timestamp,Average\n"
        ));
    }

    #[tokio::test]
    async fn test_metric_job_without_accounts_is_rejected() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir, FakeEnumerator::new(), FakeCarbonSource::unavailable());

        let err = runner
            .run(
                Job::Metric(MetricFunction::CpuUtilization),
                &[],
                &["ca-central-1".to_string()],
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("accounts cannot be empty"));
    }

    #[tokio::test]
    async fn test_carbon_job_writes_json_and_tables() {
        let dir = TempDir::new().unwrap();
        let carbon = FakeCarbonSource::new(sample_carbon_report("111111111111"));
        let runner = runner(&dir, FakeEnumerator::new(), carbon.clone());

        let report = runner.run_carbon().await.unwrap();

        assert_eq!(report.status, RunStatus::Complete);
        assert_eq!(report.records, 2);
        assert_eq!(report.rows, 3);
        // one JSON file plus one CSV per list breakdown
        assert_eq!(report.outputs.len(), 3);
        assert_eq!(carbon.queries().len(), 1);

        let mut names: Vec<String> = std::fs::read_dir(runner.sink().files_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert!(names[0].starts_with("cost_carbon_footprint_") && names[0].ends_with(".json"));
        assert!(names[1].starts_with("cost_carbon_footprint_carbonEmissionEntries_"));
        assert!(names[2].starts_with("cost_carbon_footprint_carbonEmissionsForecast_"));
    }

    #[tokio::test]
    async fn test_carbon_job_without_source_fails() {
        let dir = TempDir::new().unwrap();
        let runner = runner(&dir, FakeEnumerator::new(), FakeCarbonSource::unavailable());

        let err = runner.run(Job::CarbonFootprint, &[], &[]).await.unwrap_err();
        assert!(format!("{err:#}").contains("unavailable"));
    }

    #[tokio::test]
    async fn test_no_carbon_source() {
        let query = CarbonQuery::default_for(Utc::now().date_naive());
        assert!(NoCarbonSource.fetch_report(&query).await.is_err());
    }
}
