//! Metric records and their expansion into table rows
//!
//! A [`MetricRecord`] exists only for resources whose fetch succeeded. Each
//! datapoint becomes one row; a record with no datapoints contributes no rows.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::Statistic;
use crate::request::{ResourceId, Target};
use crate::resource_kind::ResourceKind;

/// One table row keyed by column name
pub type Row = BTreeMap<String, String>;

/// Format of the `Timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the `Creation_Date` column in metric exports
pub const CREATION_DATE_FORMAT: &str = "%m/%d/%Y";

/// Column names for metric exports
pub mod columns {
    pub const ACCOUNT: &str = "Account";
    pub const REGION: &str = "Region";
    pub const CREATION_DATE: &str = "Creation_Date";
    pub const SERVICE_NAME: &str = "Service_Name";
    pub const FUNCTION_NAME: &str = "Function_Name";
    pub const TIMESTAMP: &str = "Timestamp";
}

/// Fixed leading columns of a metric table, in order
pub fn metric_prefix_columns(kind: ResourceKind) -> [&'static str; 7] {
    [
        columns::ACCOUNT,
        columns::REGION,
        columns::CREATION_DATE,
        columns::SERVICE_NAME,
        columns::FUNCTION_NAME,
        kind.id_column(),
        columns::TIMESTAMP,
    ]
}

/// A single sample of a metric over one period
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<Statistic, f64>,
}

impl Datapoint {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, statistic: Statistic, value: f64) -> Self {
        self.values.insert(statistic, value);
        self
    }
}

/// Identifying columns carried by every record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPrefix {
    pub target: Target,
    pub creation_date: NaiveDate,
    pub service_name: String,
    pub function_name: String,
    pub resource_kind: ResourceKind,
    pub resource_id: ResourceId,
}

/// Fetched datapoints for one (account, region, resource) triple
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub prefix: RecordPrefix,
    pub datapoints: Vec<Datapoint>,
}

impl MetricRecord {
    /// Expand into one row per datapoint
    pub fn rows(&self) -> Vec<Row> {
        let prefix = &self.prefix;
        let creation_date = prefix.creation_date.format(CREATION_DATE_FORMAT).to_string();

        self.datapoints
            .iter()
            .map(|dp| {
                let mut row = Row::new();
                row.insert(columns::ACCOUNT.into(), prefix.target.account.to_string());
                row.insert(columns::REGION.into(), prefix.target.region.clone());
                row.insert(columns::CREATION_DATE.into(), creation_date.clone());
                row.insert(columns::SERVICE_NAME.into(), prefix.service_name.clone());
                row.insert(columns::FUNCTION_NAME.into(), prefix.function_name.clone());
                row.insert(
                    prefix.resource_kind.id_column().into(),
                    prefix.resource_id.to_string(),
                );
                row.insert(
                    columns::TIMESTAMP.into(),
                    dp.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                );
                for (statistic, value) in &dp.values {
                    row.insert(statistic.as_str().into(), format_value(*value));
                }
                row
            })
            .collect()
    }
}

/// Float rendering that keeps `.0` on whole numbers
fn format_value(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::AccountId;
    use chrono::TimeZone;

    fn record(datapoints: Vec<Datapoint>) -> MetricRecord {
        MetricRecord {
            prefix: RecordPrefix {
                target: Target::new(AccountId::parse("111111111111").unwrap(), "ca-central-1"),
                creation_date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
                service_name: "cloudwatch".to_string(),
                function_name: "rds_cpu_utilization".to_string(),
                resource_kind: ResourceKind::RdsInstance,
                resource_id: ResourceId::new("db-1"),
            },
            datapoints,
        }
    }

    #[test]
    fn test_one_row_per_datapoint() {
        let t1 = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 3, 6, 10, 5, 0).unwrap();
        let rec = record(vec![
            Datapoint::new(t1).with_value(Statistic::Average, 0.5),
            Datapoint::new(t2).with_value(Statistic::Average, 12.25),
        ]);

        let rows = rec.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Account"], "111111111111");
        assert_eq!(rows[0]["Creation_Date"], "03/07/2024");
        assert_eq!(rows[0]["Instance_ID"], "db-1");
        assert_eq!(rows[0]["Timestamp"], "2024-03-06 10:00:00");
        assert_eq!(rows[0]["Average"], "0.5");
        assert_eq!(rows[1]["Average"], "12.25");
    }

    #[test]
    fn test_whole_number_values_keep_decimal_point() {
        let t = Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap();
        let rec = record(vec![
            Datapoint::new(t)
                .with_value(Statistic::Sum, 42.0)
                .with_value(Statistic::Maximum, 0.0),
        ]);

        let rows = rec.rows();
        assert_eq!(rows[0]["Sum"], "42.0");
        assert_eq!(rows[0]["Maximum"], "0.0");
    }

    #[test]
    fn test_no_datapoints_no_rows() {
        assert!(record(vec![]).rows().is_empty());
    }

    #[test]
    fn test_prefix_columns_follow_resource_kind() {
        let cols = metric_prefix_columns(ResourceKind::EbsVolume);
        assert_eq!(cols[5], "Volume_ID");
        assert_eq!(cols[6], "Timestamp");
    }
}
