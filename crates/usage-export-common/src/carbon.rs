//! Carbon footprint report model and tabular conversion
//!
//! Emissions data lags real time by three months; the default query covers
//! the 36 months before the first day of the month three months ago.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::defaults::{CARBON_PARTITION, CARBON_SERVICE_NAME};
use crate::naming::Artifact;
use crate::record::Row;
use crate::table::Table;

/// Service label written into carbon footprint rows
pub const CARBON_SERVICE_LABEL: &str = "Cost";

/// Function name for carbon footprint exports
pub const CARBON_FUNCTION_NAME: &str = "carbon_footprint";

/// Fixed leading columns of a carbon footprint table
pub const CARBON_PREFIX_COLUMNS: [&str; 4] =
    ["Account", "Creation_Date", "service_name", "function_name"];

/// Months between the end of a month and availability of its emissions data
const REPORTING_LAG_MONTHS: u32 = 3;

/// Months of history requested by default
const HISTORY_MONTHS: u32 = 36;

/// Date range and query date of a carbon footprint request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonQuery {
    pub query_date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl CarbonQuery {
    /// Default range relative to `today`
    pub fn default_for(today: NaiveDate) -> Self {
        let lagged = today
            .checked_sub_months(Months::new(REPORTING_LAG_MONTHS))
            .unwrap_or(today);
        let end_date = lagged.with_day(1).unwrap_or(lagged);
        let start_date = end_date
            .checked_sub_months(Months::new(HISTORY_MONTHS))
            .unwrap_or(end_date);

        Self {
            query_date: today,
            start_date,
            end_date,
        }
    }
}

/// Full report as returned for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarbonReport {
    pub account_id: String,
    pub query: CarbonQuery,
    /// Emissions breakdowns keyed by dimension; each value is normally a
    /// list of flat objects
    pub emissions: BTreeMap<String, Value>,
}

impl CarbonReport {
    /// Artifact for the full-fidelity JSON export
    pub fn json_artifact() -> Artifact {
        Artifact::new(CARBON_SERVICE_NAME, CARBON_FUNCTION_NAME, CARBON_PARTITION)
    }

    /// One table per emissions breakdown, one row per entry.
    ///
    /// Breakdowns that are not lists are left to the JSON export.
    pub fn tables(&self, today: NaiveDate) -> Vec<(Artifact, Table)> {
        let creation_date = today.format("%Y-%m-%d").to_string();

        self.emissions
            .iter()
            .filter_map(|(key, value)| {
                let entries = value.as_array()?;
                let rows: Vec<Row> = entries
                    .iter()
                    .map(|entry| self.entry_row(entry, &creation_date))
                    .collect();
                let artifact = Artifact::new(
                    CARBON_SERVICE_NAME,
                    format!("{}_{}", CARBON_FUNCTION_NAME, key),
                    CARBON_PARTITION,
                );
                Some((artifact, Table::build(&CARBON_PREFIX_COLUMNS, &rows)))
            })
            .collect()
    }

    fn entry_row(&self, entry: &Value, creation_date: &str) -> Row {
        let mut row: Row = match entry {
            Value::Object(fields) => fields
                .iter()
                .map(|(k, v)| (k.clone(), cell_text(v)))
                .collect(),
            other => Row::from([("value".to_string(), cell_text(other))]),
        };
        row.insert("Account".into(), self.account_id.clone());
        row.insert("Creation_Date".into(), creation_date.to_string());
        row.insert("service_name".into(), CARBON_SERVICE_LABEL.into());
        row.insert("function_name".into(), CARBON_FUNCTION_NAME.into());
        row
    }
}

/// Textual representation of a JSON value for a CSV cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_query_range() {
        let q = CarbonQuery::default_for(date(2024, 5, 17));
        assert_eq!(q.end_date, date(2024, 2, 1));
        assert_eq!(q.start_date, date(2021, 2, 1));
        assert_eq!(q.query_date, date(2024, 5, 17));
    }

    #[test]
    fn test_default_query_month_end() {
        // May 31 minus three months clamps to Feb 29 before taking day 1
        let q = CarbonQuery::default_for(date(2024, 5, 31));
        assert_eq!(q.end_date, date(2024, 2, 1));
    }

    #[test]
    fn test_report_serde_shape() {
        let report = CarbonReport {
            account_id: "111111111111".to_string(),
            query: CarbonQuery::default_for(date(2024, 5, 17)),
            emissions: BTreeMap::from([("carbonEmissionEntries".to_string(), json!([]))]),
        };
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["accountId"], "111111111111");
        assert_eq!(value["query"]["startDate"], "2021-02-01");
        assert_eq!(value["query"]["endDate"], "2024-02-01");
        assert_eq!(value["query"]["queryDate"], "2024-05-17");
    }

    #[test]
    fn test_tables_per_breakdown() {
        let report = CarbonReport {
            account_id: "111111111111".to_string(),
            query: CarbonQuery::default_for(date(2024, 5, 17)),
            emissions: BTreeMap::from([
                (
                    "carbonEmissionEntries".to_string(),
                    json!([
                        {"mbmCarbon": 1.5, "paceProductCode": "AmazonEC2", "regionCode": "EUR"},
                        {"mbmCarbon": 0.2, "startDate": "2023-01-01"}
                    ]),
                ),
                ("total".to_string(), json!({"mbmCarbon": 1.7})),
            ]),
        };

        let tables = report.tables(date(2024, 5, 17));
        assert_eq!(tables.len(), 1);
        let (artifact, table) = &tables[0];
        assert_eq!(artifact.function, "carbon_footprint_carbonEmissionEntries");
        assert_eq!(artifact.partition, "misc");
        assert_eq!(
            table.header(),
            [
                "Account",
                "Creation_Date",
                "service_name",
                "function_name",
                "mbmCarbon",
                "paceProductCode",
                "regionCode",
                "startDate"
            ]
        );
        assert_eq!(table.rows()[0][1], "2024-05-17");
        assert_eq!(table.rows()[0][2], "Cost");
        assert_eq!(table.rows()[0][4], "1.5");
        assert_eq!(table.rows()[1][5], "");
        assert_eq!(table.rows()[1][7], "2023-01-01");
    }
}
