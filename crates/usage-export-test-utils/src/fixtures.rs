//! Fixture builders

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::json;
use usage_export_common::carbon::{CarbonQuery, CarbonReport};
use usage_export_common::{AccountId, Datapoint, Statistic, Target};

/// Parse a known-good account id.
///
/// # Panics
///
/// Panics if `id` is not twelve digits.
pub fn account(id: &str) -> AccountId {
    AccountId::parse(id).expect("fixture account id must be 12 digits")
}

pub fn target(account_id: &str, region: &str) -> Target {
    Target::new(account(account_id), region)
}

/// Datapoint carrying a single `Average` value
pub fn datapoint(at: DateTime<Utc>, average: f64) -> Datapoint {
    Datapoint::new(at).with_value(Statistic::Average, average)
}

/// Fixed instant used by deterministic tests
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// Report with two list breakdowns and one scalar field
pub fn sample_carbon_report(account_id: &str) -> CarbonReport {
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid fixture date");
    let emissions = [
        (
            "carbonEmissionEntries".to_string(),
            json!([
                {
                    "startDate": "2023-01-01",
                    "mbmCarbon": 1.25,
                    "paceProductCode": "AmazonEC2",
                    "regionCode": "ca-central-1"
                },
                {"startDate": "2023-02-01", "mbmCarbon": 0.5, "paceProductCode": "AmazonS3"},
            ]),
        ),
        (
            "carbonEmissionsForecast".to_string(),
            json!([
                {"startDate": "2025-01-01", "mbmCarbon": 0.75},
            ]),
        ),
        ("generatedAt".to_string(), json!("2024-06-15T00:00:00Z")),
    ]
    .into_iter()
    .collect();

    CarbonReport {
        account_id: account_id.to_string(),
        query: CarbonQuery::default_for(today),
        emissions,
    }
}
