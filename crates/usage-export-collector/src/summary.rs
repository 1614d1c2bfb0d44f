//! Summary table printed by the CLI after a run

use std::collections::BTreeMap;

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use crate::runner::JobReport;
use crate::sink::SinkOutcome;

/// One-line description of where a file ended up
pub fn describe_outcome(outcome: &SinkOutcome) -> String {
    match outcome {
        SinkOutcome::Skipped => "-".to_string(),
        SinkOutcome::Written { path } => path.display().to_string(),
        SinkOutcome::Uploaded { bucket, key } => format!("s3://{bucket}/{key}"),
        SinkOutcome::UploadFailed { path, .. } => {
            format!("{} (upload failed)", path.display())
        }
    }
}

/// Render job reports, keyed by job, as a table
pub fn summary_table(reports: &BTreeMap<String, JobReport>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Job"),
            Cell::new("Status"),
            Cell::new("Records"),
            Cell::new("Rows"),
            Cell::new("Failures"),
            Cell::new("Output"),
        ]);

    for (key, report) in reports {
        let output = match &report.error {
            Some(error) => error.clone(),
            None if report.outputs.is_empty() => "-".to_string(),
            None => report
                .outputs
                .iter()
                .map(describe_outcome)
                .collect::<Vec<_>>()
                .join("\n"),
        };

        table.add_row(vec![
            Cell::new(key),
            Cell::new(report.status),
            Cell::new(report.records),
            Cell::new(report.rows),
            Cell::new(report.failures),
            Cell::new(output),
        ]);
    }

    table
}

pub fn print_summary(reports: &BTreeMap<String, JobReport>) {
    if reports.is_empty() {
        return;
    }

    println!("\n=== Export Results ===\n");
    println!("{}", summary_table(reports));
}
