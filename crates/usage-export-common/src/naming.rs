//! Output file names and object storage key layout
//!
//! | Item | Layout |
//! |------|--------|
//! | file name | `{service}_{function}_{DD_MM_YYYY_HH_MM_SS}.{ext}` |
//! | object key | `data/{partition}/date={YYYY-MM-DD}/{file name}` |

use chrono::{DateTime, NaiveDate, Utc};

/// Timestamp format embedded in file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%d_%m_%Y_%H_%M_%S";

/// Subdirectory of the output path that receives generated files
pub const OUTPUT_SUBDIR: &str = "output";

/// What an exported file is about and where it is filed remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub service: String,
    pub function: String,
    pub partition: String,
}

impl Artifact {
    pub fn new(
        service: impl Into<String>,
        function: impl Into<String>,
        partition: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            function: function.into(),
            partition: partition.into(),
        }
    }

    pub fn file_name(&self, at: DateTime<Utc>, ext: &str) -> String {
        file_name(&self.service, &self.function, at, ext)
    }
}

/// Local file name for a (service, function, timestamp) tuple
pub fn file_name(service: &str, function: &str, at: DateTime<Utc>, ext: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        service,
        function,
        at.format(FILE_TIMESTAMP_FORMAT),
        ext
    )
}

/// Remote object key for an uploaded file
pub fn object_key(partition: &str, date: NaiveDate, file_name: &str) -> String {
    format!("data/{}/date={}/{}", partition, date.format("%Y-%m-%d"), file_name)
}
