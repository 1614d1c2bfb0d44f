//! usage-export-common - Shared types and utilities
//!
//! This crate provides the domain model shared by the collector binaries and
//! the test fixtures, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`catalog`]: CloudWatch metric catalog (namespaces, statistics, functions)
//! - [`carbon`]: Carbon footprint report model and tabular conversion
//! - [`defaults`]: Default configuration values
//! - [`error`]: Request validation errors and AWS error classification
//! - [`naming`]: Output file names and object storage key layout
//! - [`record`]: Metric records and row expansion
//! - [`request`]: Account/region targets and collection requests
//! - [`resource_kind`]: Resource kinds and their CloudWatch dimensions
//! - [`source`]: Collaborator contracts (enumeration, regions, metrics, storage)
//! - [`table`]: Union-of-keys table formatter and CSV rendering

pub mod carbon;
pub mod catalog;
pub mod defaults;
pub mod error;
pub mod naming;
pub mod record;
pub mod request;
pub mod resource_kind;
pub mod source;
pub mod table;

// Re-export commonly used types
pub use catalog::{MetricFunction, MetricSpec, Namespace, Statistic};
pub use error::{AwsError, RequestError};
pub use naming::Artifact;
pub use record::{Datapoint, MetricRecord, RecordPrefix, Row};
pub use request::{AccountId, CollectionRequest, ResourceId, ScopedResource, Target};
pub use resource_kind::ResourceKind;
pub use source::{
    CarbonFootprintSource, MetricFetcher, ObjectStore, RegionLister, ResourceEnumerator,
    TimeWindow,
};
pub use table::Table;
