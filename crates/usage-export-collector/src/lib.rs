//! usage-export-collector - AWS usage and carbon footprint export
//!
//! This crate collects CloudWatch metrics across accounts, regions and
//! resources, formats them as CSV and writes them locally or to S3. It
//! provides a CLI and a Lambda entry point over the same [`handler`].

pub mod app;
pub mod aws;
pub mod collector;
pub mod config;
pub mod dispatch;
pub mod handler;
pub mod runner;
pub mod sink;
pub mod summary;

pub use collector::{CollectionReport, Collector, CollectorConfig, RunStatus};
pub use dispatch::{Job, Service};
pub use handler::{Handler, HandlerRequest, HandlerResponse};
pub use runner::{JobReport, JobRunner};
pub use sink::{Sink, SinkOutcome};
