//! AWS client modules for the collector
//!
//! This module provides wrappers around AWS SDK clients for:
//! - EC2: running instances, EBS volumes, enabled regions
//! - ECS: clusters
//! - RDS: DB instances
//! - CloudWatch: metric statistics
//! - S3: export uploads
//! - STS: account ID lookup and role assumption

pub mod account;
pub mod backend;
pub mod cloudwatch;
pub mod context;
pub mod ec2;
pub mod ecs;
pub mod error;
pub mod paging;
pub mod rds;
pub mod s3;
pub mod session;

pub use account::get_current_account_id;
pub use backend::AwsBackend;
pub use context::{AwsContext, FromAwsContext};
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
pub use s3::S3Client;
pub use session::SessionProvider;
