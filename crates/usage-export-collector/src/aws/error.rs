//! Conversion of AWS SDK errors into [`AwsError`]
//!
//! Classification works on the `.code()` reported by the service. Errors that
//! never reached the service (dispatch, timeouts, credential resolution) have
//! no code and are described by their full source chain instead.

use aws_sdk_ec2::error::ProvideErrorMetadata;
use std::error::Error;

pub use usage_export_common::error::{AwsError, classify_aws_error};

/// Classify any SDK operation error.
///
/// Every generated SDK re-exports the same `ProvideErrorMetadata` trait, so
/// this works for EC2, ECS, RDS, CloudWatch and S3 errors alike.
pub fn classify_sdk_error<E>(err: &E) -> AwsError
where
    E: ProvideErrorMetadata + Error,
{
    match err.message() {
        Some(message) => classify_aws_error(err.code(), Some(message)),
        None => {
            let detail = error_chain(err);
            classify_aws_error(err.code(), Some(&detail))
        }
    }
}

/// Render an error and all of its sources on one line
fn error_chain(err: &dyn Error) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
