//! Request validation errors and AWS error classification
//!
//! Classification uses the AWS error code instead of string matching on the
//! Debug format, so it works for every SDK client without pulling the SDKs
//! into this crate.

use thiserror::Error;

/// Structurally invalid requests. These are surfaced to the caller rather
/// than logged and skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    /// No service name in the event payload
    #[error("Service name is required in the event payload")]
    MissingService,

    /// Service name outside the supported set
    #[error("Service {0} is not supported")]
    UnsupportedService(String),

    /// A required request field is empty
    #[error("{0} cannot be empty")]
    MissingField(&'static str),

    /// Namespace has no resource enumerator
    #[error("Unsupported namespace: {0}")]
    UnsupportedNamespace(String),

    /// Function name is not in the metric catalog
    #[error("Function name '{0}' not supported for metric collection")]
    UnknownFunction(String),

    /// Option number is not in the metric catalog
    #[error("Option {0} is not a known metric option")]
    UnknownOption(u8),

    /// Statistic name is not a CloudWatch statistic
    #[error("Unknown statistic: {0}")]
    UnknownStatistic(String),

    /// Account id is not twelve digits
    #[error("Invalid account id '{0}': expected 12 digits")]
    InvalidAccountId(String),
}

/// AWS error categories for per-unit failure reporting
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AwsError {
    /// Caller lacks permission for the operation
    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    /// Region is not enabled for the account
    #[error("Region not enabled: {message}")]
    RegionNotEnabled { message: String },

    /// Credentials are missing, invalid or expired
    #[error("Invalid credentials: {message}")]
    InvalidCredentials { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Build a generic error without an AWS error code
    pub fn other(message: impl Into<String>) -> Self {
        AwsError::Sdk {
            code: None,
            message: message.into(),
        }
    }

    /// Check if this error is caused by bad or missing credentials
    pub fn is_credentials(&self) -> bool {
        matches!(self, AwsError::InvalidCredentials { .. })
    }

    /// Check if this is a rate limit error
    pub fn is_throttled(&self) -> bool {
        matches!(self, AwsError::Throttled)
    }

    /// Short category label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            AwsError::AccessDenied { .. } => "access_denied",
            AwsError::RegionNotEnabled { .. } => "region_not_enabled",
            AwsError::InvalidCredentials { .. } => "invalid_credentials",
            AwsError::Throttled => "throttled",
            AwsError::NotFound { .. } => "not_found",
            AwsError::Sdk { .. } => "sdk",
        }
    }
}

/// Known AWS error codes for permission failures
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthorizationError",
];

/// Known AWS error codes for regions that are not opted in
const REGION_CODES: &[&str] = &["OptInRequired", "UnrecognizedClientException"];

/// Known AWS error codes for bad credentials
const CREDENTIAL_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "InvalidClientTokenId",
    "ExpiredToken",
    "ExpiredTokenException",
    "SignatureDoesNotMatch",
    "AuthFailure",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    "TooManyRequestsException",
];

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NoSuchKey",
    "DBInstanceNotFound",
    "ClusterNotFoundException",
    "ResourceNotFound",
];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied { message },
        Some(c) if REGION_CODES.contains(&c) => AwsError::RegionNotEnabled { message },
        Some(c) if CREDENTIAL_CODES.contains(&c) => AwsError::InvalidCredentials { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_codes() {
        for code in CREDENTIAL_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_credentials(), "Expected credentials for code: {code}");
        }
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_throttled(), "Expected throttled for code: {code}");
        }
    }

    #[test]
    fn access_and_region_codes() {
        assert!(matches!(
            classify_aws_error(Some("UnauthorizedOperation"), Some("no")),
            AwsError::AccessDenied { .. }
        ));
        assert!(matches!(
            classify_aws_error(Some("OptInRequired"), Some("no")),
            AwsError::RegionNotEnabled { .. }
        ));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert_eq!(
            err,
            AwsError::Sdk {
                code: Some("SomeNewError".to_string()),
                message: "details".to_string()
            }
        );

        let err2 = classify_aws_error(None, None);
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
        assert_eq!(err2.to_string(), "AWS error: Unknown error");
    }

    #[test]
    fn request_error_display() {
        assert_eq!(
            RequestError::UnsupportedService("bogus".to_string()).to_string(),
            "Service bogus is not supported"
        );
        assert_eq!(
            RequestError::MissingField("accounts").to_string(),
            "accounts cannot be empty"
        );
    }
}
