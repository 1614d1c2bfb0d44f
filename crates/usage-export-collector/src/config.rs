//! Configuration types for export runs
//!
//! Both binaries read the same settings; the CLI from flags with environment
//! fallbacks, the Lambda from the environment alone.

use std::path::PathBuf;

use usage_export_common::defaults::{
    DEFAULT_ASSUME_ROLE_NAME, DEFAULT_MAX_CONCURRENCY, DEFAULT_REGION, RESOURCE_CAP,
};
use usage_export_common::{AccountId, RequestError};

pub use crate::collector::CollectorConfig;

/// Keyword selecting every enabled region
pub const ALL_REGIONS: &str = "all";

/// Where generated files go
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Base directory; files are written to its `output/` subdirectory
    pub output_path: PathBuf,
    /// Upload target; `None` keeps files local
    pub bucket: Option<String>,
}

/// AWS credentials and session settings
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// Region used for identity lookup, region discovery and uploads
    pub home_region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
    /// Role assumed in accounts other than the home account
    pub role_name: String,
}

/// Regions to collect from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionSelection {
    /// Every region enabled for the account
    All,
    Listed(Vec<String>),
}

impl RegionSelection {
    /// Trim and drop blanks; the keyword `all` anywhere selects every region.
    pub fn parse<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut regions = Vec::new();
        for item in items {
            let region = item.as_ref().trim();
            if region.eq_ignore_ascii_case(ALL_REGIONS) {
                return RegionSelection::All;
            }
            if !region.is_empty() && !regions.iter().any(|r| r == region) {
                regions.push(region.to_string());
            }
        }
        RegionSelection::Listed(regions)
    }
}

/// Default accounts and regions for requests that do not name their own
#[derive(Debug, Clone)]
pub struct TargetConfig {
    /// Empty means "the home account", resolved at startup
    pub accounts: Vec<AccountId>,
    pub regions: RegionSelection,
}

/// Configuration for an export process
///
/// Composed of focused sub-configs, following the same split as the
/// command-line flags.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub output: OutputConfig,
    pub aws: AwsConfig,
    pub targets: TargetConfig,
    pub collector: CollectorConfig,
}

impl ExportConfig {
    /// Fill in the home account when no accounts were configured
    pub fn with_home_account(mut self, home: Option<&AccountId>) -> Self {
        if self.targets.accounts.is_empty() {
            self.targets.accounts.extend(home.cloned());
        }
        self
    }
}

/// Settings shared by every command, each with an environment fallback
#[derive(clap::Args, Debug, Clone)]
pub struct EnvArgs {
    /// Base output directory (files go to <OUTPUT_PATH>/output)
    #[arg(long, env = "OUTPUT_PATH", default_value = "/tmp")]
    pub output_path: PathBuf,

    /// S3 bucket for uploads; files stay local when unset
    #[arg(long = "bucket", env = "s3_bucket")]
    pub s3_bucket: Option<String>,

    /// Comma-separated account ids (default: the caller's own account)
    #[arg(long = "accounts", env = "account_id", value_delimiter = ',')]
    pub accounts: Vec<String>,

    /// Comma-separated regions, or "all"
    #[arg(long, env = "REGIONS", value_delimiter = ',', default_value = DEFAULT_REGION)]
    pub regions: Vec<String>,

    /// Region for identity lookup, region discovery and uploads
    #[arg(long, env = "HOME_REGION", default_value = DEFAULT_REGION)]
    pub home_region: String,

    /// Role assumed in member accounts
    #[arg(long, env = "ASSUME_ROLE_NAME", default_value = DEFAULT_ASSUME_ROLE_NAME)]
    pub role_name: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long, env = "AWS_PROFILE")]
    pub aws_profile: Option<String>,

    /// Maximum collection units in flight
    #[arg(long, env = "MAX_CONCURRENCY", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,
}

impl TryFrom<EnvArgs> for ExportConfig {
    type Error = RequestError;

    fn try_from(args: EnvArgs) -> Result<Self, Self::Error> {
        let accounts = parse_accounts(&args.accounts)?;

        Ok(Self {
            output: OutputConfig {
                output_path: args.output_path,
                bucket: args.s3_bucket.filter(|b| !b.trim().is_empty()),
            },
            aws: AwsConfig {
                home_region: args.home_region,
                aws_profile: args.aws_profile.filter(|p| !p.is_empty()),
                role_name: args.role_name,
            },
            targets: TargetConfig {
                accounts,
                regions: RegionSelection::parse(&args.regions),
            },
            collector: CollectorConfig {
                max_concurrency: args.max_concurrency.max(1),
                resource_cap: RESOURCE_CAP,
            },
        })
    }
}

/// Parse account ids, ignoring blanks and duplicates
pub fn parse_accounts<S: AsRef<str>>(items: &[S]) -> Result<Vec<AccountId>, RequestError> {
    let mut accounts: Vec<AccountId> = Vec::new();
    for item in items {
        let item = item.as_ref().trim();
        if item.is_empty() {
            continue;
        }
        let account = AccountId::parse(item)?;
        if !accounts.contains(&account) {
            accounts.push(account);
        }
    }
    Ok(accounts)
}
