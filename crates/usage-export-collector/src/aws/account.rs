//! AWS account identity

use anyhow::{Context, Result};
use tracing::info;
use usage_export_common::AccountId;

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// This operation requires no special permissions. It is used to resolve
/// the home account when none is configured.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account resolved");

    AccountId::parse(account).context("STS returned a malformed account ID")
}
