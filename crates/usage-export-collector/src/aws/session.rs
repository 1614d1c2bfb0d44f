//! Per-account session resolution
//!
//! The home account is reached with the default credential chain; every other
//! account is reached by assuming a role with a fixed name in that account.

use crate::aws::context::AwsContext;
use tracing::debug;
use usage_export_common::{AccountId, Target};

/// Session name recorded in CloudTrail for assumed-role calls
pub const SESSION_NAME: &str = "usage-export";

/// Builds an [`AwsContext`] for any account/region target
#[derive(Debug, Clone)]
pub struct SessionProvider {
    home_account: Option<AccountId>,
    role_name: String,
    profile: Option<String>,
}

impl SessionProvider {
    /// With no known home account every target goes through the role.
    pub fn new(
        home_account: Option<AccountId>,
        role_name: impl Into<String>,
        profile: Option<String>,
    ) -> Self {
        Self {
            home_account,
            role_name: role_name.into(),
            profile,
        }
    }

    pub fn home_account(&self) -> Option<&AccountId> {
        self.home_account.as_ref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// ARN of the role assumed in `account`
    pub fn role_arn(&self, account: &AccountId) -> String {
        format!("arn:aws:iam::{}:role/{}", account, self.role_name)
    }

    pub fn is_home(&self, account: &AccountId) -> bool {
        self.home_account.as_ref() == Some(account)
    }

    /// Context with the home account's own credentials
    pub async fn home_context(&self, region: &str) -> AwsContext {
        AwsContext::with_profile(region, self.profile.as_deref()).await
    }

    /// Fresh context for one target
    pub async fn context_for(&self, target: &Target) -> AwsContext {
        let base = self.home_context(&target.region).await;
        if self.is_home(&target.account) {
            return base;
        }

        let role_arn = self.role_arn(&target.account);
        debug!(
            account = %target.account,
            region = %target.region,
            role_arn = %role_arn,
            "Assuming role"
        );
        AwsContext::assume_role(&base, &role_arn, SESSION_NAME, &target.region).await
    }
}
