//! AWS-backed resource enumeration and metric retrieval

use crate::aws::cloudwatch::CloudWatchClient;
use crate::aws::context::FromAwsContext;
use crate::aws::ec2::Ec2Client;
use crate::aws::ecs::EcsClient;
use crate::aws::error::AwsError;
use crate::aws::rds::RdsClient;
use crate::aws::s3::S3Client;
use crate::aws::session::SessionProvider;
use usage_export_common::{
    AccountId, Datapoint, MetricFetcher, MetricSpec, RegionLister, ResourceEnumerator,
    ResourceId, ResourceKind, Target, TimeWindow,
};

/// Talks to the real AWS APIs through a [`SessionProvider`].
///
/// Every call builds its own context, so concurrent units never share a
/// client.
#[derive(Debug, Clone)]
pub struct AwsBackend {
    sessions: SessionProvider,
    home_region: String,
}

impl AwsBackend {
    /// `home_region` is used for region discovery and uploads.
    pub fn new(sessions: SessionProvider, home_region: impl Into<String>) -> Self {
        Self {
            sessions,
            home_region: home_region.into(),
        }
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.sessions
    }

    pub fn home_region(&self) -> &str {
        &self.home_region
    }

    /// S3 client using the home account's credentials
    pub async fn object_store(&self) -> S3Client {
        let ctx = self.sessions.home_context(&self.home_region).await;
        S3Client::from_context(&ctx)
    }
}

impl RegionLister for AwsBackend {
    async fn enabled_regions(&self, account: &AccountId) -> Result<Vec<String>, AwsError> {
        let target = Target::new(account.clone(), self.home_region.as_str());
        let ctx = self.sessions.context_for(&target).await;
        Ec2Client::from_context(&ctx).list_enabled_regions().await
    }
}

impl ResourceEnumerator for AwsBackend {
    async fn list_resources(
        &self,
        target: &Target,
        kind: ResourceKind,
        limit: usize,
    ) -> Result<Vec<ResourceId>, AwsError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let ctx = self.sessions.context_for(target).await;
        match kind {
            ResourceKind::Ec2Instance => {
                Ec2Client::from_context(&ctx)
                    .list_running_instances(limit)
                    .await
            }
            ResourceKind::EbsVolume => Ec2Client::from_context(&ctx).list_volumes(limit).await,
            ResourceKind::EcsCluster => {
                EcsClient::from_context(&ctx)
                    .list_cluster_names(limit)
                    .await
            }
            ResourceKind::RdsInstance => {
                RdsClient::from_context(&ctx)
                    .list_db_instances(limit)
                    .await
            }
        }
    }
}

impl MetricFetcher for AwsBackend {
    async fn fetch_datapoints(
        &self,
        target: &Target,
        kind: ResourceKind,
        resource: &ResourceId,
        spec: &MetricSpec,
        window: TimeWindow,
    ) -> Result<Vec<Datapoint>, AwsError> {
        let ctx = self.sessions.context_for(target).await;
        CloudWatchClient::from_context(&ctx)
            .get_datapoints(kind, resource, spec, window)
            .await
    }
}
