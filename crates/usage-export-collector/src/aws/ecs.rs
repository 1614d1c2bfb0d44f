//! ECS cluster enumeration

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, classify_sdk_error};
use crate::aws::paging::{CappedIds, next_token, page_size};
use aws_sdk_ecs::Client;
use tracing::debug;
use usage_export_common::ResourceId;

pub struct EcsClient {
    client: Client,
}

impl FromAwsContext for EcsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ecs_client(),
        }
    }
}

impl EcsClient {
    /// Cluster names (not ARNs), at most `limit`
    pub async fn list_cluster_names(&self, limit: usize) -> Result<Vec<ResourceId>, AwsError> {
        let mut ids = CappedIds::new(limit);
        let mut token = None;

        while !ids.is_full() {
            let response = self
                .client
                .list_clusters()
                .max_results(page_size(limit, 1, 100))
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            for arn in response.cluster_arns() {
                if ids.push(cluster_name(arn)) {
                    break;
                }
            }

            token = next_token(response.next_token());
            if token.is_none() {
                break;
            }
        }

        let ids = ids.into_inner();
        debug!(count = ids.len(), "Listed ECS clusters");
        Ok(ids)
    }
}

/// `arn:aws:ecs:region:account:cluster/name` -> `name`
fn cluster_name(arn: &str) -> &str {
    arn.rsplit_once("cluster/").map_or(arn, |(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_name_from_arn() {
        assert_eq!(
            cluster_name("arn:aws:ecs:ca-central-1:111111111111:cluster/prod-web"),
            "prod-web"
        );
    }

    #[test]
    fn test_cluster_name_passthrough() {
        assert_eq!(cluster_name("prod-web"), "prod-web");
    }
}
