//! EC2 enumeration: running instances, EBS volumes and enabled regions

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, classify_sdk_error};
use crate::aws::paging::{CappedIds, next_token, page_size};
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::Filter;
use tracing::debug;
use usage_export_common::ResourceId;

/// EC2 client wrapper for resource enumeration
pub struct Ec2Client {
    client: Client,
}

impl FromAwsContext for Ec2Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}

impl Ec2Client {
    /// IDs of instances in the `running` state, at most `limit`
    pub async fn list_running_instances(&self, limit: usize) -> Result<Vec<ResourceId>, AwsError> {
        let mut ids = CappedIds::new(limit);
        let mut token = None;

        while !ids.is_full() {
            let response = self
                .client
                .describe_instances()
                .filters(
                    Filter::builder()
                        .name("instance-state-name")
                        .values("running")
                        .build(),
                )
                .max_results(page_size(limit, 5, 1000))
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            let instances = response
                .reservations()
                .iter()
                .flat_map(|reservation| reservation.instances());
            for id in instances.filter_map(|instance| instance.instance_id()) {
                if ids.push(id) {
                    break;
                }
            }

            token = next_token(response.next_token());
            if token.is_none() {
                break;
            }
        }

        let ids = ids.into_inner();
        debug!(count = ids.len(), "Listed running instances");
        Ok(ids)
    }

    /// IDs of attached EBS volumes, at most `limit`
    pub async fn list_volumes(&self, limit: usize) -> Result<Vec<ResourceId>, AwsError> {
        let mut ids = CappedIds::new(limit);
        let mut token = None;

        while !ids.is_full() {
            let response = self
                .client
                .describe_volumes()
                .filters(Filter::builder().name("status").values("in-use").build())
                .max_results(page_size(limit, 5, 500))
                .set_next_token(token.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            for id in response.volumes().iter().filter_map(|v| v.volume_id()) {
                if ids.push(id) {
                    break;
                }
            }

            token = next_token(response.next_token());
            if token.is_none() {
                break;
            }
        }

        let ids = ids.into_inner();
        debug!(count = ids.len(), "Listed volumes");
        Ok(ids)
    }

    /// Names of the regions enabled for the calling account, sorted
    pub async fn list_enabled_regions(&self) -> Result<Vec<String>, AwsError> {
        let response = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let mut regions: Vec<String> = response
            .regions()
            .iter()
            .filter_map(|r| r.region_name().map(str::to_string))
            .collect();
        regions.sort();
        Ok(regions)
    }
}
