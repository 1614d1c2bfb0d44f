//! RDS instance enumeration

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, classify_sdk_error};
use crate::aws::paging::{CappedIds, next_token, page_size};
use aws_sdk_rds::Client;
use tracing::debug;
use usage_export_common::ResourceId;

pub struct RdsClient {
    client: Client,
}

impl FromAwsContext for RdsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.rds_client(),
        }
    }
}

impl RdsClient {
    /// DB instance identifiers, at most `limit`
    pub async fn list_db_instances(&self, limit: usize) -> Result<Vec<ResourceId>, AwsError> {
        let mut ids = CappedIds::new(limit);
        let mut marker = None;

        while !ids.is_full() {
            let response = self
                .client
                .describe_db_instances()
                .max_records(page_size(limit, 20, 100))
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| classify_sdk_error(&e))?;

            let identifiers = response
                .db_instances()
                .iter()
                .filter_map(|db| db.db_instance_identifier());
            for id in identifiers {
                if ids.push(id) {
                    break;
                }
            }

            marker = next_token(response.marker());
            if marker.is_none() {
                break;
            }
        }

        let ids = ids.into_inner();
        debug!(count = ids.len(), "Listed DB instances");
        Ok(ids)
    }
}
