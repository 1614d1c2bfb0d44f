//! CloudWatch metric retrieval

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, classify_sdk_error};
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{self as cw, Dimension};
use chrono::{DateTime, Utc};
use tracing::debug;
use usage_export_common::{Datapoint, MetricSpec, ResourceId, ResourceKind, Statistic, TimeWindow};

pub struct CloudWatchClient {
    client: Client,
}

impl FromAwsContext for CloudWatchClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudwatch_client(),
        }
    }
}

impl CloudWatchClient {
    /// Datapoints for one resource over `window`, sorted by timestamp.
    ///
    /// The resource is addressed by the single dimension its kind uses.
    pub async fn get_datapoints(
        &self,
        kind: ResourceKind,
        resource: &ResourceId,
        spec: &MetricSpec,
        window: TimeWindow,
    ) -> Result<Vec<Datapoint>, AwsError> {
        let statistics: Vec<cw::Statistic> =
            spec.statistics.iter().copied().map(sdk_statistic).collect();

        let response = self
            .client
            .get_metric_statistics()
            .namespace(spec.namespace.as_str())
            .metric_name(&spec.metric_name)
            .dimensions(
                Dimension::builder()
                    .name(kind.dimension_name())
                    .value(resource.as_str())
                    .build(),
            )
            .start_time(AwsDateTime::from_secs(window.start.timestamp()))
            .end_time(AwsDateTime::from_secs(window.end.timestamp()))
            .period(spec.period_seconds)
            .set_statistics(Some(statistics))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let mut datapoints: Vec<Datapoint> = response
            .datapoints()
            .iter()
            .filter_map(|dp| convert_datapoint(dp, &spec.statistics))
            .collect();
        datapoints.sort_by_key(|dp| dp.timestamp);

        debug!(
            resource = %resource,
            metric = %spec.metric_name,
            count = datapoints.len(),
            "Fetched datapoints"
        );
        Ok(datapoints)
    }
}

fn sdk_statistic(statistic: Statistic) -> cw::Statistic {
    match statistic {
        Statistic::Average => cw::Statistic::Average,
        Statistic::Sum => cw::Statistic::Sum,
        Statistic::Minimum => cw::Statistic::Minimum,
        Statistic::Maximum => cw::Statistic::Maximum,
        Statistic::SampleCount => cw::Statistic::SampleCount,
    }
}

/// Keep only the requested statistics; datapoints without a timestamp are
/// dropped.
fn convert_datapoint(dp: &cw::Datapoint, requested: &[Statistic]) -> Option<Datapoint> {
    let ts = dp.timestamp()?;
    let timestamp: DateTime<Utc> = DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())?;

    let datapoint = requested
        .iter()
        .fold(Datapoint::new(timestamp), |acc, &statistic| {
            let value = match statistic {
                Statistic::Average => dp.average(),
                Statistic::Sum => dp.sum(),
                Statistic::Minimum => dp.minimum(),
                Statistic::Maximum => dp.maximum(),
                Statistic::SampleCount => dp.sample_count(),
            };
            match value {
                Some(v) => acc.with_value(statistic, v),
                None => acc,
            }
        });
    Some(datapoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_datapoint_keeps_requested_statistics() {
        let dp = cw::Datapoint::builder()
            .timestamp(AwsDateTime::from_secs(1_709_812_800))
            .average(0.5)
            .maximum(2.0)
            .build();

        let converted = convert_datapoint(&dp, &[Statistic::Average]).unwrap();
        assert_eq!(converted.timestamp.timestamp(), 1_709_812_800);
        assert_eq!(converted.values.len(), 1);
        assert_eq!(converted.values[&Statistic::Average], 0.5);
    }

    #[test]
    fn test_convert_datapoint_without_timestamp() {
        let dp = cw::Datapoint::builder().average(0.5).build();
        assert!(convert_datapoint(&dp, &[Statistic::Average]).is_none());
    }

    #[test]
    fn test_statistic_mapping() {
        assert_eq!(sdk_statistic(Statistic::Average), cw::Statistic::Average);
        assert_eq!(
            sdk_statistic(Statistic::SampleCount),
            cw::Statistic::SampleCount
        );
    }
}
