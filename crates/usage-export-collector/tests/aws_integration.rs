//! Integration tests against a real AWS account
//!
//! These only read (identity, regions, resources and metrics) and never
//! write to S3.
//! Run with: AWS_PROFILE=<profile> cargo nextest run --test aws_integration --run-ignored all

use anyhow::Result;
use usage_export_collector::aws::{AwsBackend, AwsContext, SessionProvider, get_current_account_id};
use usage_export_common::defaults::DEFAULT_ASSUME_ROLE_NAME;
use usage_export_common::source::TimeWindow;
use usage_export_common::{
    AccountId, MetricFetcher, MetricFunction, RegionLister, ResourceEnumerator, ResourceKind,
    Target,
};
use usage_export_test_utils::{get_test_account, get_test_region};

async fn home_account(region: &str) -> Result<AccountId> {
    if let Some(account) = get_test_account() {
        return Ok(account);
    }
    let ctx = AwsContext::new(region).await;
    get_current_account_id(ctx.sdk_config()).await
}

async fn backend(region: &str) -> Result<(AwsBackend, AccountId)> {
    let account = home_account(region).await?;
    let sessions = SessionProvider::new(Some(account.clone()), DEFAULT_ASSUME_ROLE_NAME, None);
    Ok((AwsBackend::new(sessions, region), account))
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_caller_identity() -> Result<()> {
    let region = get_test_region();
    let ctx = AwsContext::new(&region).await;

    let account = get_current_account_id(ctx.sdk_config()).await?;
    println!("Caller account: {account}");
    assert_eq!(account.len(), 12);
    Ok(())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_enabled_regions_include_home_region() -> Result<()> {
    let region = get_test_region();
    let (backend, account) = backend(&region).await?;

    let regions = backend.enabled_regions(&account).await?;
    println!("Enabled regions: {regions:?}");
    assert!(regions.contains(&region));
    Ok(())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_enumeration_respects_limit() -> Result<()> {
    let region = get_test_region();
    let (backend, account) = backend(&region).await?;
    let target = Target::new(account, region);

    for kind in [
        ResourceKind::Ec2Instance,
        ResourceKind::EbsVolume,
        ResourceKind::EcsCluster,
        ResourceKind::RdsInstance,
    ] {
        let ids = backend.list_resources(&target, kind, 5).await?;
        println!("{kind}: {} resources", ids.len());
        assert!(ids.len() <= 5);
    }
    Ok(())
}

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn test_fetch_cpu_utilization_for_first_instance() -> Result<()> {
    let region = get_test_region();
    let (backend, account) = backend(&region).await?;
    let target = Target::new(account, region);

    let ids = backend
        .list_resources(&target, ResourceKind::Ec2Instance, 1)
        .await?;
    let Some(instance) = ids.first() else {
        println!("No running instances in {target}, skipping");
        return Ok(());
    };

    let function = MetricFunction::CpuUtilization;
    let datapoints = backend
        .fetch_datapoints(
            &target,
            function.resource_kind(),
            instance,
            &function.spec(),
            TimeWindow::last_day(),
        )
        .await?;
    println!("{instance}: {} datapoints", datapoints.len());
    assert!(datapoints.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    Ok(())
}
