//! Wiring of the AWS-backed handler shared by both binaries

use tracing::{info, warn};

use crate::aws::{AwsBackend, AwsContext, S3Client, SessionProvider, get_current_account_id};
use crate::collector::Collector;
use crate::config::ExportConfig;
use crate::handler::Handler;
use crate::runner::{JobRunner, NoCarbonSource};
use crate::sink::Sink;

/// Handler talking to real AWS services
pub type AwsHandler = Handler<AwsBackend, AwsBackend, S3Client, NoCarbonSource>;

/// Resolve the home account and build the handler.
///
/// If the caller identity cannot be resolved every account is reached through
/// the assumed role, and a configuration without accounts rejects every
/// request.
pub async fn build_handler(config: ExportConfig) -> AwsHandler {
    let home = AwsContext::with_profile(&config.aws.home_region, config.aws.aws_profile.as_deref())
        .await;
    let home_account = match get_current_account_id(home.sdk_config()).await {
        Ok(account) => Some(account),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "Could not resolve the home account");
            None
        }
    };
    let config = config.with_home_account(home_account.as_ref());

    let sessions = SessionProvider::new(
        home_account,
        config.aws.role_name.clone(),
        config.aws.aws_profile.clone(),
    );
    let backend = AwsBackend::new(sessions, config.aws.home_region.clone());
    let store = backend.object_store().await;

    info!(
        accounts = config.targets.accounts.len(),
        regions = ?config.targets.regions,
        bucket = ?config.output.bucket,
        output = %config.output.output_path.display(),
        "Export configured"
    );

    let collector = Collector::new(backend.clone(), backend, config.collector);
    let sink = Sink::new(config.output.output_path, config.output.bucket, store);
    Handler::new(JobRunner::new(collector, sink, NoCarbonSource), config.targets)
}
