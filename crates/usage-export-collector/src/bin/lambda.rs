//! Lambda entry point
//!
//! Configuration comes from the environment only; see `EnvArgs` for the
//! variable names.

use std::sync::Arc;

use clap::Parser;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use usage_export_collector::app::build_handler;
use usage_export_collector::config::{EnvArgs, ExportConfig};
use usage_export_collector::{HandlerRequest, HandlerResponse};

#[derive(Parser, Debug)]
#[command(name = "usage-export-lambda")]
struct LambdaEnv {
    #[command(flatten)]
    env: EnvArgs,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        // CloudWatch adds the module path and ingestion time itself
        .with_target(false)
        .without_time()
        .init();

    let args = LambdaEnv::try_parse_from(["usage-export-lambda"])?;
    let config = ExportConfig::try_from(args.env)?;
    let handler = Arc::new(build_handler(config).await);

    run(service_fn(move |event: LambdaEvent<HandlerRequest>| {
        let handler = Arc::clone(&handler);
        async move { Ok::<HandlerResponse, Error>(handler.handle(event.payload).await) }
    }))
    .await
}
