//! usage-export: CloudWatch usage and carbon footprint export
//!
//! Runs the same jobs as the Lambda entry point from the command line and
//! prints a summary table when done.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tracing::info;
use usage_export_collector::app::build_handler;
use usage_export_collector::config::{EnvArgs, ExportConfig};
use usage_export_collector::summary::print_summary;
use usage_export_collector::{HandlerRequest, Job, Service};
use usage_export_common::defaults::{DEFAULT_PERIOD_SECONDS, METRIC_SERVICE_NAME};
use usage_export_common::{
    AwsError, CollectionRequest, MetricSpec, Namespace, RequestError, Statistic,
};

#[derive(Parser, Debug)]
#[command(name = "usage-export")]
#[command(about = "Export AWS usage metrics and carbon footprint data")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for a free-form metric collection
#[derive(clap::Args, Debug)]
struct CollectArgs {
    /// CloudWatch namespace (AWS/EC2, CWAgent, AWS/EBS, AWS/ECS, AWS/RDS)
    #[arg(long)]
    namespace: Namespace,

    /// CloudWatch metric name
    #[arg(long)]
    metric_name: String,

    /// Statistics to request (repeatable)
    #[arg(long = "statistic", default_value = "Average")]
    statistics: Vec<Statistic>,

    /// Period in seconds
    #[arg(long, default_value_t = DEFAULT_PERIOD_SECONDS)]
    period: i32,

    /// Function name for the output file (default: the metric name)
    #[arg(long)]
    function_name: Option<String>,

    #[command(flatten)]
    env: EnvArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every job of a named service
    Run {
        /// Service name, e.g. CPUUtilization or rds_cpu_utilization
        #[arg(short, long)]
        service: String,

        #[command(flatten)]
        env: EnvArgs,
    },

    /// Collect an arbitrary CloudWatch metric
    Collect(Box<CollectArgs>),

    /// List supported services and the jobs they run
    Services,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print the error chain, then a hint for errors users can fix themselves
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\n\x1b[1;31mExport failed:\x1b[0m {e}");
    for cause in e.chain().skip(1) {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
    }

    if let Some(hint) = error_hint(e) {
        let _ = writeln!(stderr, "\n\x1b[2m{hint}\x1b[0m");
    }
}

fn error_hint(e: &anyhow::Error) -> Option<&'static str> {
    e.chain().find_map(|cause| {
        if let Some(aws) = cause.downcast_ref::<AwsError>() {
            return match aws {
                AwsError::InvalidCredentials { .. } => {
                    Some("Check AWS_PROFILE or run `aws sso login` for the home account")
                }
                AwsError::AccessDenied { .. } => Some(
                    "Member accounts need the collection role (see --role-name) \
                     trusted by the home account",
                ),
                _ => None,
            };
        }
        cause
            .downcast_ref::<RequestError>()
            .map(|_| "Run `usage-export services` to list the supported services")
    })
}

async fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
                // Reduce noise from AWS SDK (show only warnings and errors)
                .add_directive("aws_config=warn".parse()?)
                .add_directive("aws_smithy_runtime=warn".parse()?),
        )
        .init();

    match args.command {
        Command::Run { service, env } => handle_run(service, env).await,
        Command::Collect(collect_args) => handle_collect(*collect_args).await,
        Command::Services => {
            print_services();
            Ok(())
        }
    }
}

/// Handle the run command
async fn handle_run(service: String, env: EnvArgs) -> Result<()> {
    let config = ExportConfig::try_from(env)?;
    let handler = build_handler(config).await;

    let response = handler.handle(HandlerRequest::for_service(service)).await;
    let Some(reports) = response.reports() else {
        bail!("Request rejected ({}): {}", response.status_code, response.body);
    };
    print_summary(&reports);

    if !response.is_success() {
        bail!("Every job failed (status {})", response.status_code);
    }
    Ok(())
}

/// Handle the collect command
async fn handle_collect(args: CollectArgs) -> Result<()> {
    let config = ExportConfig::try_from(args.env)?;
    let handler = build_handler(config).await;

    let (accounts, regions) = match handler.resolve_targets(&HandlerRequest::default()).await {
        Ok(targets) => targets,
        Err(response) => bail!("Invalid targets ({}): {}", response.status_code, response.body),
    };

    let spec = MetricSpec {
        namespace: args.namespace,
        metric_name: args.metric_name.clone(),
        statistics: args.statistics,
        period_seconds: args.period,
    };
    let function_name = args
        .function_name
        .unwrap_or_else(|| args.metric_name.to_lowercase());
    let request = CollectionRequest::builder()
        .accounts(accounts)
        .regions(regions)
        .service_name(METRIC_SERVICE_NAME)
        .function_name(&function_name)
        .metric_spec(spec)
        .build()
        .context("Invalid collection request")?;

    info!(function = %function_name, "Collecting custom metric");
    let report = handler.runner().run_request(&request).await?;
    let failed = report.status.is_failed();
    print_summary(&BTreeMap::from([(function_name, report)]));

    if failed {
        bail!("Every collection unit failed");
    }
    Ok(())
}

/// Print the service registry
fn print_services() {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Service"),
            Cell::new("Job"),
            Cell::new("Option"),
            Cell::new("Namespace"),
            Cell::new("Metric"),
        ]);

    for service in Service::ALL {
        for job in service.jobs() {
            let (option, namespace, metric) = match job {
                Job::Metric(function) => (
                    function.option().to_string(),
                    function.namespace().to_string(),
                    function.metric_name().to_string(),
                ),
                Job::CarbonFootprint => ("-".into(), "-".into(), "-".into()),
            };
            table.add_row(vec![
                Cell::new(service.job_key(job)),
                Cell::new(job),
                Cell::new(option),
                Cell::new(namespace),
                Cell::new(metric),
            ]);
        }
    }

    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_hint_follows_the_chain() {
        let err = anyhow::Error::new(AwsError::InvalidCredentials {
            message: "expired".to_string(),
        })
        .context("Failed to enumerate instances");
        assert!(error_hint(&err).unwrap().contains("AWS_PROFILE"));

        let err = anyhow::Error::new(RequestError::UnsupportedService("ec2".to_string()));
        assert!(error_hint(&err).unwrap().contains("usage-export services"));

        assert_eq!(error_hint(&anyhow!("disk full")), None);
        assert_eq!(error_hint(&anyhow::Error::new(AwsError::Throttled)), None);
    }

    #[test]
    fn test_cli_parses_run() {
        let args = Args::try_parse_from([
            "usage-export",
            "run",
            "--service",
            "rds_cpu_utilization",
            "--regions",
            "ca-central-1",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Run { ref service, .. } if service == "rds_cpu_utilization"
        ));
    }

    #[test]
    fn test_cli_parses_collect() {
        let args = Args::try_parse_from([
            "usage-export",
            "collect",
            "--namespace",
            "AWS/EC2",
            "--metric-name",
            "DiskReadOps",
            "--statistic",
            "Sum",
            "--statistic",
            "Maximum",
        ])
        .unwrap();
        let Command::Collect(collect) = args.command else {
            panic!("expected collect");
        };
        assert_eq!(collect.namespace, Namespace::Ec2);
        assert_eq!(collect.statistics, [Statistic::Sum, Statistic::Maximum]);
        assert_eq!(collect.period, DEFAULT_PERIOD_SECONDS);
    }
}
