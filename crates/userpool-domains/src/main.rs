//! userpool-domains: Cognito user pool domain management around Serverless
//! deploy and remove
//!
//! Each subcommand is one lifecycle hook. The host runs `package` on the
//! compiled template before upload, `deploy` after the stack is deployed and
//! `remove` before the stack is deleted.

use std::backtrace::BacktraceStatus;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use userpool_domains::aws::{AwsContext, CognitoClient, FromAwsContext, StackClient};
use userpool_domains::config::{CliOverrides, HookConfig};
use userpool_domains::hooks::{
    DomainLifecycle, Hook, HookOutcome, OutputFormat, guard, package_template_file, print_status,
};
use userpool_domains_common::ServiceDescription;
use userpool_domains_common::defaults::{DEFAULT_SERVICE_FILE, DEFAULT_TEMPLATE_FILE, LOG_TAG};

/// Log directives used when `RUST_LOG` is unset
const DEFAULT_LOG_DIRECTIVES: &str = "info,aws_config=warn,aws_smithy_runtime=warn,\
aws_sdk_cognitoidentityprovider=warn,aws_sdk_cloudformation=warn";

#[derive(Parser, Debug)]
#[command(name = "userpool-domains")]
#[command(about = "Attach and detach Cognito user pool domains around Serverless deploy and remove")]
#[command(version)]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// Resolved service description (YAML or JSON)
    #[arg(
        long,
        global = true,
        env = "USERPOOL_DOMAINS_SERVICE_FILE",
        default_value = DEFAULT_SERVICE_FILE
    )]
    service: PathBuf,

    /// Deployment stage (overrides provider.stage)
    #[arg(long, global = true)]
    stage: Option<String>,

    /// AWS region (overrides provider.region)
    #[arg(long, global = true)]
    region: Option<String>,

    /// AWS profile to use (overrides provider.profile and AWS_PROFILE)
    #[arg(long, global = true)]
    aws_profile: Option<String>,

    /// Maximum number of domain requests in flight
    #[arg(
        long,
        global = true,
        env = "USERPOOL_DOMAINS_CONCURRENCY",
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    concurrency: Option<usize>,

    /// Exit non-zero when a hook fails or a domain cannot be detached
    #[arg(long, global = true)]
    fail_on_error: bool,
}

impl From<&GlobalArgs> for CliOverrides {
    fn from(args: &GlobalArgs) -> Self {
        Self {
            stage: args.stage.clone(),
            region: args.region.clone(),
            aws_profile: args.aws_profile.clone(),
            concurrency: args.concurrency,
            fail_on_error: args.fail_on_error,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expose every user pool ID as a stack output in the compiled template
    Package {
        /// Compiled CloudFormation template, rewritten in place
        #[arg(long, default_value = DEFAULT_TEMPLATE_FILE)]
        template: PathBuf,
    },

    /// Attach each declared domain to its deployed user pool
    Deploy,

    /// Detach the declared domains before the stack is removed
    Remove,

    /// Show where each declared domain is attached
    Status {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Render a fatal error with one line per cause
fn format_error(e: &anyhow::Error) -> String {
    let mut rendered = format!("{LOG_TAG}: {e}");
    for cause in e.chain().skip(1) {
        rendered.push_str(&format!("\n  caused by: {cause}"));
    }
    rendered
}

fn print_error(e: &anyhow::Error) {
    eprintln!("{}", format_error(e));

    let backtrace = e.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        eprintln!("\nBacktrace:\n{backtrace}");
    }
}

fn init_tracing() -> Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(directives).context("Invalid RUST_LOG")?,
        Err(_) => EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let cli = CliOverrides::from(&args.global);

    match args.command {
        Command::Package { template } => {
            let outcome = guard(Hook::Package, async { package_template_file(&template) }).await;
            settle(outcome, cli.fail_on_error)?;
        }

        Command::Deploy => {
            let service = load_service(&args.global.service)?;
            let config = HookConfig::resolve(&service, &cli);
            let lifecycle = connect(&config).await;

            let outcome = guard(
                Hook::Deploy,
                lifecycle.after_deploy(&service, config.stack_name()),
            )
            .await;
            settle(outcome, config.fail_on_error())?;
        }

        Command::Remove => {
            let service = load_service(&args.global.service)?;
            let config = HookConfig::resolve(&service, &cli);
            let lifecycle = connect(&config).await;

            let outcome = guard(Hook::Remove, lifecycle.before_remove(&service)).await;
            if let Some(report) = settle(outcome, config.fail_on_error())? {
                if report.has_failures() && config.fail_on_error() {
                    anyhow::bail!(
                        "{} of {} user pool domains could not be detached",
                        report.failed,
                        report.matched
                    );
                }
            }
        }

        Command::Status { format } => {
            let service = load_service(&args.global.service)?;
            let config = HookConfig::resolve(&service, &cli);
            let lifecycle = connect(&config).await;

            // A status report that cannot be produced is always an error
            let outcome = guard(Hook::Status, async {
                let statuses = lifecycle.status(&service).await?;
                print_status(&statuses, format)
            })
            .await;
            settle(outcome, true)?;
        }
    }

    Ok(())
}

fn load_service(path: &Path) -> Result<ServiceDescription> {
    ServiceDescription::load(path)
        .with_context(|| format!("Failed to load service description {}", path.display()))
}

/// Build the SDK clients for one invocation
async fn connect(config: &HookConfig) -> DomainLifecycle<CognitoClient, StackClient> {
    if let Some(profile) = config.aws_profile() {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::new(config.region(), config.aws_profile()).await;
    if aws.region().is_none() {
        warn!("No AWS region configured; requests will fail");
    }

    DomainLifecycle::new(
        CognitoClient::from_context(&aws),
        StackClient::from_context(&aws),
        config.concurrency(),
    )
}

/// Turn a hook outcome into the process result.
///
/// A failed hook has already been logged; it only becomes fatal when the
/// invocation asked for it.
fn settle<T>(outcome: HookOutcome<T>, fail_on_error: bool) -> Result<Option<T>> {
    match outcome {
        HookOutcome::Completed(value) => Ok(Some(value)),
        HookOutcome::Failed(e) if fail_on_error => Err(e),
        HookOutcome::Failed(_) => {
            warn!("Hook failed; continuing so the host command can finish");
            Ok(None)
        }
    }
}
