//! Configuration types for the lifecycle hooks
//!
//! Values come from three places, in order of precedence: command-line
//! flags, the service description (`provider` and `custom.userPoolDomains`),
//! then built-in defaults. Region and profile fall through to the AWS SDK's
//! own resolution when nobody sets them.

use userpool_domains_common::ServiceDescription;
use userpool_domains_common::defaults::DEFAULT_CONCURRENCY;

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub stage: Option<String>,
    pub region: Option<String>,
    pub aws_profile: Option<String>,
    pub concurrency: Option<usize>,
    pub fail_on_error: bool,
}

/// Location of the deployed stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackConfig {
    /// Deployment stage
    pub stage: String,
    /// CloudFormation stack name
    pub stack_name: String,
    /// AWS region (None = SDK default chain)
    pub region: Option<String>,
    /// AWS profile name (None = SDK default chain)
    pub aws_profile: Option<String>,
}

/// Domain batch behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum number of domain requests in flight at once
    pub concurrency: usize,
    /// Exit non-zero when a hook fails or a detachment fails
    pub fail_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fail_on_error: false,
        }
    }
}

/// Resolved configuration for one hook invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    pub stack: StackConfig,
    pub batch: BatchConfig,
}

impl HookConfig {
    /// Merge command-line overrides with the service description
    pub fn resolve(service: &ServiceDescription, cli: &CliOverrides) -> Self {
        let stage = cli
            .stage
            .clone()
            .unwrap_or_else(|| service.stage().to_string());
        let stack_name = service.stack_name(&stage);
        let settings = service.settings();

        Self {
            stack: StackConfig {
                stack_name,
                stage,
                region: cli
                    .region
                    .clone()
                    .or_else(|| service.provider.region.clone()),
                aws_profile: cli
                    .aws_profile
                    .clone()
                    .or_else(|| service.provider.profile.clone()),
            },
            batch: BatchConfig {
                concurrency: cli
                    .concurrency
                    .or(settings.concurrency)
                    .unwrap_or(DEFAULT_CONCURRENCY)
                    .max(1),
                fail_on_error: cli.fail_on_error || settings.fail_on_error.unwrap_or(false),
            },
        }
    }

    pub fn stack_name(&self) -> &str {
        &self.stack.stack_name
    }

    pub fn region(&self) -> Option<&str> {
        self.stack.region.as_deref()
    }

    pub fn aws_profile(&self) -> Option<&str> {
        self.stack.aws_profile.as_deref()
    }

    pub fn concurrency(&self) -> usize {
        self.batch.concurrency
    }

    pub fn fail_on_error(&self) -> bool {
        self.batch.fail_on_error
    }
}
