//! CloudFormation stack output lookup

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, classify_sdk_error};
use aws_sdk_cloudformation::Client;
use tracing::debug;

/// A single stack output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Trait for CloudFormation operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait StackOperations: Send + Sync {
    /// Outputs of a deployed stack
    async fn describe_stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>, AwsError>;
}

/// CloudFormation client for reading deployed stacks
pub struct StackClient {
    client: Client,
}

impl FromAwsContext for StackClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cloudformation_client(),
        }
    }
}

impl StackOperations for StackClient {
    async fn describe_stack_outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>, AwsError> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let stack = response.stacks().first().ok_or_else(|| AwsError::NotFound {
            message: format!("Stack {stack_name} not found"),
        })?;

        // Outputs without a key or value cannot name a user pool
        let outputs: Vec<StackOutput> = stack
            .outputs()
            .iter()
            .filter_map(|output| match (output.output_key(), output.output_value()) {
                (Some(key), Some(value)) => Some(StackOutput::new(key, value)),
                _ => None,
            })
            .collect();

        debug!(stack = %stack_name, count = outputs.len(), "Read stack outputs");
        Ok(outputs)
    }
}
