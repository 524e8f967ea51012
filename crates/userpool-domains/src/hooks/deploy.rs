//! Post-deploy domain attachment

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};
use userpool_domains_common::{DeclaredPools, OutputMapping, ServiceDescription};

use super::{DomainLifecycle, DomainTarget, warn_unnamed};
use crate::aws::{CognitoOperations, StackOperations, StackOutput};

/// Report of a post-deploy attachment batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttachReport {
    /// Domains resolved from stack outputs
    pub targets: usize,
    /// Domains newly attached
    pub attached: usize,
    /// Domains that already existed
    pub already_present: usize,
}

impl<C, S> DomainLifecycle<C, S>
where
    C: CognitoOperations,
    S: StackOperations,
{
    /// Attach the configured domain to every deployed user pool.
    ///
    /// Makes no API calls when the service declares no user pools.
    pub async fn after_deploy(
        &self,
        service: &ServiceDescription,
        stack_name: &str,
    ) -> Result<AttachReport> {
        let declared = service.declared_user_pools();
        warn_unnamed(&declared);
        if declared.is_empty() {
            info!("No user pools declared, nothing to attach");
            return Ok(AttachReport::default());
        }

        let mapping = OutputMapping::for_resources(declared.logical_names());
        let outputs = self
            .stacks
            .describe_stack_outputs(stack_name)
            .await
            .with_context(|| format!("Failed to read outputs of stack {stack_name}"))?;

        let targets = resolve_targets(&declared, &mapping, &outputs);
        info!(
            stack = %stack_name,
            declared = declared.len(),
            targets = targets.len(),
            "Attaching user pool domains"
        );

        let report = attach_domains(&self.cognito, &targets, self.concurrency).await?;
        info!(
            attached = report.attached,
            already_present = report.already_present,
            "User pool domains attached"
        );
        Ok(report)
    }
}

/// Pair each deployed user pool ID with its declared domain.
///
/// Declared pools without a matching stack output are logged and skipped.
pub fn resolve_targets(
    declared: &DeclaredPools,
    mapping: &OutputMapping,
    outputs: &[StackOutput],
) -> Vec<DomainTarget> {
    let resolved = mapping.resolve(outputs.iter().map(|o| (o.key.as_str(), o.value.as_str())));

    for pool in declared.iter() {
        if !resolved.iter().any(|r| r.logical_name == pool.logical_name) {
            warn!(
                logical_name = %pool.logical_name,
                output_key = ?mapping.output_key(&pool.logical_name).map(|k| k.as_str()),
                "Stack has no output for user pool; was the template packaged with this tool?"
            );
        }
    }

    resolved
        .into_iter()
        .filter_map(|output| {
            declared.get(&output.logical_name).map(|pool| DomainTarget {
                logical_name: output.logical_name,
                user_pool_id: output.user_pool_id,
                domain: pool.domain.clone(),
            })
        })
        .collect()
}

/// Create every domain with at most `concurrency` requests in flight.
///
/// "Domain already exists" counts as success. Any other failure stops the
/// batch: requests still in flight are dropped, nothing further is sent, and
/// the error is returned.
pub async fn attach_domains<C: CognitoOperations>(
    cognito: &C,
    targets: &[DomainTarget],
    concurrency: usize,
) -> Result<AttachReport> {
    let mut report = AttachReport {
        targets: targets.len(),
        ..Default::default()
    };

    let mut requests = stream::iter(targets)
        .map(|target| async move {
            let result = cognito
                .create_user_pool_domain(&target.domain, &target.user_pool_id)
                .await;
            (target, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((target, result)) = requests.next().await {
        match result {
            Ok(()) => {
                info!(
                    domain = %target.domain,
                    user_pool_id = %target.user_pool_id,
                    "Domain attached"
                );
                report.attached += 1;
            }
            Err(e) if e.is_already_exists() => {
                info!(
                    domain = %target.domain,
                    user_pool_id = %target.user_pool_id,
                    "Domain already exists"
                );
                report.already_present += 1;
            }
            Err(e) => {
                error!(
                    domain = %target.domain,
                    user_pool_id = %target.user_pool_id,
                    code = ?e.code(),
                    error = %e,
                    suggestion = ?e.suggestion(),
                    "Failed to attach domain"
                );
                return Err(anyhow::Error::new(e).context(format!(
                    "Failed to attach domain '{}' to user pool {}",
                    target.domain, target.user_pool_id
                )));
            }
        }
    }

    Ok(report)
}
