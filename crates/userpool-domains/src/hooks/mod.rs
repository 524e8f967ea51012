//! Serverless lifecycle hooks
//!
//! Each hook is a stateless one-shot action:
//!
//! - [`package`]: expose every user pool ID as a stack output
//! - [`deploy`]: attach each pool's domain once the stack is deployed
//! - [`remove`]: detach the domains before the stack is deleted
//! - [`status`]: report where each declared domain is attached
//!
//! Hooks run under [`guard`], which logs failures instead of letting them
//! take down the host command.

pub mod deploy;
pub mod package;
pub mod remove;
pub mod status;

use std::fmt;
use std::future::Future;

use anyhow::Result;
use tracing::{Instrument, error, info, info_span, warn};
use userpool_domains_common::DeclaredPools;
use userpool_domains_common::defaults::LOG_TAG;

use crate::aws::{CognitoOperations, StackOperations};

pub use deploy::{AttachReport, attach_domains, resolve_targets};
pub use package::{finalize_template, package_template_file};
pub use remove::{DetachReport, DetachResult, detach_domains, match_listed_pools};
pub use status::{OutputFormat, PoolStatus, print_status, render_status};

/// Lifecycle hook points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Template finalization, before the template is uploaded
    Package,
    /// After the stack has been deployed
    Deploy,
    /// Before the stack is removed
    Remove,
    /// Read-only status report
    Status,
}

impl Hook {
    pub fn as_str(self) -> &'static str {
        match self {
            Hook::Package => "package",
            Hook::Deploy => "deploy",
            Hook::Remove => "remove",
            Hook::Status => "status",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a guarded hook
#[derive(Debug)]
pub enum HookOutcome<T> {
    /// Hook finished and produced a report
    Completed(T),
    /// Hook failed; the error has already been logged
    Failed(anyhow::Error),
}

/// Run a hook inside the tagged span and catch its failure.
///
/// Every log line emitted by the hook carries the `userpool-domains` span.
/// A failure is logged with its full cause chain and handed back to the
/// caller, which decides whether it is fatal.
pub async fn guard<T, F>(hook: Hook, future: F) -> HookOutcome<T>
where
    F: Future<Output = Result<T>>,
{
    let span = info_span!(LOG_TAG, hook = %hook);
    async move {
        match future.await {
            Ok(value) => {
                info!("Hook completed");
                HookOutcome::Completed(value)
            }
            Err(e) => {
                error!(error = ?e, "Hook failed");
                HookOutcome::Failed(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// A domain paired with the user pool it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTarget {
    /// Logical resource name of the user pool
    pub logical_name: String,
    /// Physical user pool ID
    pub user_pool_id: String,
    /// Custom domain (the pool's configured name)
    pub domain: String,
}

/// Domain lifecycle driver bound to one invocation's clients
pub struct DomainLifecycle<C, S> {
    cognito: C,
    stacks: S,
    concurrency: usize,
}

impl<C, S> DomainLifecycle<C, S>
where
    C: CognitoOperations,
    S: StackOperations,
{
    /// Create a driver; `concurrency` is clamped to at least 1
    pub fn new(cognito: C, stacks: S, concurrency: usize) -> Self {
        Self {
            cognito,
            stacks,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

/// Warn about declared pools whose domain cannot be determined
pub(crate) fn warn_unnamed(declared: &DeclaredPools) {
    for logical_name in declared.unnamed() {
        warn!(
            logical_name = %logical_name,
            "User pool has no literal UserPoolName; skipping its domain"
        );
    }
}
