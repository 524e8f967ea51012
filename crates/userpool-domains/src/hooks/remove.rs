//! Pre-remove domain detachment
//!
//! Cognito refuses to delete a user pool that still owns a domain, so the
//! domains are detached before the stack goes away. Detachment is best
//! effort: every failure is logged and counted, none is propagated.

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use userpool_domains_common::{DeclaredPools, ServiceDescription};

use super::{DomainLifecycle, DomainTarget, warn_unnamed};
use crate::aws::{CognitoOperations, StackOperations, UserPoolSummary, list_all_user_pools};

/// Result of a single domain detachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachResult {
    /// Domain was detached
    Detached,
    /// Domain was already gone (not found)
    AlreadyDetached,
    /// Detachment failed with error
    Failed,
}

/// Report of a pre-remove detachment batch
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DetachReport {
    /// Listed pools whose name matched a declared pool
    pub matched: usize,
    pub detached: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl DetachReport {
    fn record(&mut self, result: DetachResult) {
        match result {
            DetachResult::Detached => self.detached += 1,
            DetachResult::AlreadyDetached => self.not_found += 1,
            DetachResult::Failed => self.failed += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl<C, S> DomainLifecycle<C, S>
where
    C: CognitoOperations,
    S: StackOperations,
{
    /// Detach the configured domain from every user pool carrying a declared
    /// name.
    ///
    /// Makes no API calls when the service declares no user pools. Only a
    /// listing failure is returned as an error.
    pub async fn before_remove(&self, service: &ServiceDescription) -> Result<DetachReport> {
        let declared = service.declared_user_pools();
        warn_unnamed(&declared);
        if declared.is_empty() {
            info!("No user pools declared, nothing to detach");
            return Ok(DetachReport::default());
        }

        let listed = list_all_user_pools(&self.cognito)
            .await
            .context("Failed to list user pools")?;

        let targets = match_listed_pools(&declared, &listed);
        info!(
            listed = listed.len(),
            matched = targets.len(),
            "Detaching user pool domains"
        );

        let report = detach_domains(&self.cognito, &targets, self.concurrency).await;
        if report.has_failures() {
            warn!(
                failed = report.failed,
                "Some domains could not be detached; removing the stack may fail"
            );
        }
        info!(
            detached = report.detached,
            not_found = report.not_found,
            failed = report.failed,
            "User pool domains detached"
        );
        Ok(report)
    }
}

/// Select the listed pools whose name equals a declared pool's name.
///
/// Several pools may share a name; each of them is a target.
pub fn match_listed_pools(
    declared: &DeclaredPools,
    listed: &[UserPoolSummary],
) -> Vec<DomainTarget> {
    listed
        .iter()
        .filter_map(|pool| {
            declared.by_domain(&pool.name).map(|declared| DomainTarget {
                logical_name: declared.logical_name.clone(),
                user_pool_id: pool.id.clone(),
                domain: declared.domain.clone(),
            })
        })
        .collect()
}

/// Delete a single domain and handle "not found" errors gracefully.
async fn detach_domain<C: CognitoOperations>(
    cognito: &C,
    target: &DomainTarget,
) -> DetachResult {
    match cognito
        .delete_user_pool_domain(&target.domain, &target.user_pool_id)
        .await
    {
        Ok(()) => {
            info!(
                domain = %target.domain,
                user_pool_id = %target.user_pool_id,
                "Domain detached"
            );
            DetachResult::Detached
        }
        Err(e) if e.is_not_found() => {
            info!(
                domain = %target.domain,
                user_pool_id = %target.user_pool_id,
                "Domain already detached"
            );
            DetachResult::AlreadyDetached
        }
        Err(e) => {
            warn!(
                domain = %target.domain,
                user_pool_id = %target.user_pool_id,
                code = ?e.code(),
                error = %e,
                suggestion = ?e.suggestion(),
                "Failed to detach domain"
            );
            DetachResult::Failed
        }
    }
}

/// Delete every domain with at most `concurrency` requests in flight and
/// wait for all of them.
pub async fn detach_domains<C: CognitoOperations>(
    cognito: &C,
    targets: &[DomainTarget],
    concurrency: usize,
) -> DetachReport {
    let results: Vec<DetachResult> = stream::iter(targets)
        .map(|target| detach_domain(cognito, target))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = DetachReport {
        matched: targets.len(),
        ..Default::default()
    };
    for result in results {
        report.record(result);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::cloudformation::MockStackOperations;
    use crate::aws::cognito::MockCognitoOperations;
    use crate::aws::{AwsError, UserPoolPage};
    use mockall::Sequence;
    use userpool_domains_test_utils::fixtures::{SERVICE_WITH_POOLS, SERVICE_WITHOUT_POOLS};

    const FOO_ONLY: &str = r#"
service: auth-service
resources:
  Resources:
    Foo:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: foo-domain
"#;

    fn service(yaml: &str) -> ServiceDescription {
        ServiceDescription::parse(yaml).unwrap()
    }

    fn pool(name: &str, id: &str) -> UserPoolSummary {
        UserPoolSummary {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn single_page(pools: Vec<UserPoolSummary>) -> UserPoolPage {
        UserPoolPage {
            pools,
            next_token: None,
        }
    }

    fn lifecycle(
        cognito: MockCognitoOperations,
    ) -> DomainLifecycle<MockCognitoOperations, MockStackOperations> {
        DomainLifecycle::new(cognito, MockStackOperations::new(), 4)
    }

    #[tokio::test]
    async fn test_deletes_only_matching_pools() {
        let mut cognito = MockCognitoOperations::new();
        cognito.expect_list_user_pools().times(1).returning(|_| {
            Ok(single_page(vec![pool("foo-domain", "x"), pool("other", "y")]))
        });
        cognito
            .expect_delete_user_pool_domain()
            .withf(|domain, id| domain == "foo-domain" && id == "x")
            .times(1)
            .returning(|_, _| Ok(()));

        let report = lifecycle(cognito)
            .before_remove(&service(FOO_ONLY))
            .await
            .unwrap();

        assert_eq!(
            report,
            DetachReport {
                matched: 1,
                detached: 1,
                not_found: 0,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_all_pages_listed_before_deleting() {
        let mut cognito = MockCognitoOperations::new();
        let mut seq = Sequence::new();
        cognito
            .expect_list_user_pools()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(UserPoolPage {
                    pools: vec![pool("other", "y")],
                    next_token: Some("t1".to_string()),
                })
            });
        cognito
            .expect_list_user_pools()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(single_page(vec![pool("bar-domain", "z")])));
        cognito
            .expect_delete_user_pool_domain()
            .withf(|domain, id| domain == "bar-domain" && id == "z")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let report = lifecycle(cognito)
            .before_remove(&service(SERVICE_WITH_POOLS))
            .await
            .unwrap();
        assert_eq!(report.matched, 1);
        assert_eq!(report.detached, 1);
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_propagated() {
        let mut cognito = MockCognitoOperations::new();
        cognito.expect_list_user_pools().returning(|_| {
            Ok(single_page(vec![
                pool("foo-domain", "x"),
                pool("bar-domain", "y"),
                pool("foo-domain", "w"),
            ]))
        });
        cognito
            .expect_delete_user_pool_domain()
            .withf(|_, id| id == "x")
            .times(1)
            .returning(|_, _| {
                Err(AwsError::Sdk {
                    code: Some("AccessDeniedException".to_string()),
                    message: "not authorized".to_string(),
                })
            });
        cognito
            .expect_delete_user_pool_domain()
            .withf(|_, id| id == "y")
            .times(1)
            .returning(|_, _| {
                Err(AwsError::NotFound {
                    message: "No such domain".to_string(),
                })
            });
        cognito
            .expect_delete_user_pool_domain()
            .withf(|_, id| id == "w")
            .times(1)
            .returning(|_, _| Ok(()));

        let report = lifecycle(cognito)
            .before_remove(&service(SERVICE_WITH_POOLS))
            .await
            .unwrap();

        assert_eq!(
            report,
            DetachReport {
                matched: 3,
                detached: 1,
                not_found: 1,
                failed: 1,
            }
        );
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn test_listing_failure_propagates() {
        let mut cognito = MockCognitoOperations::new();
        cognito.expect_list_user_pools().returning(|_| {
            Err(AwsError::Throttled {
                code: "TooManyRequestsException".to_string(),
                message: "Rate exceeded".to_string(),
            })
        });

        let err = lifecycle(cognito)
            .before_remove(&service(SERVICE_WITH_POOLS))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to list user pools");
        assert!(err.downcast_ref::<AwsError>().unwrap().is_throttled());
    }

    #[tokio::test]
    async fn test_no_declared_pools_makes_no_calls() {
        let report = lifecycle(MockCognitoOperations::new())
            .before_remove(&service(SERVICE_WITHOUT_POOLS))
            .await
            .unwrap();
        assert_eq!(report, DetachReport::default());
    }

    #[test]
    fn test_match_listed_pools_keeps_duplicates() {
        let service = service(FOO_ONLY);
        let declared = service.declared_user_pools();
        let listed = vec![
            pool("foo-domain", "a"),
            pool("foo-domain-2", "b"),
            pool("foo-domain", "c"),
        ];

        let ids: Vec<_> = match_listed_pools(&declared, &listed)
            .into_iter()
            .map(|t| t.user_pool_id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
