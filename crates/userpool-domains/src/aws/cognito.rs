//! Cognito user pool and domain management

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, classify_sdk_error};
use aws_sdk_cognitoidentityprovider::Client;
use tracing::debug;
use userpool_domains_common::defaults::LIST_USER_POOLS_PAGE_SIZE;

/// A user pool as returned by `ListUserPools`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPoolSummary {
    pub id: String,
    pub name: String,
}

/// One page of `ListUserPools`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPoolPage {
    pub pools: Vec<UserPoolSummary>,
    /// Continuation token; `None` on the last page
    pub next_token: Option<String>,
}

/// Current owner of a custom domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainDescription {
    pub user_pool_id: String,
    pub status: Option<String>,
}

/// Trait for Cognito operations that can be mocked in tests.
///
/// Note: `next_token` is `Option<String>` instead of `Option<&str>` to work
/// around mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait CognitoOperations: Send + Sync {
    /// Fetch one page of user pools visible to the account
    async fn list_user_pools(&self, next_token: Option<String>) -> Result<UserPoolPage, AwsError>;

    /// Attach a custom domain to a user pool
    async fn create_user_pool_domain(
        &self,
        domain: &str,
        user_pool_id: &str,
    ) -> Result<(), AwsError>;

    /// Detach a custom domain from a user pool
    async fn delete_user_pool_domain(
        &self,
        domain: &str,
        user_pool_id: &str,
    ) -> Result<(), AwsError>;

    /// Look up which user pool a domain is attached to, if any
    async fn describe_user_pool_domain(
        &self,
        domain: &str,
    ) -> Result<Option<DomainDescription>, AwsError>;
}

/// List every user pool visible to the account.
///
/// Follows continuation tokens until the service stops returning one and
/// aggregates all pages before returning.
pub async fn list_all_user_pools<C: CognitoOperations>(
    cognito: &C,
) -> Result<Vec<UserPoolSummary>, AwsError> {
    let mut pools = Vec::new();
    let mut next_token = None;
    let mut pages = 0u32;

    loop {
        let page = cognito.list_user_pools(next_token.take()).await?;
        pages += 1;
        pools.extend(page.pools);

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    debug!(count = pools.len(), pages, "Listed user pools");
    Ok(pools)
}

/// Cognito client for managing user pool domains
pub struct CognitoClient {
    client: Client,
}

impl FromAwsContext for CognitoClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.cognito_client(),
        }
    }
}

impl CognitoOperations for CognitoClient {
    async fn list_user_pools(&self, next_token: Option<String>) -> Result<UserPoolPage, AwsError> {
        let response = self
            .client
            .list_user_pools()
            .max_results(LIST_USER_POOLS_PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let pools = response
            .user_pools()
            .iter()
            .filter_map(|pool| match (pool.id(), pool.name()) {
                (Some(id), Some(name)) => Some(UserPoolSummary {
                    id: id.to_string(),
                    name: name.to_string(),
                }),
                _ => {
                    debug!(pool = ?pool, "Skipping user pool without id or name");
                    None
                }
            })
            .collect();

        Ok(UserPoolPage {
            pools,
            next_token: response.next_token().map(|s| s.to_string()),
        })
    }

    async fn create_user_pool_domain(
        &self,
        domain: &str,
        user_pool_id: &str,
    ) -> Result<(), AwsError> {
        debug!(domain = %domain, user_pool_id = %user_pool_id, "Creating user pool domain");

        let response = self
            .client
            .create_user_pool_domain()
            .domain(domain)
            .user_pool_id(user_pool_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        debug!(
            domain = %domain,
            cloud_front_domain = ?response.cloud_front_domain(),
            "User pool domain created"
        );
        Ok(())
    }

    async fn delete_user_pool_domain(
        &self,
        domain: &str,
        user_pool_id: &str,
    ) -> Result<(), AwsError> {
        debug!(domain = %domain, user_pool_id = %user_pool_id, "Deleting user pool domain");

        self.client
            .delete_user_pool_domain()
            .domain(domain)
            .user_pool_id(user_pool_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(())
    }

    async fn describe_user_pool_domain(
        &self,
        domain: &str,
    ) -> Result<Option<DomainDescription>, AwsError> {
        let response = self
            .client
            .describe_user_pool_domain()
            .domain(domain)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        // An unknown domain comes back as an empty description, not an error
        let description = response.domain_description().and_then(|d| {
            d.user_pool_id().map(|user_pool_id| DomainDescription {
                user_pool_id: user_pool_id.to_string(),
                status: d.status().map(|s| s.as_str().to_string()),
            })
        });

        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn page(pools: &[(&str, &str)], next_token: Option<&str>) -> UserPoolPage {
        UserPoolPage {
            pools: pools
                .iter()
                .map(|(id, name)| UserPoolSummary {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            next_token: next_token.map(|s| s.to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_follows_every_token() {
        let mut cognito = MockCognitoOperations::new();
        let mut seq = mockall::Sequence::new();
        cognito
            .expect_list_user_pools()
            .with(eq(None))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(page(&[("a", "pool-a")], Some("t1"))));
        cognito
            .expect_list_user_pools()
            .with(eq(Some("t1".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(page(&[("b", "pool-b"), ("c", "pool-c")], Some("t2"))));
        cognito
            .expect_list_user_pools()
            .with(eq(Some("t2".to_string())))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(page(&[("d", "pool-d")], None)));

        let pools = list_all_user_pools(&cognito).await.unwrap();
        let ids: Vec<_> = pools.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_list_stops_on_empty_token() {
        let mut cognito = MockCognitoOperations::new();
        cognito
            .expect_list_user_pools()
            .times(1)
            .returning(|_| Ok(page(&[("a", "pool-a")], Some(""))));

        let pools = list_all_user_pools(&cognito).await.unwrap();
        assert_eq!(pools.len(), 1);
    }

    #[tokio::test]
    async fn test_list_error_propagates() {
        let mut cognito = MockCognitoOperations::new();
        let mut seq = mockall::Sequence::new();
        cognito
            .expect_list_user_pools()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(page(&[("a", "pool-a")], Some("t1"))));
        cognito
            .expect_list_user_pools()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(AwsError::Throttled {
                    code: "TooManyRequestsException".to_string(),
                    message: "Rate exceeded".to_string(),
                })
            });

        let err = list_all_user_pools(&cognito).await.unwrap_err();
        assert!(err.is_throttled());
    }
}
