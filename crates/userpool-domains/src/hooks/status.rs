//! Read-only domain status report

use anyhow::{Context, Result};
use clap::ValueEnum;
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};
use userpool_domains_common::ServiceDescription;

use super::{DomainLifecycle, warn_unnamed};
use crate::aws::{CognitoOperations, StackOperations, list_all_user_pools};

/// Status of one declared user pool and its domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub logical_name: String,
    pub domain: String,
    /// IDs of listed pools carrying the declared name
    pub matching_pool_ids: Vec<String>,
    /// Pool the domain is currently attached to, if any
    pub attached_to: Option<String>,
    /// Domain status reported by Cognito (e.g. `ACTIVE`)
    pub domain_status: Option<String>,
}

impl PoolStatus {
    /// The domain is attached to one of the pools carrying the declared name
    pub fn is_attached(&self) -> bool {
        self.attached_to
            .as_ref()
            .is_some_and(|id| self.matching_pool_ids.contains(id))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl<C, S> DomainLifecycle<C, S>
where
    C: CognitoOperations,
    S: StackOperations,
{
    /// Report where each declared domain is attached.
    ///
    /// Rows are ordered by logical resource name.
    pub async fn status(&self, service: &ServiceDescription) -> Result<Vec<PoolStatus>> {
        let declared = service.declared_user_pools();
        warn_unnamed(&declared);
        if declared.is_empty() {
            info!("No user pools declared");
            return Ok(Vec::new());
        }

        let listed = list_all_user_pools(&self.cognito)
            .await
            .context("Failed to list user pools")?;

        let cognito = &self.cognito;
        let statuses: Vec<PoolStatus> = stream::iter(declared.iter())
            .map(|pool| {
                let matching_pool_ids: Vec<String> = listed
                    .iter()
                    .filter(|listed| listed.name == pool.domain)
                    .map(|listed| listed.id.clone())
                    .collect();
                async move {
                    let description = cognito
                        .describe_user_pool_domain(&pool.domain)
                        .await
                        .with_context(|| format!("Failed to describe domain '{}'", pool.domain))?;
                    debug!(domain = %pool.domain, description = ?description, "Described domain");

                    Ok::<_, anyhow::Error>(PoolStatus {
                        logical_name: pool.logical_name.clone(),
                        domain: pool.domain.clone(),
                        matching_pool_ids,
                        attached_to: description.as_ref().map(|d| d.user_pool_id.clone()),
                        domain_status: description.and_then(|d| d.status),
                    })
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        Ok(statuses)
    }
}

/// Render a status report as a table or pretty JSON
pub fn render_status(statuses: &[PoolStatus], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(statuses).context("Failed to serialize status report")
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Resource"),
                    Cell::new("Domain"),
                    Cell::new("Matching Pools"),
                    Cell::new("Attached To"),
                    Cell::new("Status"),
                ]);

            for status in statuses {
                let matching = if status.matching_pool_ids.is_empty() {
                    "-".to_string()
                } else {
                    status.matching_pool_ids.join(", ")
                };
                table.add_row(vec![
                    Cell::new(&status.logical_name),
                    Cell::new(&status.domain),
                    Cell::new(&matching),
                    Cell::new(status.attached_to.as_deref().unwrap_or("-")),
                    Cell::new(status.domain_status.as_deref().unwrap_or("-")),
                ]);
            }

            Ok(table.to_string())
        }
    }
}

/// Print a status report to stdout
pub fn print_status(statuses: &[PoolStatus], format: OutputFormat) -> Result<()> {
    if statuses.is_empty() && format == OutputFormat::Table {
        println!("No user pools declared");
        return Ok(());
    }
    println!("{}", render_status(statuses, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::cloudformation::MockStackOperations;
    use crate::aws::cognito::MockCognitoOperations;
    use crate::aws::{AwsError, DomainDescription, UserPoolPage, UserPoolSummary};
    use userpool_domains_test_utils::fixtures::{SERVICE_WITH_POOLS, SERVICE_WITHOUT_POOLS};

    fn listed() -> UserPoolPage {
        UserPoolPage {
            pools: vec![
                UserPoolSummary {
                    id: "id1".to_string(),
                    name: "foo-domain".to_string(),
                },
                UserPoolSummary {
                    id: "id2".to_string(),
                    name: "bar-domain".to_string(),
                },
            ],
            next_token: None,
        }
    }

    fn foo_status() -> PoolStatus {
        PoolStatus {
            logical_name: "Foo".to_string(),
            domain: "foo-domain".to_string(),
            matching_pool_ids: vec!["id1".to_string()],
            attached_to: Some("id1".to_string()),
            domain_status: Some("ACTIVE".to_string()),
        }
    }

    #[tokio::test]
    async fn test_status_reports_each_declared_pool() {
        let mut cognito = MockCognitoOperations::new();
        cognito
            .expect_list_user_pools()
            .times(1)
            .returning(|_| Ok(listed()));
        cognito
            .expect_describe_user_pool_domain()
            .withf(|domain| domain == "foo-domain")
            .returning(|_| {
                Ok(Some(DomainDescription {
                    user_pool_id: "id1".to_string(),
                    status: Some("ACTIVE".to_string()),
                }))
            });
        cognito
            .expect_describe_user_pool_domain()
            .withf(|domain| domain == "bar-domain")
            .returning(|_| Ok(None));

        let lifecycle = DomainLifecycle::new(cognito, MockStackOperations::new(), 2);
        let service = ServiceDescription::parse(SERVICE_WITH_POOLS).unwrap();
        let mut statuses = lifecycle.status(&service).await.unwrap();
        statuses.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].logical_name, "Bar");
        assert_eq!(statuses[0].attached_to, None);
        assert!(!statuses[0].is_attached());
        assert_eq!(statuses[1], foo_status());
        assert!(statuses[1].is_attached());
    }

    #[tokio::test]
    async fn test_status_describe_failure_propagates() {
        let mut cognito = MockCognitoOperations::new();
        cognito.expect_list_user_pools().returning(|_| Ok(listed()));
        cognito.expect_describe_user_pool_domain().returning(|_| {
            Err(AwsError::Sdk {
                code: Some("AccessDeniedException".to_string()),
                message: "denied".to_string(),
            })
        });

        let lifecycle = DomainLifecycle::new(cognito, MockStackOperations::new(), 1);
        let service = ServiceDescription::parse(SERVICE_WITH_POOLS).unwrap();
        let err = lifecycle.status(&service).await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to describe domain"));
    }

    #[tokio::test]
    async fn test_status_without_pools_makes_no_calls() {
        let lifecycle = DomainLifecycle::new(
            MockCognitoOperations::new(),
            MockStackOperations::new(),
            4,
        );
        let service = ServiceDescription::parse(SERVICE_WITHOUT_POOLS).unwrap();
        assert!(lifecycle.status(&service).await.unwrap().is_empty());
    }

    #[test]
    fn test_render_table() {
        let rendered = render_status(&[foo_status()], OutputFormat::Table).unwrap();
        assert!(rendered.contains("Matching Pools"));
        assert!(rendered.contains("foo-domain"));
        assert!(rendered.contains("ACTIVE"));
    }

    #[test]
    fn test_render_json() {
        let rendered = render_status(&[foo_status()], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value[0]["logical_name"], "Foo");
        assert_eq!(value[0]["matching_pool_ids"][0], "id1");
        assert_eq!(value[0]["attached_to"], "id1");
    }
}
