//! Resolved service description
//!
//! The deployment framework resolves `serverless.yml` (variables, includes)
//! into a single document, e.g. via `serverless print`. This module reads that
//! document, YAML or JSON, and extracts the Cognito user pools it declares.
//! Sections other than `service`, `provider`, `resources` and `custom` are
//! ignored.

use crate::defaults::{DEFAULT_STAGE, USER_POOL_NAME_PROPERTY, USER_POOL_RESOURCE_TYPE};
use crate::error::ServiceError;
use garde::Validate;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Resolved service description
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceDescription {
    service: ServiceName,

    /// Provider section (stage, region, profile, stack name)
    #[serde(default)]
    pub provider: ProviderSection,

    /// One CloudFormation fragment or a list of them. Kept as a raw value
    /// because short-form intrinsics (`!Ref`, `!Sub`) arrive as YAML tags.
    #[serde(default)]
    resources: Option<Value>,

    /// `custom` section; only `custom.userPoolDomains` is read
    #[serde(default)]
    pub custom: CustomSection,
}

/// `service: name` or the older `service: { name: ... }` form
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ServiceName {
    Plain(String),
    Object { name: String },
}

/// Provider settings relevant to locating the deployed stack
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSection {
    pub stage: Option<String>,
    pub region: Option<String>,
    pub profile: Option<String>,
    pub stack_name: Option<String>,
}

/// `custom` section of the service description
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomSection {
    #[serde(rename = "userPoolDomains", default)]
    pub user_pool_domains: PluginSettings,
}

/// Settings under `custom.userPoolDomains`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginSettings {
    /// Maximum number of domain requests in flight at once
    #[garde(range(min = 1))]
    pub concurrency: Option<usize>,

    /// Make hook failures and failed detachments fail the command
    #[garde(skip)]
    pub fail_on_error: Option<bool>,
}

/// A user pool declared in the service description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredPool {
    /// Logical resource name in the template
    pub logical_name: String,
    /// `UserPoolName`, used as the custom domain
    pub domain: String,
}

/// All user pools declared in the service description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredPools {
    pools: Vec<DeclaredPool>,
    unnamed: Vec<String>,
}

impl DeclaredPools {
    /// Pools with a literal `UserPoolName`, in logical name order
    pub fn pools(&self) -> &[DeclaredPool] {
        &self.pools
    }

    /// Logical names of pools whose `UserPoolName` is missing or not a literal string
    pub fn unnamed(&self) -> &[String] {
        &self.unnamed
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeclaredPool> {
        self.pools.iter()
    }

    /// Look up a pool by logical resource name
    pub fn get(&self, logical_name: &str) -> Option<&DeclaredPool> {
        self.pools.iter().find(|p| p.logical_name == logical_name)
    }

    /// Look up a pool by its domain (pool display name)
    pub fn by_domain(&self, domain: &str) -> Option<&DeclaredPool> {
        self.pools.iter().find(|p| p.domain == domain)
    }

    /// Set of declared pool names
    pub fn domains(&self) -> BTreeSet<&str> {
        self.pools.iter().map(|p| p.domain.as_str()).collect()
    }

    /// Logical names, in order
    pub fn logical_names(&self) -> impl Iterator<Item = &str> {
        self.pools.iter().map(|p| p.logical_name.as_str())
    }
}

impl ServiceDescription {
    /// Load a service description from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let content =
            fs::read_to_string(path).map_err(|e| ServiceError::io(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Parse a service description from YAML or JSON text
    pub fn parse(content: &str) -> Result<Self, ServiceError> {
        let description: Self = serde_yaml::from_str(content)?;
        description.ensure_valid()?;
        Ok(description)
    }

    fn ensure_valid(&self) -> Result<(), ServiceError> {
        if self.service_name().trim().is_empty() {
            return Err(ServiceError::EmptyServiceName);
        }
        self.custom
            .user_pool_domains
            .validate()
            .map_err(|report| ServiceError::InvalidSettings(report.to_string()))
    }

    /// Service name
    pub fn service_name(&self) -> &str {
        match &self.service {
            ServiceName::Plain(name) => name,
            ServiceName::Object { name } => name,
        }
    }

    /// Stage from the provider section, or the framework default
    pub fn stage(&self) -> &str {
        self.provider.stage.as_deref().unwrap_or(DEFAULT_STAGE)
    }

    /// CloudFormation stack name for a stage.
    ///
    /// Uses `provider.stackName` when set, otherwise `<service>-<stage>`.
    pub fn stack_name(&self, stage: &str) -> String {
        match &self.provider.stack_name {
            Some(name) => name.clone(),
            None => format!("{}-{}", self.service_name(), stage),
        }
    }

    /// Plugin settings from `custom.userPoolDomains`
    pub fn settings(&self) -> &PluginSettings {
        &self.custom.user_pool_domains
    }

    /// Collect the declared `AWS::Cognito::UserPool` resources.
    ///
    /// Later fragments override earlier ones with the same logical name.
    pub fn declared_user_pools(&self) -> DeclaredPools {
        let fragments: &[Value] = match &self.resources {
            Some(Value::Sequence(fragments)) => fragments,
            Some(fragment) => std::slice::from_ref(fragment),
            None => &[],
        };

        let mut merged: BTreeMap<&str, &Value> = BTreeMap::new();
        for fragment in fragments {
            let Some(Value::Mapping(resources)) = fragment.get("Resources") else {
                continue;
            };
            for (name, definition) in resources {
                if let Some(name) = name.as_str() {
                    merged.insert(name, definition);
                }
            }
        }

        let mut declared = DeclaredPools::default();
        for (logical_name, definition) in merged {
            if definition.get("Type").and_then(Value::as_str) != Some(USER_POOL_RESOURCE_TYPE) {
                continue;
            }
            // Only a literal string names a domain; `!Sub ...` stays tagged
            match definition
                .get("Properties")
                .and_then(|properties| properties.get(USER_POOL_NAME_PROPERTY))
            {
                Some(Value::String(domain)) if !domain.is_empty() => {
                    declared.pools.push(DeclaredPool {
                        logical_name: logical_name.to_string(),
                        domain: domain.clone(),
                    })
                }
                _ => declared.unnamed.push(logical_name.to_string()),
            }
        }
        declared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SERVICE_YAML: &str = r#"
service: auth-service
provider:
  name: aws
  stage: prod
  region: eu-west-1
functions:
  hello:
    handler: handler.hello
resources:
  Resources:
    Foo:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: foo-domain
    Bar:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: bar-domain
    Table:
      Type: AWS::DynamoDB::Table
      Properties:
        TableName: things
"#;

    #[test]
    fn test_declared_pools_from_yaml() {
        let service = ServiceDescription::parse(SERVICE_YAML).unwrap();
        let declared = service.declared_user_pools();

        assert_eq!(declared.len(), 2);
        assert_eq!(declared.get("Foo").unwrap().domain, "foo-domain");
        assert_eq!(declared.get("Bar").unwrap().domain, "bar-domain");
        assert!(declared.get("Table").is_none());
        assert_eq!(
            declared.domains().into_iter().collect::<Vec<_>>(),
            vec!["bar-domain", "foo-domain"]
        );
    }

    #[test]
    fn test_provider_and_stack_name() {
        let service = ServiceDescription::parse(SERVICE_YAML).unwrap();
        assert_eq!(service.service_name(), "auth-service");
        assert_eq!(service.stage(), "prod");
        assert_eq!(service.provider.region.as_deref(), Some("eu-west-1"));
        assert_eq!(service.stack_name("prod"), "auth-service-prod");
        assert_eq!(service.stack_name("test"), "auth-service-test");
    }

    #[test]
    fn test_explicit_stack_name_and_default_stage() {
        let service = ServiceDescription::parse(
            r#"{"service": {"name": "svc"}, "provider": {"stackName": "custom-stack"}}"#,
        )
        .unwrap();
        assert_eq!(service.service_name(), "svc");
        assert_eq!(service.stage(), "dev");
        assert_eq!(service.stack_name("dev"), "custom-stack");
    }

    #[test]
    fn test_no_resources_declares_nothing() {
        let service = ServiceDescription::parse("service: bare\n").unwrap();
        assert!(service.declared_user_pools().is_empty());
    }

    #[test]
    fn test_resource_fragment_list_merges() {
        let service = ServiceDescription::parse(
            r#"
service: svc
resources:
  - Resources:
      Foo:
        Type: AWS::Cognito::UserPool
        Properties:
          UserPoolName: first
  - Resources:
      Foo:
        Type: AWS::Cognito::UserPool
        Properties:
          UserPoolName: second
      Baz:
        Type: AWS::Cognito::UserPool
        Properties:
          UserPoolName: baz
"#,
        )
        .unwrap();
        let declared = service.declared_user_pools();
        assert_eq!(declared.len(), 2);
        assert_eq!(declared.get("Foo").unwrap().domain, "second");
        assert_eq!(declared.by_domain("baz").unwrap().logical_name, "Baz");
    }

    #[test]
    fn test_non_literal_pool_name_is_unnamed() {
        let service = ServiceDescription::parse(
            r#"
service: svc
resources:
  Resources:
    Dynamic:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: !Sub "${AWS::StackName}-pool"
    Missing:
      Type: AWS::Cognito::UserPool
"#,
        )
        .unwrap();
        let declared = service.declared_user_pools();
        assert!(declared.is_empty());
        assert_eq!(declared.unnamed(), ["Dynamic", "Missing"]);
    }

    #[test]
    fn test_short_form_intrinsics_in_single_fragment() {
        let service = ServiceDescription::parse(
            r#"
service: svc
functions:
  hello:
    handler: handler.hello
    environment:
      POOL_ID: !Ref Foo
resources:
  Resources:
    Foo:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: foo-domain
    Dynamic:
      Type: AWS::Cognito::UserPool
      Properties:
        UserPoolName: !Sub "${AWS::StackName}-pool"
    Client:
      Type: AWS::Cognito::UserPoolClient
      Properties:
        UserPoolId: !Ref Foo
  Outputs:
    FooArn:
      Value: !GetAtt Foo.Arn
"#,
        )
        .unwrap();

        let declared = service.declared_user_pools();
        assert_eq!(declared.len(), 1);
        assert_eq!(declared.get("Foo").unwrap().domain, "foo-domain");
        assert_eq!(declared.unnamed(), ["Dynamic"]);
    }

    #[test]
    fn test_short_form_intrinsics_in_fragment_list() {
        let service = ServiceDescription::parse(
            r#"
service: svc
resources:
  - Resources:
      Foo:
        Type: AWS::Cognito::UserPool
        Properties:
          UserPoolName: foo-domain
      Client:
        Type: AWS::Cognito::UserPoolClient
        Properties:
          UserPoolId: !Ref Foo
  - Resources:
      Dynamic:
        Type: AWS::Cognito::UserPool
        Properties:
          UserPoolName: !Sub "${AWS::StackName}-pool"
    Outputs:
      FooArn:
        Value: !GetAtt Foo.Arn
"#,
        )
        .unwrap();

        let declared = service.declared_user_pools();
        assert_eq!(declared.len(), 1);
        assert_eq!(declared.by_domain("foo-domain").unwrap().logical_name, "Foo");
        assert_eq!(declared.unnamed(), ["Dynamic"]);
    }

    #[test]
    fn test_plugin_settings() {
        let service = ServiceDescription::parse(
            r#"
service: svc
custom:
  other: value
  userPoolDomains:
    concurrency: 2
    failOnError: true
"#,
        )
        .unwrap();
        assert_eq!(service.settings().concurrency, Some(2));
        assert_eq!(service.settings().fail_on_error, Some(true));
    }

    #[test]
    fn test_invalid_plugin_settings() {
        let err = ServiceDescription::parse(
            "service: svc\ncustom:\n  userPoolDomains:\n    concurrency: 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidSettings(_)));

        let err = ServiceDescription::parse(
            "service: svc\ncustom:\n  userPoolDomains:\n    unknownKey: 1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }

    #[test]
    fn test_empty_service_name_rejected() {
        let err = ServiceDescription::parse("service: ''\n").unwrap_err();
        assert!(matches!(err, ServiceError::EmptyServiceName));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SERVICE_YAML).unwrap();

        let service = ServiceDescription::load(file.path()).unwrap();
        assert_eq!(service.declared_user_pools().len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ServiceDescription::load(Path::new("/nonexistent/serverless.yml")).unwrap_err();
        assert!(matches!(err, ServiceError::Io { .. }));
    }
}
