//! Fixed names and default configuration values
//!
//! These constants keep the template augmentation and the deploy/remove
//! hooks agreeing on the same names.

/// CloudFormation resource type of a Cognito user pool
pub const USER_POOL_RESOURCE_TYPE: &str = "AWS::Cognito::UserPool";

/// Prefix of the stack outputs exposing user pool IDs (`UserPoolId<LogicalName>`)
pub const USER_POOL_OUTPUT_PREFIX: &str = "UserPoolId";

/// Property holding the pool display name, which doubles as the domain name
pub const USER_POOL_NAME_PROPERTY: &str = "UserPoolName";

/// Tag carried by every log line emitted from a hook
pub const LOG_TAG: &str = "userpool-domains";

/// Stage used when neither the CLI nor the service description names one
pub const DEFAULT_STAGE: &str = "dev";

/// Default number of domain requests in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Largest page size accepted by `ListUserPools`
pub const LIST_USER_POOLS_PAGE_SIZE: i32 = 60;

/// Default path of the resolved service description
pub const DEFAULT_SERVICE_FILE: &str = "serverless.yml";

/// Default path of the compiled CloudFormation template
pub const DEFAULT_TEMPLATE_FILE: &str = ".serverless/cloudformation-template-update-stack.json";
