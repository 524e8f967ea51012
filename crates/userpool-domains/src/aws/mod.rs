//! AWS client modules
//!
//! This module provides wrappers around AWS SDK clients for:
//! - Cognito: user pool listing and domain attachment
//! - CloudFormation: stack output lookup
//! - context: shared SDK configuration, constructed once per invocation

pub mod cloudformation;
pub mod cognito;
pub mod context;
pub mod error;

// Core clients
pub use cloudformation::{StackClient, StackOperations, StackOutput};
pub use cognito::{
    CognitoClient, CognitoOperations, DomainDescription, UserPoolPage, UserPoolSummary,
    list_all_user_pools,
};
pub use context::{AwsContext, FromAwsContext};

// Error handling
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
