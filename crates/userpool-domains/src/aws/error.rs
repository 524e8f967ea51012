//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` and
//! `.message()` error metadata instead of string matching on Debug format.

use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories for the attach/detach policies
#[derive(Debug, Error)]
pub enum AwsError {
    /// Resource was not found (detach treats it as already gone)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Domain already exists (attach treats it as success)
    #[error("Domain already exists")]
    AlreadyExists,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { code: String, message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error ({}): {message}", code.as_deref().unwrap_or("no code"))]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists)
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        matches!(self, AwsError::Throttled { .. })
    }

    /// AWS error code, when the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Throttled { code, .. } => Some(code),
            AwsError::Sdk { code, .. } => code.as_deref(),
            AwsError::NotFound { .. } | AwsError::AlreadyExists => None,
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<String> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Message Cognito returns when the domain is already taken
pub const DOMAIN_ALREADY_EXISTS_MESSAGE: &str = "Domain already exists.";

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "TooManyRequestsException",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
];

/// Classify an AWS SDK error using the error code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        _ if message == DOMAIN_ALREADY_EXISTS_MESSAGE => AwsError::AlreadyExists,
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound { message },
        // CloudFormation reports missing stacks as a validation error
        Some("ValidationError") if message.contains("does not exist") => {
            AwsError::NotFound { message }
        }
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error.
///
/// Errors without service metadata (dispatch failures, timeouts, credential
/// errors) keep their full display chain as the message.
pub fn classify_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match (error.code(), error.message()) {
        (None, None) => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(error).to_string(),
        },
        (code, message) => classify_aws_error(code, message),
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "TooManyRequestsException",
        "Cognito rate limit hit. Lower --concurrency or custom.userPoolDomains.concurrency.",
    ),
    (
        "ThrottlingException",
        "AWS API rate limit hit. Lower --concurrency or custom.userPoolDomains.concurrency.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. Lower --concurrency or custom.userPoolDomains.concurrency.",
    ),
    (
        "LimitExceededException",
        "A Cognito quota was reached. Request an increase via the Service Quotas console.",
    ),
    (
        "InvalidParameterException",
        "Domain prefixes may only contain lowercase letters, numbers and hyphens, \
         and must not contain 'aws', 'amazon' or 'cognito'.",
    ),
    (
        "NotAuthorizedException",
        "Check that the credentials allow cognito-idp domain operations.",
    ),
    (
        "AccessDeniedException",
        "Check that the credentials allow cognito-idp domain operations.",
    ),
    (
        "AccessDenied",
        "Check that the credentials allow cloudformation:DescribeStacks.",
    ),
    (
        "ExpiredToken",
        "AWS credentials have expired. Refresh them and retry.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<String> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| (*s).to_string())
}
