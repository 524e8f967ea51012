//! Service description and template errors

use thiserror::Error;

/// Errors loading or interpreting the service description
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failed to read the service description file
    #[error("Failed to read service description '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the service description as YAML or JSON
    #[error("Failed to parse service description: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The service name is empty
    #[error("service name cannot be empty")]
    EmptyServiceName,

    /// `custom.userPoolDomains` failed validation
    #[error("invalid custom.userPoolDomains settings: {0}")]
    InvalidSettings(String),
}

impl ServiceError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors loading, augmenting, or saving the compiled template
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Failed to read or write the template file
    #[error("Failed to access template '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Template is not valid JSON
    #[error("Failed to parse template: {0}")]
    Parse(#[from] serde_json::Error),

    /// Template root is not a JSON object
    #[error("template root must be a JSON object")]
    NotAnObject,

    /// `Outputs` exists but is not a JSON object
    #[error("template Outputs section must be a JSON object")]
    InvalidOutputs,
}

impl TemplateError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
