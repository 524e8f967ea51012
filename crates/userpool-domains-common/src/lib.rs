//! userpool-domains-common - Service description and template model
//!
//! This crate provides the pieces of userpool-domains that do not talk to AWS,
//! keeping the SDK dependencies confined to the main crate.
//!
//! ## Modules
//!
//! - [`defaults`]: Fixed names and default configuration values
//! - [`error`]: Typed errors for service description and template handling
//! - [`outputs`]: Explicit mapping between stack output keys and user pools
//! - [`service`]: Resolved service description and the user pools it declares
//! - [`template`]: Compiled CloudFormation template augmentation

pub mod defaults;
pub mod error;
pub mod outputs;
pub mod service;
pub mod template;

// Re-export commonly used types
pub use error::{ServiceError, TemplateError};
pub use outputs::{OutputKey, OutputMapping, ResolvedOutput};
pub use service::{DeclaredPool, DeclaredPools, PluginSettings, ServiceDescription};
pub use template::CompiledTemplate;
