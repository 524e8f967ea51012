//! userpool-domains - Cognito user pool domains for Serverless stacks
//!
//! Hooks into the Serverless deployment lifecycle to expose user pool IDs as
//! stack outputs, attach each pool's custom domain after deploy, and detach
//! the domains before the stack is removed.

pub mod aws;
pub mod config;
pub mod hooks;
