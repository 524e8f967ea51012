//! Stack output keys for user pool IDs
//!
//! Every user pool gets one stack output named `UserPoolId<LogicalName>`.
//! [`OutputMapping`] records which logical resource each output key belongs
//! to. The template augmentation and the deploy hook build it with the same
//! function, so deploy looks outputs up by key instead of recovering the
//! logical name from the output name.

use crate::defaults::USER_POOL_OUTPUT_PREFIX;
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Name of a stack output exposing a user pool ID
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display, derive_more::Deref,
)]
pub struct OutputKey(String);

impl OutputKey {
    /// Output key for the user pool with the given logical resource name
    pub fn for_resource(logical_name: &str) -> Self {
        OutputKey(format!("{USER_POOL_OUTPUT_PREFIX}{logical_name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OutputKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A stack output matched back to its user pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutput {
    /// Logical resource name of the user pool
    pub logical_name: String,
    /// Physical user pool ID assigned by Cognito
    pub user_pool_id: String,
}

/// Output key to logical resource name mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputMapping {
    by_key: BTreeMap<OutputKey, String>,
}

impl OutputMapping {
    /// Build the mapping for a set of user pool logical names
    pub fn for_resources<I, S>(logical_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let by_key = logical_names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                (OutputKey::for_resource(name), name.to_string())
            })
            .collect();
        Self { by_key }
    }

    /// Logical resource name behind an output key, if it is one of ours
    pub fn logical_name(&self, output_key: &str) -> Option<&str> {
        self.by_key.get(output_key).map(String::as_str)
    }

    /// Output key assigned to a logical resource name
    pub fn output_key(&self, logical_name: &str) -> Option<&OutputKey> {
        self.by_key
            .iter()
            .find(|(_, name)| name.as_str() == logical_name)
            .map(|(key, _)| key)
    }

    /// Iterate over `(output key, logical name)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&OutputKey, &str)> {
        self.by_key.iter().map(|(key, name)| (key, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Match `(output key, output value)` pairs against this mapping.
    ///
    /// Outputs that are not in the mapping are ignored. Result order follows
    /// the order of `outputs`.
    pub fn resolve<'a, I>(&self, outputs: I) -> Vec<ResolvedOutput>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        outputs
            .into_iter()
            .filter_map(|(key, value)| {
                self.logical_name(key).map(|logical_name| ResolvedOutput {
                    logical_name: logical_name.to_string(),
                    user_pool_id: value.to_string(),
                })
            })
            .collect()
    }
}
