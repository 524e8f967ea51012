//! Compiled CloudFormation template augmentation
//!
//! Before the template is submitted, every user pool gets a stack output
//! exposing its physical ID so the deploy hook can find it afterwards.

use crate::defaults::USER_POOL_RESOURCE_TYPE;
use crate::error::TemplateError;
use crate::outputs::OutputMapping;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// A compiled CloudFormation template (JSON object)
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    root: Map<String, Value>,
}

impl CompiledTemplate {
    /// Wrap a parsed template; the root must be a JSON object
    pub fn from_value(value: Value) -> Result<Self, TemplateError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(TemplateError::NotAnObject),
        }
    }

    /// Parse a template from JSON text
    pub fn parse(content: &str) -> Result<Self, TemplateError> {
        Self::from_value(serde_json::from_str(content)?)
    }

    /// Load a template from a JSON file
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let content = fs::read_to_string(path)
            .map_err(|e| TemplateError::io(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    /// Write the template back as pretty-printed JSON, keeping key order
    pub fn save(&self, path: &Path) -> Result<(), TemplateError> {
        let content = serde_json::to_string_pretty(&self.root)?;
        fs::write(path, content).map_err(|e| TemplateError::io(path.display().to_string(), e))
    }

    /// Logical names of all `AWS::Cognito::UserPool` resources, in template order
    pub fn user_pool_resources(&self) -> Vec<String> {
        let Some(Value::Object(resources)) = self.root.get("Resources") else {
            return Vec::new();
        };
        resources
            .iter()
            .filter(|(_, resource)| {
                resource.get("Type").and_then(Value::as_str) == Some(USER_POOL_RESOURCE_TYPE)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The `Outputs` section, if present
    pub fn outputs(&self) -> Option<&Map<String, Value>> {
        self.root.get("Outputs").and_then(Value::as_object)
    }

    /// Add a `UserPoolId<LogicalName>` output referencing each user pool.
    ///
    /// Existing outputs with the same key are replaced. A template without
    /// user pools is left untouched.
    pub fn add_user_pool_outputs(&mut self) -> Result<OutputMapping, TemplateError> {
        let mapping = OutputMapping::for_resources(self.user_pool_resources());
        if mapping.is_empty() {
            return Ok(mapping);
        }

        let outputs = self
            .root
            .entry("Outputs")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or(TemplateError::InvalidOutputs)?;

        for (key, logical_name) in mapping.iter() {
            outputs.insert(
                key.to_string(),
                json!({
                    "Description": format!("Physical ID of user pool {logical_name}"),
                    "Value": { "Ref": logical_name },
                }),
            );
        }

        Ok(mapping)
    }
}
