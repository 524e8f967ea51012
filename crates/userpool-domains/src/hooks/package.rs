//! Template finalization hook

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use userpool_domains_common::{CompiledTemplate, OutputMapping};

/// Add a `UserPoolId<LogicalName>` output for every user pool in the template.
///
/// Makes no API calls. Returns the output mapping the deploy hook resolves
/// stack outputs with.
pub fn finalize_template(template: &mut CompiledTemplate) -> Result<OutputMapping> {
    let mapping = template
        .add_user_pool_outputs()
        .context("Failed to add user pool outputs to template")?;

    if mapping.is_empty() {
        debug!("No user pools in template, outputs unchanged");
        return Ok(mapping);
    }

    for (output_key, logical_name) in mapping.iter() {
        debug!(output_key = %output_key, logical_name = %logical_name, "Added user pool output");
    }
    info!(count = mapping.len(), "Exposed user pool IDs as stack outputs");
    Ok(mapping)
}

/// Finalize a compiled template file in place.
///
/// The file is only rewritten when it contains user pools.
pub fn package_template_file(path: &Path) -> Result<OutputMapping> {
    let mut template = CompiledTemplate::load(path)
        .with_context(|| format!("Failed to load template {}", path.display()))?;

    let mapping = finalize_template(&mut template)?;
    if !mapping.is_empty() {
        template
            .save(path)
            .with_context(|| format!("Failed to write template {}", path.display()))?;
        info!(path = %path.display(), "Template updated");
    }
    Ok(mapping)
}
