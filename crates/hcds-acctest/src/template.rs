use hcds_config::ProviderConfig;

use crate::error::AccTestError;
use crate::state::ResourceState;

/// Expand `{{var}}` placeholders in `template` for one resource.
///
/// - `{{HealthcareBasePath}}` is the provider's Healthcare API base path
/// - `{{project}}` is the resource's project, else the provider's default project
/// - any other `{{key}}` is the resource attribute `key`
///
/// A placeholder with no non-empty value is an error, as is an unclosed `{{`.
pub fn replace_vars(
    config: &ProviderConfig,
    resource: &ResourceState,
    template: &str,
) -> Result<String, AccTestError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or_else(|| {
            AccTestError::Template(format!("unclosed placeholder in {:?}", template))
        })?;
        let var = after[..end].trim();
        out.push_str(lookup(config, resource, var)?);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn lookup<'a>(
    config: &'a ProviderConfig,
    resource: &'a ResourceState,
    var: &str,
) -> Result<&'a str, AccTestError> {
    let value = match var {
        "HealthcareBasePath" => Some(config.healthcare_base_path.as_str()),
        "project" => resource.attribute("project").or(config.default_project()),
        key => resource.attribute(key),
    };
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AccTestError::Template(format!("no value for {{{{{}}}}}", var)))
}
