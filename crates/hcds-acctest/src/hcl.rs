use hcds_domain::{DatasetConfig, RESOURCE_TYPE};
use uuid::Uuid;

/// Render the HCL resource block for a dataset.
pub fn render_dataset_config(resource_name: &str, dataset: &DatasetConfig) -> String {
    let mut hcl = format!("resource \"{}\" \"{}\" {{\n", RESOURCE_TYPE, resource_name);
    push_attr(&mut hcl, "name", &dataset.name);
    push_attr(&mut hcl, "location", &dataset.location);
    if let Some(project) = &dataset.project {
        push_attr(&mut hcl, "project", project);
    }
    if let Some(tz) = &dataset.time_zone {
        push_attr(&mut hcl, "time_zone", tz);
    }
    hcl.push_str("}\n");
    hcl
}

fn push_attr(hcl: &mut String, key: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    hcl.push_str(&format!("  {:<12} = \"{}\"\n", key, escaped));
}

/// `tf-test-` followed by 10 random lowercase hex characters.
pub fn random_dataset_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("tf-test-{}", &suffix[..10])
}
