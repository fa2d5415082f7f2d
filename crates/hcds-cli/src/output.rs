use anyhow::Result;
use hcds_acctest::LifecycleReport;
use hcds_config::ProviderConfig;
use hcds_domain::{Dataset, DatasetId};
use serde_json::json;

use crate::cli::OutputFormat;

pub fn render_id(config: &ProviderConfig, id: &DatasetId, out: OutputFormat) -> Result<String> {
    Ok(match out {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "id":            id.short_key(),
            "project":       id.project(),
            "location":      id.location(),
            "name":          id.name(),
            "resource_path": id.resource_path(),
            "url":           config.dataset_url(id),
        }))?,
        OutputFormat::Text => format!("{}\n{}", id.short_key(), id.resource_path()),
    })
}

pub fn render_dataset(config: &ProviderConfig, ds: &Dataset, out: OutputFormat) -> Result<String> {
    Ok(match out {
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "id":        ds.id.short_key(),
            "name":      ds.id.resource_path(),
            "time_zone": ds.time_zone,
            "self_link": config.dataset_url(&ds.id),
        }))?,
        OutputFormat::Text => format!(
            "{}\n  path:      {}\n  time_zone: {}",
            ds.id.short_key(),
            ds.id.resource_path(),
            ds.time_zone
        ),
    })
}

/// Render a lifecycle report, one line per change grouped under its step.
pub fn render_report(report: &LifecycleReport, out: OutputFormat) -> Result<String> {
    if let OutputFormat::Json = out {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    let mut text = format!("Lifecycle on {} driver\n", report.driver);
    for step in &report.steps {
        text.push_str(&format!("{}. {} ({})\n", step.index, step.kind, step.at.to_rfc3339()));
        for change in &step.changes {
            text.push_str(&format!("   {}\n", change));
        }
    }
    text.push_str("PASS");
    Ok(text)
}
