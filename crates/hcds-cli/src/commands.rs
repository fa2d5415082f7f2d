use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use hcds_acctest::{render_dataset_config, Harness};
use hcds_config::{load_dataset_configs, load_provider_config, ProviderConfig};
use hcds_domain::{DatasetConfig, DatasetId};
use hcds_driver::{DatasetDriver, HealthcareDriver, LocalDriver};
use tracing::info;

use crate::cli::OutputFormat;
use crate::output;

// ── Setup ─────────────────────────────────────────────────────────────────────

/// Config file (if any), then environment, then `--project`.
pub fn load_config(path: Option<&Path>, project: Option<&str>) -> Result<ProviderConfig> {
    let config = match path {
        Some(p) => load_provider_config(p)
            .with_context(|| format!("Failed to load provider config {}", p.display()))?
            .with_env_overrides(),
        None => ProviderConfig::from_env(),
    };
    Ok(match project {
        Some(p) => config.with_project(p),
        None => config,
    })
}

pub async fn driver(config: &ProviderConfig, local: bool) -> Result<Arc<dyn DatasetDriver>> {
    if local {
        return Ok(Arc::new(LocalDriver::new()));
    }
    let driver = HealthcareDriver::from_config(config)
        .await
        .context("Failed to initialise Healthcare driver")?;
    Ok(Arc::new(driver))
}

fn resolve_id(config: &ProviderConfig, id: &str) -> Result<DatasetId> {
    config
        .resolve_dataset_id(id)
        .with_context(|| format!("Cannot resolve dataset id {:?}", id))
}

// ── Offline commands ──────────────────────────────────────────────────────────

pub fn resolve(config: &ProviderConfig, id: &str, out: OutputFormat) -> Result<()> {
    let id = resolve_id(config, id)?;
    println!("{}", output::render_id(config, &id, out)?);
    Ok(())
}

pub fn render(resource: &str, name: String, location: String, time_zone: Option<String>) {
    let config = DatasetConfig { name, location, project: None, time_zone };
    print!("{}", render_dataset_config(resource, &config));
}

pub fn render_manifest(path: &Path) -> Result<()> {
    let datasets = load_dataset_configs(path)
        .with_context(|| format!("Failed to load dataset manifest {}", path.display()))?;
    let blocks: Vec<String> = datasets
        .iter()
        .map(|d| render_dataset_config(&resource_name(&d.name), d))
        .collect();
    print!("{}", blocks.join("\n"));
    Ok(())
}

/// HCL resource names allow letters, digits, `_` and `-`, and must not start with a digit.
fn resource_name(dataset: &str) -> String {
    let name: String = dataset
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name
    }
}

// ── API commands ──────────────────────────────────────────────────────────────

pub async fn create(
    config: &ProviderConfig,
    driver: Arc<dyn DatasetDriver>,
    id: &str,
    time_zone: Option<&str>,
    out: OutputFormat,
) -> Result<()> {
    let id = resolve_id(config, id)?;
    let dataset = driver
        .create(&id, time_zone)
        .await
        .with_context(|| format!("Failed to create dataset {}", id))?;
    println!("{}", output::render_dataset(config, &dataset, out)?);
    Ok(())
}

pub async fn get(
    config: &ProviderConfig,
    driver: Arc<dyn DatasetDriver>,
    id: &str,
    out: OutputFormat,
) -> Result<()> {
    let id = resolve_id(config, id)?;
    let dataset = driver
        .get(&id)
        .await
        .with_context(|| format!("Failed to read dataset {}", id))?;
    println!("{}", output::render_dataset(config, &dataset, out)?);
    Ok(())
}

pub async fn update(
    config: &ProviderConfig,
    driver: Arc<dyn DatasetDriver>,
    id: &str,
    time_zone: &str,
    out: OutputFormat,
) -> Result<()> {
    let id = resolve_id(config, id)?;
    let dataset = driver
        .update_time_zone(&id, time_zone)
        .await
        .with_context(|| format!("Failed to update dataset {}", id))?;
    println!("{}", output::render_dataset(config, &dataset, out)?);
    Ok(())
}

pub async fn delete(config: &ProviderConfig, driver: Arc<dyn DatasetDriver>, id: &str) -> Result<()> {
    let id = resolve_id(config, id)?;
    driver
        .delete(&id)
        .await
        .with_context(|| format!("Failed to delete dataset {}", id))?;
    println!("Deleted {}", id);
    Ok(())
}

pub async fn lifecycle(
    config: ProviderConfig,
    driver: Arc<dyn DatasetDriver>,
    location: Option<&str>,
    time_zone: &str,
    out: OutputFormat,
) -> Result<()> {
    let location = location.unwrap_or(config.default_location()).to_string();
    info!(driver = driver.name(), %location, "Running dataset lifecycle");
    let harness = Harness::new(config, driver);
    let report = harness
        .run_basic_lifecycle(&location, time_zone)
        .await
        .context("Dataset lifecycle failed")?;
    println!("{}", output::render_report(&report, out)?);
    Ok(())
}
