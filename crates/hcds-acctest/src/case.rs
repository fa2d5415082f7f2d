use std::sync::Arc;

use hcds_config::ProviderConfig;
use hcds_domain::DatasetConfig;
use hcds_driver::DatasetDriver;
use tracing::{error, info, warn};

use crate::checks::Check;
use crate::error::AccTestError;
use crate::hcl::{random_dataset_name, render_dataset_config};
use crate::report::{Change, LifecycleReport};
use crate::state::{ResourceState, State};

/// Address of the dataset resource declared by the lifecycle configs.
pub const DATASET_ADDRESS: &str = "google_healthcare_dataset.dataset";

const RESOURCE_NAME: &str = "dataset";

// ── Test case ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Step {
    /// Bring the dataset at [`DATASET_ADDRESS`] to `config`, then run `checks`.
    Apply { config: DatasetConfig, checks: Vec<Check> },
    /// Import the resource at `address` by id and compare it to the applied state.
    /// `import_id` overrides the id taken from state (e.g. `location/name`).
    ImportVerify { address: String, import_id: Option<String> },
}

impl Step {
    pub fn apply(config: DatasetConfig) -> Self {
        Step::Apply { config, checks: Vec::new() }
    }

    pub fn import_verify(address: impl Into<String>) -> Self {
        Step::ImportVerify { address: address.into(), import_id: None }
    }
}

#[derive(Debug, Clone)]
pub struct TestCase {
    pub steps: Vec<Step>,
    /// Verify every dataset is gone after the final destroy.
    pub check_destroy: bool,
}

impl TestCase {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps, check_destroy: true }
    }

    /// Create, import, update the time zone, import again.
    pub fn basic(name: &str, location: &str, time_zone: &str) -> Self {
        let created = DatasetConfig::new(name, location);
        let updated = created.clone().with_time_zone(time_zone);
        Self::new(vec![
            Step::apply(created),
            Step::import_verify(DATASET_ADDRESS),
            Step::Apply {
                config: updated,
                checks: vec![Check::TimeZone(time_zone.to_string())],
            },
            Step::import_verify(DATASET_ADDRESS),
        ])
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// Runs [`TestCase`]s against a [`DatasetDriver`].
pub struct Harness {
    pub(crate) config: ProviderConfig,
    pub(crate) driver: Arc<dyn DatasetDriver>,
}

impl Harness {
    pub fn new(config: ProviderConfig, driver: Arc<dyn DatasetDriver>) -> Self {
        Self { config, driver }
    }

    /// Run the basic lifecycle on a freshly named dataset.
    pub async fn run_basic_lifecycle(
        &self,
        location: &str,
        time_zone: &str,
    ) -> Result<LifecycleReport, AccTestError> {
        let name = random_dataset_name();
        info!(%name, location, "Starting basic dataset lifecycle");
        self.run(&TestCase::basic(&name, location, time_zone)).await
    }

    /// Run every step, then destroy what was created and verify it is gone.
    ///
    /// Destroy and its verification run even when a step fails. If they fail
    /// too, both errors are returned in [`AccTestError::DestroyAfterFailure`].
    pub async fn run(&self, case: &TestCase) -> Result<LifecycleReport, AccTestError> {
        let mut report = LifecycleReport::new(self.driver.name());
        let mut state = State::new();

        let mut outcome = Ok(());
        for (i, step) in case.steps.iter().enumerate() {
            if let Err(e) = self.run_step(step, &mut state, &mut report).await {
                error!(step = i + 1, error = %e, "Step failed");
                outcome = Err(e);
                break;
            }
        }

        let applied = state.clone();
        let destroyed = match self.destroy(&mut state, &mut report).await {
            Ok(()) if case.check_destroy => self.check_dataset_destroyed(&applied).await,
            other => other,
        };
        report.finish();

        match (outcome, destroyed) {
            (Ok(()), Ok(())) => {}
            (Err(step), Ok(())) | (Ok(()), Err(step)) => return Err(step),
            (Err(step), Err(destroy)) => {
                error!(error = %destroy, "Destroy after failed step also failed");
                return Err(AccTestError::DestroyAfterFailure {
                    step: Box::new(step),
                    destroy: Box::new(destroy),
                });
            }
        }
        info!(steps = report.steps.len(), "Lifecycle complete");
        Ok(report)
    }

    async fn run_step(
        &self,
        step: &Step,
        state: &mut State,
        report: &mut LifecycleReport,
    ) -> Result<(), AccTestError> {
        match step {
            Step::Apply { config, checks } => {
                let change = self.apply(state, DATASET_ADDRESS, config).await?;
                report.record(
                    "apply",
                    Some(render_dataset_config(RESOURCE_NAME, config)),
                    vec![change],
                );
                for check in checks {
                    self.run_check(check, state).await?;
                }
                Ok(())
            }
            Step::ImportVerify { address, import_id } => {
                let change = self.import_verify(state, address, import_id.as_deref()).await?;
                report.record("import_verify", None, vec![change]);
                Ok(())
            }
        }
    }

    /// Converge the resource at `address` on `desired`.
    ///
    /// - absent from state, or gone from the API: create
    /// - project, location or name changed: delete and create
    /// - declared time zone differs from the API's: patch it
    async fn apply(
        &self,
        state: &mut State,
        address: &str,
        desired: &DatasetConfig,
    ) -> Result<Change, AccTestError> {
        let id = desired
            .dataset_id(&self.config.project)
            .ok_or_else(|| AccTestError::MissingProject(desired.name.clone()))?;
        let time_zone = desired.time_zone.as_deref();

        let (dataset, change) = match state.get(address) {
            None => {
                let ds = self.driver.create(&id, time_zone).await?;
                (ds, Change::Created { id: id.short_key() })
            }
            Some(existing) => {
                let current = existing.dataset_id()?;
                if current != id {
                    info!(from = %current, to = %id, "Replacing dataset");
                    match self.driver.delete(&current).await {
                        Err(e) if !e.is_not_found() => return Err(e.into()),
                        _ => {}
                    }
                    let ds = self.driver.create(&id, time_zone).await?;
                    (ds, Change::Replaced { from: current.short_key(), to: id.short_key() })
                } else {
                    match self.driver.get(&id).await {
                        Err(e) if e.is_not_found() => {
                            warn!(dataset = %id, "Dataset missing from API, recreating");
                            let ds = self.driver.create(&id, time_zone).await?;
                            (ds, Change::Created { id: id.short_key() })
                        }
                        Err(e) => return Err(e.into()),
                        Ok(ds) => match time_zone {
                            Some(tz) if tz != ds.time_zone => {
                                let ds = self.driver.update_time_zone(&id, tz).await?;
                                let change = Change::Updated {
                                    id: id.short_key(),
                                    time_zone: tz.to_string(),
                                };
                                (ds, change)
                            }
                            _ => (ds, Change::Unchanged { id: id.short_key() }),
                        },
                    }
                }
            }
        };

        state.insert(
            address,
            ResourceState::from_dataset(&dataset, &self.config.healthcare_base_path),
        );
        Ok(change)
    }

    async fn import_verify(
        &self,
        state: &State,
        address: &str,
        import_id: Option<&str>,
    ) -> Result<Change, AccTestError> {
        let applied = state
            .get(address)
            .ok_or_else(|| AccTestError::MissingResource(address.to_string()))?;
        let id = self
            .config
            .resolve_dataset_id(import_id.unwrap_or(&applied.id))?;
        let dataset = self.driver.get(&id).await?;
        let imported = ResourceState::from_dataset(&dataset, &self.config.healthcare_base_path);

        let diffs = applied.diff(&imported);
        if !diffs.is_empty() {
            return Err(AccTestError::ImportMismatch { address: address.to_string(), diffs });
        }
        Ok(Change::Imported { id: imported.id })
    }

    /// Delete every managed dataset in `state`. Already-deleted datasets are fine.
    async fn destroy(
        &self,
        state: &mut State,
        report: &mut LifecycleReport,
    ) -> Result<(), AccTestError> {
        let addresses: Vec<String> = state.datasets().map(|(a, _)| a.to_string()).collect();
        let mut changes = Vec::new();
        for address in addresses {
            let Some(rs) = state.get(&address) else { continue };
            let id = rs.dataset_id()?;
            match self.driver.delete(&id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => warn!(dataset = %id, "Dataset already deleted"),
                Err(e) => return Err(e.into()),
            }
            state.remove(&address);
            changes.push(Change::Deleted { id: id.short_key() });
        }
        report.record("destroy", None, changes);
        Ok(())
    }
}
