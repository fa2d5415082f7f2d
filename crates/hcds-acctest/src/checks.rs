use tracing::{debug, warn};

use crate::case::Harness;
use crate::error::AccTestError;
use crate::state::State;
use crate::template::replace_vars;

/// URL a managed dataset lives at, expanded per resource by [`replace_vars`].
pub const DATASET_URL_TEMPLATE: &str =
    "{{HealthcareBasePath}}projects/{{project}}/locations/{{location}}/datasets/{{name}}";

/// Assertions run against the API after an apply step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Every managed dataset has this time zone.
    TimeZone(String),
}

impl Harness {
    pub(crate) async fn run_check(&self, check: &Check, state: &State) -> Result<(), AccTestError> {
        match check {
            Check::TimeZone(expected) => self.check_time_zone(state, expected).await,
        }
    }

    /// Fail unless each managed dataset in `state` reports `expected` as its time zone.
    pub async fn check_time_zone(&self, state: &State, expected: &str) -> Result<(), AccTestError> {
        for (_, rs) in state.datasets() {
            let id = rs.dataset_id()?;
            let dataset = self.driver.get(&id).await.map_err(|e| {
                AccTestError::CheckFailed(format!(
                    "unexpected failure while verifying updated dataset: {}",
                    e
                ))
            })?;
            if dataset.time_zone != expected {
                return Err(AccTestError::CheckFailed(format!(
                    "dataset timeZone was not set to {:?} as expected: {}",
                    expected,
                    id.resource_path()
                )));
            }
            debug!(dataset = %id, time_zone = expected, "time zone verified");
        }
        Ok(())
    }

    /// Fail if any managed dataset in `state` can still be read from the API.
    pub async fn check_dataset_destroyed(&self, state: &State) -> Result<(), AccTestError> {
        for (address, rs) in state.datasets() {
            let url = replace_vars(&self.config, rs, DATASET_URL_TEMPLATE)?;
            match self.driver.fetch(&url).await {
                Ok(_) => {
                    warn!(address, %url, "dataset survived destroy");
                    return Err(AccTestError::CheckFailed(format!(
                        "HealthcareDataset still exists at {}",
                        url
                    )));
                }
                Err(e) if e.is_not_found() => debug!(address, %url, "dataset destroyed"),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
