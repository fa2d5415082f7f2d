mod case;
mod checks;
pub mod error;
pub mod hcl;
pub mod report;
pub mod state;
pub mod template;

pub use case::{Harness, Step, TestCase, DATASET_ADDRESS};
pub use checks::{Check, DATASET_URL_TEMPLATE};
pub use error::AccTestError;
pub use hcl::{random_dataset_name, render_dataset_config};
pub use report::{Change, LifecycleReport, StepRecord};
pub use state::{ResourceState, State};
pub use template::replace_vars;
