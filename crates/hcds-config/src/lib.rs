mod raw;
mod loader;
pub mod error;
pub mod provider;

pub use error::ConfigError;
pub use loader::{load_dataset_configs, load_provider_config};
pub use provider::{normalize_base_path, ProviderConfig, DEFAULT_HEALTHCARE_BASE_PATH, DEFAULT_LOCATION};
