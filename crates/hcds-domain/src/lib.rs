pub mod error;
pub mod id;
pub mod types;


pub use error::DomainError;
pub use id::{resolve, DatasetId, RESOURCE_TYPE};
pub use types::{Dataset, DatasetConfig, DEFAULT_TIME_ZONE};
