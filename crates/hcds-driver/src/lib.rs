pub mod driver;
pub mod error;
pub mod healthcare;
pub mod local;

pub use driver::DatasetDriver;
pub use error::DriverError;
pub use healthcare::HealthcareDriver;
pub use local::LocalDriver;
