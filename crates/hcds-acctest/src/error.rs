use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccTestError {
    #[error("domain error: {0}")]
    Domain(#[from] hcds_domain::DomainError),

    #[error("driver error: {0}")]
    Driver(#[from] hcds_driver::DriverError),

    #[error("template error: {0}")]
    Template(String),

    #[error("no resource {0} in state")]
    MissingResource(String),

    #[error("dataset {0:?} has no project and no default project is configured")]
    MissingProject(String),

    #[error("imported state for {address} differs from applied state: {}", diffs.join("; "))]
    ImportMismatch { address: String, diffs: Vec<String> },

    #[error("check failed: {0}")]
    CheckFailed(String),

    #[error("{step}; destroy after failure also failed: {destroy}")]
    DestroyAfterFailure {
        step: Box<AccTestError>,
        destroy: Box<AccTestError>,
    },
}
