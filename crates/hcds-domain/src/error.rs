use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error(
        "invalid dataset id {0:?}: expected \"{{project}}/{{location}}/{{name}}\" or \"{{location}}/{{name}}\""
    )]
    MalformedIdentifier(String),

    #[error("dataset id {0:?} omits the project and no default project is configured")]
    MissingProjectDefault(String),

    #[error("invalid dataset resource path: {0}")]
    MalformedResourcePath(String),
}
