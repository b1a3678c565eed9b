use outpost_domain::{RecordId, ValidationError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("{entity} record {id} not found")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
