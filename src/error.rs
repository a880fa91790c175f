use crate::backend::BackendError;
use crate::pricing::PricingError;
use thiserror::Error;

// Errors surfaced by admin and booking operations
#[derive(Error, Debug)]
pub enum OperationError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    // Earlier steps were written and are not rolled back
    #[error("Partial write for {entity} {id}: completed {completed:?} before failing: {source}")]
    PartialWrite {
        entity: &'static str,
        id: String,
        completed: Vec<&'static str>,
        #[source]
        source: BackendError,
    },

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl OperationError {
    pub fn validation(message: impl Into<String>) -> Self {
        OperationError::Validation(message.into())
    }

    // Wrap a failure in a multi-step write, remembering what already landed
    pub fn after_steps(
        entity: &'static str,
        id: &str,
        completed: &[&'static str],
        source: BackendError,
    ) -> Self {
        if completed.is_empty() {
            OperationError::Backend(source)
        } else {
            OperationError::PartialWrite {
                entity,
                id: id.to_string(),
                completed: completed.to_vec(),
                source,
            }
        }
    }
}
