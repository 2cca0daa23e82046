//! FILENAME: app/src/error.rs
//! Errors surfaced at the session boundary.

use fact_model::ModelError;
use persistence::PersistenceError;
use pivot_engine::PivotError;
use report_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Network or backend failure. Retryable by repeating the action.
    #[error(transparent)]
    Client(ClientError),

    /// Invalid arrangement or a field the dataset does not have.
    #[error(transparent)]
    Pivot(#[from] PivotError),

    #[error("export failed: {0}")]
    Export(#[from] PersistenceError),

    /// User-correctable input, refused before any network call.
    #[error("{0}")]
    Validation(String),

    /// Stale reference, e.g. a view that no longer exists.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Network and backend failures; everything else needs a different input.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Client(e) => e.is_transient(),
            _ => false,
        }
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(what) => AppError::NotFound(what),
            ClientError::Config(message) => AppError::Config(message),
            other => AppError::Client(other),
        }
    }
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::Pivot(PivotError::Model(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_404_maps_to_not_found() {
        let err = AppError::from(ClientError::NotFound("productivity-view/4".to_string()));
        assert!(matches!(err, AppError::NotFound(ref what) if what == "productivity-view/4"));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_backend_failure_is_transient() {
        let err = AppError::from(ClientError::Backend {
            status: 503,
            message: "maintenance".to_string(),
        });
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "backend returned 503: maintenance");
    }

    #[test]
    fn test_invalid_field_is_a_pivot_error() {
        let err = AppError::from(ModelError::InvalidField("Nope".to_string()));
        assert!(matches!(err, AppError::Pivot(PivotError::Model(_))));
    }
}
