use summit_core::DomainError;
use thiserror::Error;

use crate::{AuthError, DatabaseError, StorageError};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Everything a collab operation can fail with.
/// Each variant maps to one kind of response a transport would give.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input or state breaks a rule
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The acting member is not allowed to do this
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Auth(AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Stored state breaks an invariant, or the database failed
    #[error("Unknown internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(message) => Self::Validation(message),
            DomainError::NotFound(message) => Self::NotFound(message),
            DomainError::Conflict(message) => Self::Conflict(message),
            DomainError::Forbidden(message) => Self::Forbidden(message),
            e @ DomainError::Inconsistent(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(value: DatabaseError) -> Self {
        match value {
            e @ DatabaseError::NotFound { .. } => Self::NotFound(e.to_string()),
            e @ DatabaseError::Conflict { .. } => Self::Conflict(e.to_string()),
            e => Self::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::Db(e) => e.into(),
            AuthError::Domain(e) => e.into(),
            e => Self::Auth(e),
        }
    }
}
