use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Raised whenever a domain rule is broken. Every variant aborts the operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Input violates a bound: length, range, cardinality, duplicate name
    #[error("{0}")]
    Validation(String),
    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),
    /// The entity already exists
    #[error("{0}")]
    Conflict(String),
    /// The acting member is not allowed to do this
    #[error("{0}")]
    Forbidden(String),
    /// An aggregate is in a state its invariants rule out, e.g. a roster without a leader.
    /// This is a fault in the system, not in the caller's input.
    #[error("consistency fault: {0}")]
    Inconsistent(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}
