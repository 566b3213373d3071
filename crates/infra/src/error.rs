//! Application-level error returned by services.

use thiserror::Error;

use shop_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a service operation.
///
/// Domain errors and store errors are folded into one enum so callers can
/// branch on the kind of failure. None of these are retried; the unit of work
/// that produced them has already been discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A referenced member, item or order does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Lifecycle rule rejected the operation (e.g. cancelling a shipped order).
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// The request cannot be used to build an aggregate.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Duplicate key or a concurrent writer won the commit.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::InvalidStateTransition(msg) => ServiceError::InvalidStateTransition(msg),
            DomainError::InvalidArgument(msg) => ServiceError::InvalidArgument(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}
