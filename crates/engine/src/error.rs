//! The module contains the errors the engine can return.
//!
//! Every variant belongs to one [`ErrorClass`]:
//!
//! - [`Validation`] and [`InvalidAmount`] for malformed input.
//! - [`KeyNotFound`] for rows that do not exist or live outside the caller's
//!   scope.
//! - [`ExistingKey`] and [`Conflict`] for operations blocked by existing data.
//! - [`Unsupported`] for operations the ledger refuses on purpose.
//! - [`Database`] for any storage failure; the enclosing DB transaction is
//!   rolled back.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Conflict`]: EngineError::Conflict
//!  [`Unsupported`]: EngineError::Unsupported
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Coarse error classes surfaced to callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Validation,
    NotFound,
    Conflict,
    Unsupported,
    Persistence,
}

impl EngineError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) | Self::InvalidAmount(_) => ErrorClass::Validation,
            Self::KeyNotFound(_) => ErrorClass::NotFound,
            Self::ExistingKey(_) | Self::Conflict(_) => ErrorClass::Conflict,
            Self::Unsupported(_) => ErrorClass::Unsupported,
            Self::Database(_) => ErrorClass::Persistence,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Storage failures are logged and replaced by a generic message, the
    /// details never leave the engine.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(db_err) => {
                tracing::error!("database error: {db_err}");
                "operation failed, nothing was changed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Unsupported(a), Self::Unsupported(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
