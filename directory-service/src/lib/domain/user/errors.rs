use thiserror::Error;

use crate::domain::auth::errors::AuthError;

/// Top-level error for user operations.
///
/// Conflict carries the unique keys reported by the store so callers can
/// tell the user which field collided. Storage failures are wrapped, never
/// surfaced verbatim.
#[derive(Debug, Clone, Error)]
pub enum UserError {
    #[error("No data was provided for the user update")]
    NoProvidedData,

    #[error("The requested user was not found")]
    NotFound,

    #[error("One or more unique keys are already registered to another user: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("The given department was not found")]
    DepartmentNotFound,

    #[error("The given department is inactive")]
    InactiveDepartment,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error for the outbound mail port. Call sites are fire-and-forget: these
/// are logged and dropped, never propagated to the caller.
#[derive(Debug, Clone, Error)]
pub enum MailerError {
    #[error("Failed to build mail message: {0}")]
    InvalidMessage(String),

    #[error("Failed to deliver mail: {0}")]
    DeliveryFailed(String),
}
