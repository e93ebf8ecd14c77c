use thiserror::Error;

/// Top-level error for department operations.
#[derive(Debug, Clone, Error)]
pub enum DepartmentError {
    #[error("No data was provided for the department update")]
    NoProvidedData,

    #[error("The requested department was not found")]
    NotFound,

    #[error("The user given as manager was not found")]
    ManagerNotFound,

    #[error("The user given as manager is inactive")]
    InactiveManager,

    #[error("One or more unique keys are already registered to another department: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("Database error: {0}")]
    Database(String),
}
