use thiserror::Error;

/// Error type for token operations.
///
/// `Expired`, `NotYetValid` and `Invalid` are caller-distinguishable
/// verification outcomes; `Signing` and `Verification` are unexpected
/// failures of the library itself.
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Token is expired")]
    Expired,

    #[error("Token is not valid yet")]
    NotYetValid,

    #[error("Token is invalid")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Signing(String),

    #[error("Failed to verify token: {0}")]
    Verification(String),
}
