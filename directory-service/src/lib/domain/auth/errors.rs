use auth::TokenError;
use thiserror::Error;

/// Access-denial taxonomy surfaced by the authentication layer.
///
/// Every variant except `Verification` renders as an access-denied category
/// at the transport boundary; the variants stay distinguishable so clients
/// can branch on kind rather than message text.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Token is expired")]
    ExpiredToken,

    #[error("Token is not valid yet")]
    DisabledToken,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("User is not authenticated or does not exist")]
    NotAuthenticated,

    #[error("Invalid login or password")]
    InvalidLogin,

    #[error("Could not verify the token: {0}")]
    Verification(String),
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::ExpiredToken,
            TokenError::NotYetValid => AuthError::DisabledToken,
            TokenError::Invalid => AuthError::InvalidToken,
            TokenError::Signing(msg) | TokenError::Verification(msg) => {
                AuthError::Verification(msg)
            }
        }
    }
}
