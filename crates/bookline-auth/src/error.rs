//! Authentication error types.

use bookline_core::error::BooklineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email, wrong password, or deactivated account — all
    /// collapsed into one outcome so a caller learns nothing about
    /// which it was.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for BooklineError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::TokenInvalid(_) => {
                BooklineError::Unauthorized {
                    reason: err.to_string(),
                }
            }
            AuthError::Crypto(msg) => BooklineError::Crypto(msg),
        }
    }
}
