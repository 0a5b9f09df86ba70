//! Credential verification and bearer-token issuance.

pub mod password;
pub mod token;

pub use token::Claims;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("password hashing error: {0}")]
    Hash(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}
