//! Authentication configuration.

/// Configuration for the authentication service.
///
/// Held as a single immutable value for the process lifetime and
/// injected at startup; the token secret never appears as a source
/// literal.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared secret for HMAC-SHA256 session token signing.
    pub token_secret: String,
    /// Optional pepper prepended to passwords before Argon2id
    /// hashing/verification.
    pub pepper: Option<String>,
    /// Minimum password length for registration and user management.
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: String::new(),
            pepper: None,
            min_password_length: 6,
        }
    }
}
