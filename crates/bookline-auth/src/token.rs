//! Session token issuance and validation.
//!
//! Tokens are stateless HS256 JWTs (HMAC-SHA256 over header+payload
//! with a process-wide shared secret). The claims carry the identity,
//! role, and both capability flags; nothing is stored server-side and
//! no revocation list exists. No `exp` claim is embedded — lifetime is
//! bounded by the transport layer's cookie max-age, so a token keeps
//! the capabilities it was issued with until it ages out.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookline_core::error::{BooklineError, BooklineResult};
use bookline_core::models::user::{Role, User};

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    /// Subject — user ID (UUID string).
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub can_create_appointments: bool,
    pub can_modify_appointments: bool,
}

impl SessionClaims {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Parse the subject claim back into a user id.
    pub fn user_id(&self) -> BooklineResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| BooklineError::Unauthorized {
            reason: "malformed token subject".into(),
        })
    }
}

/// Issue a signed session token for a user.
///
/// Pure function of the user and the configured secret: no expiry, no
/// nonce, so the same user always yields the same token until their
/// identity fields change.
pub fn issue_session_token(user: &User, config: &AuthConfig) -> Result<String, AuthError> {
    let claims = SessionClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role,
        can_create_appointments: user.can_create_appointments,
        can_modify_appointments: user.can_modify_appointments,
    };

    let key = EncodingKey::from_secret(config.token_secret.as_bytes());
    let header = Header::new(Algorithm::HS256);
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("token encode: {e}")))
}

/// Decode and verify a session token.
///
/// Rejects tokens that do not have exactly three segments, whose
/// signature does not match a recomputation over header+payload, or
/// whose payload does not parse into the expected claim shape. Entirely
/// self-contained — no store lookup.
pub fn decode_session_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(config.token_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    // No exp claim is embedded; lifetime is transport-enforced.
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| AuthError::TokenInvalid(e.to_string()))
}
