//! User domain model.
//!
//! Every user doubles as a bookable provider: an appointment reserves
//! one user's time. Users are never physically removed — deactivation
//! flips `active` so historical appointments keep a valid reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Provider,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Provider => write!(f, "provider"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "provider" => Ok(Role::Provider),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased; lookups normalize the same way.
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    /// Capability: may create appointments. Admins implicitly hold
    /// this regardless of the stored value.
    pub can_create_appointments: bool,
    /// Capability: may edit, cancel, or delete appointments. Admins
    /// implicitly hold this regardless of the stored value.
    pub can_modify_appointments: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Raw password (hashed with Argon2id at the storage boundary).
    pub password: String,
    pub role: Role,
    pub can_create_appointments: bool,
    pub can_modify_appointments: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    /// Raw password; re-hashed before storage when present.
    pub password: Option<String>,
    pub role: Option<Role>,
    pub can_create_appointments: Option<bool>,
    pub can_modify_appointments: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub active: Option<bool>,
}

/// Identity view returned to callers — never carries the password
/// hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub can_create_appointments: bool,
    pub can_modify_appointments: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            can_create_appointments: user.can_create_appointments,
            can_modify_appointments: user.can_modify_appointments,
        }
    }
}
