//! Authentication service — login, registration, and profile
//! orchestration.

use tracing::info;

use bookline_core::error::{BooklineError, BooklineResult};
use bookline_core::models::user::{CreateUser, PublicUser, Role, UserFilter};
use bookline_core::repository::UserRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, SessionClaims};

/// Successful login or registration result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token, to be attached to subsequent requests by
    /// the transport layer.
    pub token: String,
    pub user: PublicUser,
}

/// Input for the registration flow.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// Defaults to false when absent; forced true for admins.
    pub can_create_appointments: Option<bool>,
    pub can_modify_appointments: Option<bool>,
}

/// Authentication service.
///
/// Generic over the user repository so this crate carries no
/// dependency on the database crate.
pub struct AuthService<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    /// Authenticate with email + password and issue a session token.
    ///
    /// Unknown email, deactivated account, and wrong password all
    /// collapse into the same invalid-credentials outcome.
    pub async fn login(&self, email: &str, password: &str) -> BooklineResult<LoginOutput> {
        let email = email.to_lowercase();

        let user = match self.user_repo.get_by_email(&email).await {
            Ok(user) => user,
            Err(BooklineError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        if !user.active {
            return Err(AuthError::InvalidCredentials.into());
        }

        let valid = password::verify_password(
            password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        let token = token::issue_session_token(&user, &self.config)?;
        info!(email = %user.email, "user logged in");

        Ok(LoginOutput {
            token,
            user: user.into(),
        })
    }

    /// Register a new user and log them in immediately.
    ///
    /// Admins always get both capability flags regardless of the
    /// requested values; for providers, absent flags default to false.
    pub async fn register(&self, input: RegisterInput) -> BooklineResult<LoginOutput> {
        if input.name.is_empty() || input.email.is_empty() {
            return Err(BooklineError::Validation {
                message: "name and email are required".into(),
            });
        }
        if input.password.len() < self.config.min_password_length {
            return Err(BooklineError::Validation {
                message: format!(
                    "password must be at least {} characters",
                    self.config.min_password_length
                ),
            });
        }

        let email = input.email.to_lowercase();
        match self.user_repo.get_by_email(&email).await {
            Ok(_) => {
                return Err(BooklineError::AlreadyExists {
                    entity: "user".into(),
                });
            }
            Err(BooklineError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let is_admin = input.role == Role::Admin;
        let user = self
            .user_repo
            .create(CreateUser {
                name: input.name,
                email,
                password: input.password,
                role: input.role,
                can_create_appointments: is_admin
                    || input.can_create_appointments.unwrap_or(false),
                can_modify_appointments: is_admin
                    || input.can_modify_appointments.unwrap_or(false),
            })
            .await?;

        let token = token::issue_session_token(&user, &self.config)?;
        info!(email = %user.email, role = %user.role, "user registered");

        Ok(LoginOutput {
            token,
            user: user.into(),
        })
    }

    /// Live identity lookup for the token bearer.
    ///
    /// Unlike the claims themselves this reflects the current stored
    /// state, so a capability change shows up here before the stale
    /// token expires.
    pub async fn profile(&self, claims: &SessionClaims) -> BooklineResult<PublicUser> {
        let user = self.user_repo.get_by_id(claims.user_id()?).await?;
        Ok(user.into())
    }

    /// First-run bootstrap: create a default admin unless one exists.
    ///
    /// Idempotent — returns `None` when an admin is already present.
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BooklineResult<Option<PublicUser>> {
        let admins = self
            .user_repo
            .list(UserFilter {
                role: Some(Role::Admin),
                active: None,
            })
            .await?;
        if !admins.is_empty() {
            return Ok(None);
        }

        let user = self
            .user_repo
            .create(CreateUser {
                name: name.into(),
                email: email.to_lowercase(),
                password: password.into(),
                role: Role::Admin,
                can_create_appointments: true,
                can_modify_appointments: true,
            })
            .await?;
        info!(email = %user.email, "bootstrap admin created");

        Ok(Some(user.into()))
    }
}
