//! Administrator user management — list, create, update, deactivate.
//!
//! Every operation is gated on the manage-users action; authorization
//! is checked before any store access so a non-admin caller learns
//! nothing about which users exist.

use uuid::Uuid;

use bookline_core::error::{BooklineError, BooklineResult};
use bookline_core::models::user::{CreateUser, PublicUser, Role, UpdateUser, UserFilter};
use bookline_core::repository::UserRepository;

use crate::config::AuthConfig;
use crate::policy::{self, Action};
use crate::token::SessionClaims;

pub struct UserDirectory<U: UserRepository> {
    user_repo: U,
    config: AuthConfig,
}

impl<U: UserRepository> UserDirectory<U> {
    pub fn new(user_repo: U, config: AuthConfig) -> Self {
        Self { user_repo, config }
    }

    /// Active users, optionally narrowed by role.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        claims: &SessionClaims,
    ) -> BooklineResult<Vec<PublicUser>> {
        policy::require(claims, Action::ManageUsers)?;
        let users = self
            .user_repo
            .list(UserFilter {
                role,
                active: Some(true),
            })
            .await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    pub async fn create_user(
        &self,
        input: CreateUser,
        claims: &SessionClaims,
    ) -> BooklineResult<PublicUser> {
        policy::require(claims, Action::ManageUsers)?;

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
                email,
                can_create_appointments: is_admin || input.can_create_appointments,
                can_modify_appointments: is_admin || input.can_modify_appointments,
                ..input
            })
            .await?;
        Ok(user.into())
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        mut patch: UpdateUser,
        claims: &SessionClaims,
    ) -> BooklineResult<PublicUser> {
        policy::require(claims, Action::ManageUsers)?;

        if let Some(ref password) = patch.password {
            if password.len() < self.config.min_password_length {
                return Err(BooklineError::Validation {
                    message: format!(
                        "password must be at least {} characters",
                        self.config.min_password_length
                    ),
                });
            }
        }
        if let Some(email) = patch.email.take() {
            patch.email = Some(email.to_lowercase());
        }

        let user = self.user_repo.update(id, patch).await?;
        Ok(user.into())
    }

    /// Soft delete — the row stays so historical appointments keep a
    /// valid provider reference.
    pub async fn deactivate_user(&self, id: Uuid, claims: &SessionClaims) -> BooklineResult<()> {
        policy::require(claims, Action::ManageUsers)?;
        self.user_repo.deactivate(id).await
    }
}
