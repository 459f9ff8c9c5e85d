//! Access policy — the single decision table for every gated action.
//!
//! Every entry point consults [`authorize`] (usually via [`require`])
//! exactly once per action instead of repeating ad hoc role
//! comparisons. Admins supersede the stored capability flags.

use bookline_core::error::{BooklineError, BooklineResult};
use bookline_core::models::user::Role;

use crate::token::SessionClaims;

/// The actions the policy knows how to gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Read appointments within the caller's own scope. For
    /// non-admins the effective scope is narrowed to appointments
    /// whose provider is the caller; the narrowing itself happens at
    /// the query layer.
    ReadOwnAppointments,
    /// Read the full calendar across providers.
    ReadAllAppointments,
    CreateAppointment,
    /// Covers edit, status change, cancellation, and deletion.
    ModifyAppointment,
    ManageUsers,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::ReadOwnAppointments => "read-own-appointments",
            Action::ReadAllAppointments => "read-all-appointments",
            Action::CreateAppointment => "create-appointment",
            Action::ModifyAppointment => "modify-appointment",
            Action::ManageUsers => "manage-users",
        };
        write!(f, "{s}")
    }
}

/// Pure decision function from validated claims + action to
/// allow/deny. Absent or undecodable claims never reach this point —
/// that is an Unauthorized outcome upstream.
pub fn authorize(claims: &SessionClaims, action: Action) -> bool {
    match action {
        Action::ManageUsers => claims.is_admin(),
        Action::CreateAppointment => claims.is_admin() || claims.can_create_appointments,
        Action::ModifyAppointment => claims.is_admin() || claims.can_modify_appointments,
        // Providers may see the full calendar; writes stay gated above.
        Action::ReadAllAppointments => matches!(claims.role, Role::Admin | Role::Provider),
        Action::ReadOwnAppointments => true,
    }
}

/// [`authorize`] as a `Result`, for `?`-style gating at entry points.
pub fn require(claims: &SessionClaims, action: Action) -> BooklineResult<()> {
    if authorize(claims, action) {
        Ok(())
    } else {
        Err(BooklineError::Forbidden {
            reason: format!("missing capability for {action}"),
        })
    }
}
