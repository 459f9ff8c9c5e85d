//! Error types for the Bookline system.

use thiserror::Error;

use crate::models::appointment::AppointmentStatus;

#[derive(Debug, Error)]
pub enum BooklineError {
    /// Missing or undecodable credential — the bearer could not be
    /// identified at all.
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// Valid credential, insufficient capability for the requested
    /// action.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Appointment status change the lifecycle does not permit.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    /// Slot overlap, detected by the pre-write occupancy check or by
    /// the store's serialization point.
    #[error("Scheduling conflict: {message}")]
    Conflict { message: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type BooklineResult<T> = Result<T, BooklineError>;
