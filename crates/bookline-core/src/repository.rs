//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. The service crates are generic
//! over these traits so they carry no dependency on the database crate.

use uuid::Uuid;

use crate::error::BooklineResult;
use crate::models::{
    appointment::{Appointment, AppointmentFilter, CreateAppointment, UpdateAppointment},
    user::{CreateUser, UpdateUser, User, UserFilter},
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Create a user. The raw password in the input is hashed at the
    /// storage boundary; the stored record only ever holds the digest.
    fn create(&self, input: CreateUser) -> impl Future<Output = BooklineResult<User>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BooklineResult<User>> + Send;

    /// Lookup by (already normalized) email, active or not.
    fn get_by_email(&self, email: &str) -> impl Future<Output = BooklineResult<User>> + Send;

    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = BooklineResult<User>> + Send;

    /// Soft delete: flips `active` to false. Rows are never removed so
    /// historical appointments keep a valid provider reference.
    fn deactivate(&self, id: Uuid) -> impl Future<Output = BooklineResult<()>> + Send;

    fn list(&self, filter: UserFilter) -> impl Future<Output = BooklineResult<Vec<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

pub trait AppointmentRepository: Send + Sync {
    /// Persist a new appointment with status = pending.
    ///
    /// Implementations must provide a serialization point for the
    /// provider/date/interval, so that of two concurrent writers that
    /// both observed a free slot exactly one succeeds; the loser gets
    /// a conflict error indistinguishable from a pre-check conflict.
    fn insert(
        &self,
        input: CreateAppointment,
    ) -> impl Future<Output = BooklineResult<Appointment>> + Send;

    fn get_by_id(&self, id: Uuid) -> impl Future<Output = BooklineResult<Appointment>> + Send;

    /// Apply a patch. When the patch carries slot fields (the caller
    /// supplies all four together, see
    /// [`UpdateAppointment::changes_slot`]), the same serialization
    /// point as [`insert`](Self::insert) applies, excluding the record
    /// being edited.
    fn update(
        &self,
        id: Uuid,
        patch: UpdateAppointment,
    ) -> impl Future<Output = BooklineResult<Appointment>> + Send;

    /// Physical removal, distinct from cancellation.
    fn delete(&self, id: Uuid) -> impl Future<Output = BooklineResult<()>> + Send;

    /// Filtered listing, sorted by (date, start) ascending.
    fn find(
        &self,
        filter: AppointmentFilter,
    ) -> impl Future<Output = BooklineResult<Vec<Appointment>>> + Send;
}
