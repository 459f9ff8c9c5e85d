//! SurrealDB repository implementations.

mod appointment;
mod user;

pub use appointment::SurrealAppointmentRepository;
pub use user::SurrealUserRepository;
