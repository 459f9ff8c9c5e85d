//! Bookline Database — SurrealDB connection management, schema
//! migrations, and implementations of the `bookline-core` repository
//! traits.

mod connection;
mod error;
mod schema;

pub mod repository;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
