//! Bookline Core — domain models, repository trait definitions, and the
//! shared error taxonomy.
//!
//! This crate has no knowledge of storage engines or transport; the
//! service crates (`bookline-auth`, `bookline-sched`) are generic over
//! the repository traits defined here, and `bookline-db` implements
//! them.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{BooklineError, BooklineResult};
