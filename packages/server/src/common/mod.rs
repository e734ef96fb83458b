//! Shared types used across the server.

pub mod errors;

pub use errors::{ApiError, ErrorBody};
