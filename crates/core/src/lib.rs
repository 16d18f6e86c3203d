//! Core business logic for alumni-rs.

pub mod services;

pub use services::*;
