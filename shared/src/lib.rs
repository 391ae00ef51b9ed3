//! Coursebook Shared Library
//!
//! This crate contains the wire types and input validation shared between
//! the backend and its clients.

pub mod types;
pub mod validation;

// Re-export commonly used items
pub use types::*;
