//! Coursebook Backend Library
//!
//! Authentication layer for the Coursebook API: argon2id password storage,
//! short-lived HS256 session tokens and a request gate in front of every
//! route. Exposed as a library for the binary and the integration tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
