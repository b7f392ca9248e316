//! # relayhub-core
//!
//! Core crate for RelayHub. Contains configuration schemas, the identity
//! model (one controller, many devices), the pub/sub transport traits,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other RelayHub crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
