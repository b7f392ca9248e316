//! # relayhub-api
//!
//! HTTP API layer for RelayHub built on Axum.
//!
//! Provides the WebSocket relay endpoint, the status and metrics probes,
//! shared state, and error mapping.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
