//! # relayhub-realtime
//!
//! Relay engine for RelayHub. One controller exchanges short messages
//! with many devices; every identity owns one pub/sub channel. Provides:
//!
//! - Identity gate with constant-time credential checks
//! - Connection registry enforcing one live connection per identity
//! - Per-connection channel bridges from the transport to the socket
//! - Role-aware message routing (controller commands, device events)
//! - Redis and in-memory pub/sub transports

pub mod bridge;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod server;

pub use bridge::channel_bridge::ChannelBridge;
pub use connection::authenticator::IdentityGate;
pub use connection::registry::{AlreadyConnected, ConnectionRegistry};
pub use message::frame::InboundFrame;
pub use message::router::MessageRouter;
pub use server::{AdmissionError, RelayHub, RelaySession};
