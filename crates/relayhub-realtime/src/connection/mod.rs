//! Connection admission and bookkeeping.

pub mod authenticator;
pub mod handle;
pub mod registry;

pub use authenticator::IdentityGate;
pub use handle::ConnectionHandle;
pub use registry::ConnectionRegistry;
