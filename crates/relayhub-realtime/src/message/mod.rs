//! Wire envelopes, inbound frames, and role-aware routing.

pub mod envelope;
pub mod frame;
pub mod router;

pub use envelope::{ControllerCommand, DeviceEvent};
pub use frame::InboundFrame;
pub use router::{MessageRouter, Routed};
