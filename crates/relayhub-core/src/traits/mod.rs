//! Trait seams between the relay and its collaborators.

pub mod transport;

pub use transport::{PubSubMessage, PubSubTransport, Subscription};
