//! Connection identities and the role each one plays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token naming a connection's owner.
///
/// The identity string doubles as the name of its pub/sub channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Wraps a raw identity string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the pub/sub channel this identity listens on.
    pub fn channel(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl AsRef<str> for Identity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The role an identity plays on the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single privileged identity that addresses devices.
    Controller,
    /// Any other identity.
    Device,
}

impl Role {
    /// Classifies `identity` against the configured controller identity.
    pub fn of(identity: &Identity, controller: &Identity) -> Self {
        if identity == controller {
            Self::Controller
        } else {
            Self::Device
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller => write!(f, "controller"),
            Self::Device => write!(f, "device"),
        }
    }
}
