//! Relay identity and credential configuration.

use secrecy::SecretString;
use serde::Deserialize;

/// Relay configuration: who the controller is and what each role must present.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Identity reserved for the controller. Every other identity is a device.
    #[serde(default = "default_controller_id")]
    pub controller_id: String,
    /// Credential the controller must present.
    #[serde(default)]
    pub controller_secret: Option<SecretString>,
    /// Credential shared by all devices.
    #[serde(default)]
    pub device_secret: Option<SecretString>,
    /// Name of the handshake header carrying the credential.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    /// Capacity of each connection's outbound queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            controller_id: default_controller_id(),
            controller_secret: None,
            device_secret: None,
            auth_header: default_auth_header(),
            outbound_buffer_size: default_outbound_buffer(),
        }
    }
}

fn default_controller_id() -> String {
    "LLM".to_string()
}

fn default_auth_header() -> String {
    "x-auth-token".to_string()
}

fn default_outbound_buffer() -> usize {
    256
}
