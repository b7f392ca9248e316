//! Identity gate. Checks the credential a connection presents for its claimed identity.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

use relayhub_core::config::relay::RelayConfig;
use relayhub_core::error::AppError;
use relayhub_core::types::{Identity, Role};

/// SHA-256 of a credential. Comparing digests keeps the comparison
/// independent of the presented credential's length.
type CredentialDigest = [u8; 32];

fn digest(credential: &str) -> CredentialDigest {
    Sha256::digest(credential.as_bytes()).into()
}

/// Admits or rejects connection attempts.
///
/// The controller identity must present the controller secret; every
/// other identity must present the shared device secret.
#[derive(Clone)]
pub struct IdentityGate {
    /// Identity reserved for the controller.
    controller: Identity,
    /// Digest of the controller secret.
    controller_digest: CredentialDigest,
    /// Digest of the shared device secret.
    device_digest: CredentialDigest,
}

impl std::fmt::Debug for IdentityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityGate")
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

impl IdentityGate {
    /// Creates a gate from the controller identity and both secrets.
    pub fn new(
        controller: Identity,
        controller_secret: &SecretString,
        device_secret: &SecretString,
    ) -> Self {
        Self {
            controller,
            controller_digest: digest(controller_secret.expose_secret()),
            device_digest: digest(device_secret.expose_secret()),
        }
    }

    /// Creates a gate from relay configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self, AppError> {
        let controller_secret = config
            .controller_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .ok_or_else(|| AppError::configuration("relay.controller_secret is not set"))?;
        let device_secret = config
            .device_secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty())
            .ok_or_else(|| AppError::configuration("relay.device_secret is not set"))?;

        Ok(Self::new(
            Identity::new(config.controller_id.clone()),
            controller_secret,
            device_secret,
        ))
    }

    /// The controller identity.
    pub fn controller(&self) -> &Identity {
        &self.controller
    }

    /// Role the given identity plays.
    pub fn role_of(&self, identity: &Identity) -> Role {
        Role::of(identity, &self.controller)
    }

    /// Single-shot credential check for a connection attempt.
    ///
    /// A missing credential never matches. Rejections are audited at warn
    /// level with the identity only.
    pub fn authorize(&self, identity: &Identity, credential: Option<&str>) -> bool {
        let role = self.role_of(identity);
        let expected = match role {
            Role::Controller => &self.controller_digest,
            Role::Device => &self.device_digest,
        };

        let presented = digest(credential.unwrap_or_default());
        let matches: bool = presented.ct_eq(expected).into();
        let authorized = matches && credential.is_some();

        if !authorized {
            warn!(identity = %identity, role = %role, "Unauthorized connection attempt");
        }

        authorized
    }
}
