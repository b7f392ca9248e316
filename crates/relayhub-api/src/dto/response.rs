//! Response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Liveness message.
    pub message: String,
    /// Server version.
    pub version: String,
}

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}
