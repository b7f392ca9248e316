//! Convenience result type alias for RelayHub.

use crate::error::AppError;

/// A specialized `Result` type for RelayHub operations.
pub type AppResult<T> = Result<T, AppError>;
