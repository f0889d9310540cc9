//! Startup errors for the demo binary.

use chronicle_core::error::{DomainError, RegistrationError};
use thiserror::Error;

/// Everything that can stop the demo from running.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is present but unparsable.
    #[error("configuration error: {key}={value:?}: {reason}")]
    Config {
        /// The offending variable.
        key: &'static str,
        /// Its raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Wiring the runtime failed.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// The scenario itself failed.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}
