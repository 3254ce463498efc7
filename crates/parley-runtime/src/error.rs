//! Runtime error types.

use thiserror::Error;

pub use crate::config::{ConfigError, ConfigResult};

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The gateway rejected a call, e.g. the identity check at startup.
    #[error("Gateway error: {0}")]
    Gateway(#[from] parley_core::GatewayError),

    /// A command or handler could not be registered.
    #[error("Setup error: {0}")]
    Setup(#[from] parley_framework::SetupError),

    /// `run` was called while a bot is already running.
    #[error("Runtime is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
