//! Parley Runtime - process layer for the Parley bot framework.
//!
//! This crate provides:
//! - Layered configuration via figment (`parley.toml`, `PARLEY_*` variables)
//! - Logging setup on `tracing-subscriber`
//! - The [`ParleyRuntime`] that applies settings to a [`parley_framework::Bot`]
//!   and runs it until Ctrl+C, SIGTERM or the end of the event stream
//!
//! ```ignore
//! use parley_runtime::ParleyRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ParleyRuntime::new();
//!     let (gateway, events) = my_gateway::connect().await?;
//!
//!     let mut bot = runtime.connect(gateway).await?;
//!     bot.command("uptime", uptime)?;
//!
//!     runtime.run(bot, events).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{
    BotSettings, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, ParleyConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ParleyRuntime, RuntimeBuilder};

// Re-export tracing for use by bot crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for bot code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
