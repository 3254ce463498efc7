//! # Parley
//!
//! A command framework for chat bots connected to a real-time gateway.
//!
//! ## Overview
//!
//! Bot authors register commands as whitespace-separated templates with
//! named placeholders (`getuser <user>`, `add <a:integer> <b:integer>`).
//! Incoming messages are normalized, checked against the registered
//! templates in order, and the first match runs its handler with a
//! [`Conversation`](parley_framework::Conversation) bound to the message.
//! Dialogs and modals are tied to their submissions by callback id so a
//! single flow can serve many users at once.
//!
//! ```text
//! ┌─────────────┐  GatewayEvent  ┌────────┐     ┌────────────┐
//! │   Gateway   │───────────────▶│ Router │────▶│ Dispatcher │──▶ command handlers
//! │ (external)  │                │        │────▶│ Correlator │──▶ dialog / modal flows
//! └─────────────┘◀───────────────└────────┘     └────────────┘
//!                 replies, acks
//! ```
//!
//! - **Core** (`parley-core`): events, messages and the [`Gateway`](parley_core::Gateway) contract
//! - **Framework** (`parley-framework`): templates, dispatch, conversations, interactions
//! - **Runtime** (`parley-runtime`): configuration, logging and the run loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ParleyRuntime::new();
//!     let (gateway, events) = my_gateway::connect().await?;
//!
//!     let mut bot = runtime.connect(gateway).await?;
//!     bot.command("uptime", |conv: Conversation| async move {
//!         conv.reply("up and running").await;
//!     })?;
//!
//!     runtime.run(bot, events).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `parley.toml` (default)
//! - `yaml-config`: load `parley.yaml`
//! - `json-log`: JSON log output

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;

/// Commonly used types for building bots.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use parley_runtime::{ParleyConfig, ParleyRuntime};

    // Bot setup
    pub use parley_framework::{Bot, Command, InteractionRegistration, SetupError, SetupResult};

    // Handler contexts
    pub use parley_framework::{
        Conversation, EventContext, InteractionContext, SlashContext, reply,
    };
    pub use parley_framework::{HandlerError, HandlerResult, SessionStore};

    // Gateway contract and payloads
    pub use parley_core::{
        Attachment, AttachmentAction, BoxedGateway, EventKind, Gateway, GatewayEvent,
        GatewayResult, InteractionEvent, InteractionType,
    };

    // Logging
    pub use parley_runtime::prelude::*;
}
