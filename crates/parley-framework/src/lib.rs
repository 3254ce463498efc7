//! # Parley Framework
//!
//! Command matching, dispatch and interaction correlation for chat bots.
//!
//! This layer provides:
//! - Template compilation with named placeholders ([`Template`])
//! - An ordered command table with generated help ([`CommandRegistry`])
//! - Message normalization ([`Normalizer`])
//! - The dispatch policy: help, reply-only gating, first match, unknown
//!   command ([`Dispatcher`])
//! - Two-phase dialog and modal flows keyed by callback id ([`Correlator`])
//! - The [`Bot`] setup object and its receive loop
//!
//! ```text
//! GatewayEvent ─▶ Router ─┬─▶ Normalizer ─▶ Dispatcher ─▶ Command ─▶ Conversation
//!                         ├─▶ Correlator ─▶ opener / submission
//!                         └─▶ slash command / event handlers
//! ```

pub mod ack;
pub mod bot;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod handler;
pub mod interaction;
pub mod normalize;
pub mod pattern;
pub mod registry;
pub mod session;
pub mod slash;

#[cfg(test)]
mod testing;

pub use ack::{Ack, AckOutcome, DEFAULT_ACK_WINDOW};
pub use bot::{Bot, Routed, Router};
pub use command::Command;
pub use context::Conversation;
pub use dispatcher::{Dispatch, Dispatcher};
pub use error::{HandlerError, HandlerResult, PatternError, PatternResult, SetupError, SetupResult};
pub use handle::BotHandle;
pub use handler::{BoxedHandler, Handler, into_handler};
pub use interaction::{
    Correlator, InteractionContext, InteractionHandler, InteractionKind, InteractionRegistration,
    Phase, Route,
};
pub use normalize::Normalizer;
pub use pattern::{Match, ParamKind, Template};
pub use registry::{CommandRegistry, HELP_BANNER, HELP_SEPARATOR};
pub use session::SessionStore;
pub use slash::{EventContext, EventHandler, SlashContext, SlashHandler};
