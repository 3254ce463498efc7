//! # Parley Core
//!
//! Foundation types for the Parley bot framework.
//!
//! This crate defines what flows between a real-time chat gateway and the
//! command framework:
//!
//! - **Events**: [`GatewayEvent`] and its payloads ([`MessageEvent`],
//!   [`InteractionEvent`], [`SlashCommand`])
//! - **Messages**: the normalized [`InboundMessage`] and outbound
//!   [`Attachment`]s
//! - **Gateway contract**: the [`Gateway`] trait for outbound operations
//! - **Errors**: [`GatewayError`] for delivery failures and [`LookupError`]
//!   for collaborator queries
//!
//! ```text
//! ┌─────────────┐  GatewayEvent   ┌─────────────┐
//! │   Gateway   │────────────────▶│     Bot     │
//! │ (external)  │◀────────────────│ (framework) │
//! └─────────────┘  Gateway trait  └─────────────┘
//! ```

pub mod error;
pub mod event;
pub mod gateway;
pub mod interaction;
pub mod message;

pub use error::{GatewayError, GatewayResult, LookupError, LookupResult};
pub use event::{EventKind, GatewayEvent};
pub use gateway::{BoxedGateway, Gateway, UserProfile};
pub use interaction::{
    ChannelRef, InteractionAction, InteractionEvent, InteractionType, SlashCommand, UserRef, View,
};
pub use message::{Attachment, AttachmentAction, InboundMessage, MessageEvent, MessageKind};
