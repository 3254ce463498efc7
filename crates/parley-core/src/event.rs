//! Gateway event envelope.
//!
//! The gateway collaborator decodes its transport frames into
//! [`GatewayEvent`]s and feeds them to the bot's receive loop. Each event
//! carries the envelope id it must be acknowledged with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interaction::{InteractionEvent, SlashCommand};
use crate::message::MessageEvent;

/// The payload of a gateway event.
///
/// Serialized adjacently tagged, e.g.
/// `{"kind": "message", "payload": {"channel": "C1", ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum EventKind {
    /// A plain message event.
    Message(MessageEvent),
    /// An explicit app-mention event.
    AppMention(MessageEvent),
    /// An interactive callback.
    Interaction(InteractionEvent),
    /// A slash command invocation.
    SlashCommand(SlashCommand),
    /// Any other events-API event, kept raw.
    Other {
        /// The events-API event type.
        event_type: String,
        /// The raw inner event.
        #[serde(default)]
        data: Value,
    },
}

impl EventKind {
    /// Returns a short name for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::Message(_) => "message",
            Self::AppMention(_) => "app_mention",
            Self::Interaction(_) => "interaction",
            Self::SlashCommand(_) => "slash_command",
            Self::Other { event_type, .. } => event_type,
        }
    }
}

/// An event delivered by the gateway.
///
/// # Examples
///
/// ```
/// use parley_core::{EventKind, GatewayEvent};
///
/// let json = r#"{
///     "envelope_id": "e-1",
///     "kind": "app_mention",
///     "payload": {"channel": "C1", "user": "U1", "text": "<@B1> help", "ts": "1.0"}
/// }"#;
/// let event: GatewayEvent = serde_json::from_str(json).unwrap();
/// assert_eq!(event.envelope_id.as_deref(), Some("e-1"));
/// assert!(matches!(event.kind, EventKind::AppMention(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayEvent {
    /// Envelope identifier used to acknowledge the event, if the gateway
    /// requires acknowledgement.
    #[serde(default)]
    pub envelope_id: Option<String>,

    /// The event payload.
    #[serde(flatten)]
    pub kind: EventKind,
}

impl GatewayEvent {
    /// Creates an event without an envelope.
    pub fn new(kind: EventKind) -> Self {
        Self {
            envelope_id: None,
            kind,
        }
    }

    /// Sets the envelope identifier.
    pub fn with_envelope(mut self, envelope_id: impl Into<String>) -> Self {
        self.envelope_id = Some(envelope_id.into());
        self
    }
}
