//! Message types exchanged with the gateway.
//!
//! - [`MessageEvent`] is the raw message payload as the gateway delivers it,
//!   both for plain message events and for app-mention events.
//! - [`InboundMessage`] is the normalized view the dispatcher works with.
//! - [`Attachment`] is the outbound legacy-attachment payload used for
//!   messages carrying action buttons.

use serde::{Deserialize, Serialize};

/// Channel types the gateway reports for direct conversations.
const DIRECT_CHANNEL_TYPE: &str = "im";

/// Direct-message channel identifiers start with this character.
const DIRECT_CHANNEL_PREFIX: char = 'D';

// ============================================================================
// Raw Message Event
// ============================================================================

/// A message as delivered by the gateway's events API.
///
/// # Examples
///
/// ```
/// use parley_core::MessageEvent;
///
/// let json = r#"{"channel": "D024BE91L", "user": "U2147483697", "text": "help", "ts": "1355517523.000005"}"#;
/// let event: MessageEvent = serde_json::from_str(json).unwrap();
/// assert!(event.is_direct());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Channel where the message was posted.
    pub channel: String,

    /// Channel type (`im`, `channel`, `group`, `mpim`), when reported.
    #[serde(default)]
    pub channel_type: Option<String>,

    /// Author of the message (absent for some bot messages).
    #[serde(default)]
    pub user: Option<String>,

    /// Message text, still carrying gateway link markup.
    #[serde(default)]
    pub text: String,

    /// Timestamp identifying this message.
    #[serde(default)]
    pub ts: String,

    /// Thread parent timestamp, present only for thread replies.
    #[serde(default)]
    pub thread_ts: Option<String>,

    /// Bot identifier if the message was posted by a bot.
    #[serde(default)]
    pub bot_id: Option<String>,

    /// Message subtype (`bot_message`, `channel_join`, ...).
    #[serde(default)]
    pub subtype: Option<String>,
}

impl MessageEvent {
    /// Returns `true` if the message was posted in a direct-message channel.
    pub fn is_direct(&self) -> bool {
        match self.channel_type.as_deref() {
            Some(kind) => kind == DIRECT_CHANNEL_TYPE,
            None => self.channel.starts_with(DIRECT_CHANNEL_PREFIX),
        }
    }

    /// Returns `true` if the message was posted by a bot integration.
    pub fn is_from_bot(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }
}

// ============================================================================
// Normalized Inbound Message
// ============================================================================

/// How an inbound message reached the bot.
///
/// Computed once during normalization and carried on the [`InboundMessage`]
/// so that help routing and reply-only gating agree on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Posted in a direct-message channel with the bot.
    Direct,
    /// A plain message in a shared channel.
    Channel,
    /// An explicit app-mention event.
    Mention,
}

impl MessageKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Channel => "channel",
            Self::Mention => "mention",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized inbound message.
///
/// Produced once per gateway event by the framework's normalizer and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    channel: String,
    user: String,
    raw_text: String,
    text: String,
    kind: MessageKind,
    mentions_bot: bool,
    ts: String,
    thread_ts: Option<String>,
}

impl InboundMessage {
    /// Creates a normalized message.
    ///
    /// `text` must already be normalized; `raw_text` is kept for handlers
    /// that need the original markup.
    pub fn new(
        channel: impl Into<String>,
        user: impl Into<String>,
        raw_text: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            channel: channel.into(),
            user: user.into(),
            raw_text: raw_text.into(),
            text: text.into(),
            kind,
            mentions_bot: false,
            ts: String::new(),
            thread_ts: None,
        }
    }

    /// Records whether the raw text contained the bot's mention token.
    pub fn with_mentions_bot(mut self, mentions_bot: bool) -> Self {
        self.mentions_bot = mentions_bot;
        self
    }

    /// Sets the message timestamp.
    pub fn with_ts(mut self, ts: impl Into<String>) -> Self {
        self.ts = ts.into();
        self
    }

    /// Sets the thread parent timestamp.
    pub fn with_thread_ts(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }

    /// Channel the message came from.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Author of the message.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Text as received, before normalization.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Normalized text used for matching.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How the message reached the bot.
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Message timestamp.
    pub fn ts(&self) -> &str {
        &self.ts
    }

    /// Thread parent timestamp, if the message is a thread reply.
    pub fn thread_ts(&self) -> Option<&str> {
        self.thread_ts.as_deref()
    }

    /// Returns `true` if the message arrived in a direct-message channel.
    pub fn is_direct_message(&self) -> bool {
        self.kind == MessageKind::Direct
    }

    /// Returns `true` if the raw text mentioned the bot.
    pub fn mentions_bot(&self) -> bool {
        self.mentions_bot
    }

    /// Returns `true` if the message is addressed to the bot: a direct
    /// message, an app-mention event, or text containing the bot's mention.
    pub fn is_relevant(&self) -> bool {
        match self.kind {
            MessageKind::Direct | MessageKind::Mention => true,
            MessageKind::Channel => self.mentions_bot,
        }
    }
}

// ============================================================================
// Outbound Attachments
// ============================================================================

/// A button (or other action) on a legacy message attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentAction {
    /// Action name reported back in the interaction payload.
    pub name: String,
    /// Label shown to the user.
    pub text: String,
    /// Action type, `button` for buttons.
    #[serde(rename = "type")]
    pub action_type: String,
    /// Value reported back in the interaction payload.
    pub value: String,
}

impl AttachmentAction {
    /// Creates a button action.
    pub fn button(
        name: impl Into<String>,
        text: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            action_type: "button".to_string(),
            value: value.into(),
        }
    }
}

/// A legacy message attachment.
///
/// The `callback_id` is what ties a button click back to an interaction
/// registration; bots set it to their own identity followed by the
/// registration suffix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment body text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Sidebar color, e.g. `#3AA3E3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Callback identifier reported back on interaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    /// Interactive actions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
}

impl Attachment {
    /// Creates an attachment with the given text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Sets the sidebar color.
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the callback identifier.
    pub fn callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }

    /// Adds an action.
    pub fn action(mut self, action: AttachmentAction) -> Self {
        self.actions.push(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(channel: &str, channel_type: Option<&str>) -> MessageEvent {
        MessageEvent {
            channel: channel.to_string(),
            channel_type: channel_type.map(str::to_string),
            user: Some("U1".to_string()),
            text: "hi".to_string(),
            ts: "1.0".to_string(),
            thread_ts: None,
            bot_id: None,
            subtype: None,
        }
    }

    #[test]
    fn test_direct_detection() {
        assert!(event("D123", None).is_direct());
        assert!(!event("C123", None).is_direct());
        assert!(event("C123", Some("im")).is_direct());
        assert!(!event("D123", Some("channel")).is_direct());
    }

    #[test]
    fn test_relevance() {
        let msg = InboundMessage::new("C1", "U1", "hi", "hi", MessageKind::Channel);
        assert!(!msg.is_relevant());
        assert!(msg.clone().with_mentions_bot(true).is_relevant());

        let dm = InboundMessage::new("D1", "U1", "hi", "hi", MessageKind::Direct);
        assert!(dm.is_relevant());
        assert!(dm.is_direct_message());

        let mention = InboundMessage::new("C1", "U1", "hi", "hi", MessageKind::Mention);
        assert!(mention.is_relevant());
        assert!(!mention.is_direct_message());
    }

    #[test]
    fn test_attachment_serialization() {
        let attachment = Attachment::new("Order?")
            .callback_id("B1coffee")
            .action(AttachmentAction::button("order", "Order", "order"));
        let value = serde_json::to_value(&attachment).unwrap();

        assert_eq!(value["callback_id"], "B1coffee");
        assert_eq!(value["actions"][0]["type"], "button");
        assert!(value.get("color").is_none());
    }
}
