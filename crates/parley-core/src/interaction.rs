//! Interactive callback payloads.
//!
//! Button clicks on bot-posted messages, dialog submissions and modal view
//! submissions all arrive as an [`InteractionEvent`]. The
//! [`InteractionType`] discriminator tells them apart; the callback id that
//! identifies the logical interaction lives at the top level for legacy
//! dialogs and inside [`View`] for modals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The gateway-level interaction discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// A button or menu on a legacy message attachment.
    InteractiveMessage,
    /// A legacy dialog was submitted.
    DialogSubmission,
    /// A legacy dialog was cancelled.
    DialogCancellation,
    /// An action inside a block-kit surface.
    BlockActions,
    /// A modal view was submitted.
    ViewSubmission,
    /// A modal view was closed.
    ViewClosed,
    /// A global shortcut.
    Shortcut,
    /// A message shortcut.
    MessageAction,
    /// Any interaction type this crate does not know about.
    #[serde(other)]
    Unknown,
}

impl InteractionType {
    /// Returns the wire name of this interaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InteractiveMessage => "interactive_message",
            Self::DialogSubmission => "dialog_submission",
            Self::DialogCancellation => "dialog_cancellation",
            Self::BlockActions => "block_actions",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::Shortcut => "shortcut",
            Self::MessageAction => "message_action",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User reference inside an interaction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier.
    pub id: String,
    /// User name, when reported.
    #[serde(default)]
    pub name: String,
}

/// Channel reference inside an interaction payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    /// Channel identifier.
    pub id: String,
    /// Channel name, when reported.
    #[serde(default)]
    pub name: String,
}

/// A single action from an `interactive_message` or `block_actions` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionAction {
    /// Legacy attachment action name.
    #[serde(default)]
    pub name: String,
    /// Block-kit action identifier.
    #[serde(default)]
    pub action_id: String,
    /// Value attached to the action.
    #[serde(default)]
    pub value: String,
}

/// A modal view as reported in `view_submission` payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    /// View identifier, used to update the view.
    pub id: String,
    /// Version hash; updates are rejected if it is stale.
    #[serde(default)]
    pub hash: String,
    /// Callback identifier the bot set when opening the view.
    #[serde(default)]
    pub callback_id: String,
    /// Submitted input state.
    #[serde(default)]
    pub state: Value,
    /// Opaque metadata the bot attached to the view.
    #[serde(default)]
    pub private_metadata: String,
}

/// An interactive callback.
///
/// # Examples
///
/// ```
/// use parley_core::{InteractionEvent, InteractionType};
///
/// let json = r#"{
///     "type": "view_submission",
///     "user": {"id": "U2"},
///     "view": {"id": "V1", "hash": "h1", "callback_id": "U2modal_coffee_order_form"}
/// }"#;
/// let event: InteractionEvent = serde_json::from_str(json).unwrap();
/// assert_eq!(event.interaction_type, InteractionType::ViewSubmission);
/// assert_eq!(event.view_callback_id(), Some("U2modal_coffee_order_form"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Interaction type discriminator.
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,

    /// Top-level callback identifier (legacy attachments and dialogs).
    #[serde(default)]
    pub callback_id: String,

    /// The user who triggered or submitted the interaction.
    pub user: UserRef,

    /// Channel the interaction happened in, if any.
    #[serde(default)]
    pub channel: Option<ChannelRef>,

    /// Trigger identity usable to open a new dialog or modal.
    #[serde(default)]
    pub trigger_id: Option<String>,

    /// Timestamp of the message the interaction is attached to.
    #[serde(default)]
    pub message_ts: Option<String>,

    /// Actions taken (buttons clicked, options selected).
    #[serde(default)]
    pub actions: Vec<InteractionAction>,

    /// Dialog submission values.
    #[serde(default)]
    pub submission: Option<Value>,

    /// Modal view, for view interactions.
    #[serde(default)]
    pub view: Option<View>,

    /// The message the interaction is attached to, as originally posted.
    #[serde(default)]
    pub original_message: Option<Value>,
}

impl InteractionEvent {
    /// Creates a minimal interaction event.
    pub fn new(
        interaction_type: InteractionType,
        callback_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            interaction_type,
            callback_id: callback_id.into(),
            user: UserRef {
                id: user_id.into(),
                name: String::new(),
            },
            channel: None,
            trigger_id: None,
            message_ts: None,
            actions: Vec::new(),
            submission: None,
            view: None,
            original_message: None,
        }
    }

    /// Sets the channel.
    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel = Some(ChannelRef {
            id: channel_id.into(),
            name: String::new(),
        });
        self
    }

    /// Sets the trigger identity.
    pub fn with_trigger(mut self, trigger_id: impl Into<String>) -> Self {
        self.trigger_id = Some(trigger_id.into());
        self
    }

    /// Sets the view.
    pub fn with_view(mut self, view: View) -> Self {
        self.view = Some(view);
        self
    }

    /// Returns the channel identifier, if any.
    pub fn channel_id(&self) -> Option<&str> {
        self.channel.as_ref().map(|c| c.id.as_str())
    }

    /// Returns the callback identifier of the nested view, if any.
    pub fn view_callback_id(&self) -> Option<&str> {
        self.view.as_ref().map(|v| v.callback_id.as_str())
    }
}

// ============================================================================
// Slash Commands
// ============================================================================

/// A slash command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// The command, including the leading slash (e.g. `/modaltest`).
    pub command: String,
    /// Text after the command.
    #[serde(default)]
    pub text: String,
    /// Invoking user.
    #[serde(default)]
    pub user_id: String,
    /// Invoking user's name.
    #[serde(default)]
    pub user_name: String,
    /// Channel the command was invoked in.
    #[serde(default)]
    pub channel_id: String,
    /// Trigger identity usable to open a dialog or modal.
    #[serde(default)]
    pub trigger_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_interaction_type() {
        let json = r#"{"type": "workflow_step_edit", "user": {"id": "U1"}}"#;
        let event: InteractionEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.interaction_type, InteractionType::Unknown);
        assert!(event.callback_id.is_empty());
    }

    #[test]
    fn test_dialog_submission_payload() {
        let json = r#"{
            "type": "dialog_submission",
            "callback_id": "U1coffee_order_form",
            "user": {"id": "U1", "name": "ann"},
            "channel": {"id": "C1", "name": "general"},
            "submission": {"mealPreferences": "latte"}
        }"#;
        let event: InteractionEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.interaction_type, InteractionType::DialogSubmission);
        assert_eq!(event.channel_id(), Some("C1"));
        assert_eq!(
            event.submission.as_ref().unwrap()["mealPreferences"],
            "latte"
        );
        assert!(event.view_callback_id().is_none());
    }
}
