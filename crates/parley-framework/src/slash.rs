//! Slash command and raw event contexts.

use std::sync::Arc;

use serde_json::Value;

use parley_core::SlashCommand;

use crate::ack::Ack;
use crate::error::HandlerResult;
use crate::handle::BotHandle;
use crate::handler::BoxedHandler;

/// A handler for slash commands.
pub type SlashHandler = BoxedHandler<SlashContext, HandlerResult>;

/// A handler for events-API events other than messages.
pub type EventHandler = BoxedHandler<EventContext, HandlerResult>;

/// The context a slash command handler runs in.
#[derive(Debug, Clone)]
pub struct SlashContext {
    command: Arc<SlashCommand>,
    bot: BotHandle,
    ack: Ack,
}

impl SlashContext {
    /// Creates a context.
    pub fn new(command: SlashCommand, bot: BotHandle, ack: Ack) -> Self {
        Self {
            command: Arc::new(command),
            bot,
            ack,
        }
    }

    /// The invocation.
    pub fn command(&self) -> &SlashCommand {
        &self.command
    }

    /// Text after the command name.
    pub fn text(&self) -> &str {
        &self.command.text
    }

    /// The trigger identity for opening a dialog or modal.
    pub fn trigger_id(&self) -> &str {
        &self.command.trigger_id
    }

    /// The bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    /// The acknowledgement handle.
    pub fn ack(&self) -> &Ack {
        &self.ack
    }

    /// Replies in the channel the command was invoked in.
    pub async fn reply(&self, text: impl AsRef<str>) {
        self.bot.say(&self.command.channel_id, text.as_ref()).await;
    }
}

/// The context a raw event handler runs in.
///
/// The event is acknowledged before the handler runs.
#[derive(Debug, Clone)]
pub struct EventContext {
    event_type: Arc<str>,
    data: Arc<Value>,
    bot: BotHandle,
}

impl EventContext {
    /// Creates a context.
    pub fn new(event_type: &str, data: Value, bot: BotHandle) -> Self {
        Self {
            event_type: Arc::from(event_type),
            data: Arc::new(data),
            bot,
        }
    }

    /// The events-API event type.
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The raw inner event.
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// The bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }
}
