//! Per-dispatch conversation context.
//!
//! A [`Conversation`] is built for each matched command and handed to its
//! handler by value. It owns the [`Match`], the normalized message and a
//! [`BotHandle`], and dies when the handler returns.

use parley_core::InboundMessage;

use crate::handle::BotHandle;
use crate::pattern::Match;

/// The context a command handler runs in.
#[derive(Debug, Clone)]
pub struct Conversation {
    matched: Match,
    message: InboundMessage,
    bot: BotHandle,
}

impl Conversation {
    /// Creates a conversation for a matched message.
    pub fn new(matched: Match, message: InboundMessage, bot: BotHandle) -> Self {
        Self {
            matched,
            message,
            bot,
        }
    }

    /// The message that triggered the command.
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    /// Returns the captured value of a placeholder.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.matched.get(name)
    }

    /// Returns the captured value of a placeholder parsed as an integer.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.matched.integer(name)
    }

    /// The full match, including the matched span.
    pub fn params(&self) -> &Match {
        &self.matched
    }

    /// The bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    /// Replies in the channel the message came from.
    ///
    /// The text is sent as-is. Delivery failures are logged and swallowed.
    pub async fn reply(&self, text: impl AsRef<str>) {
        self.bot.say(self.message.channel(), text.as_ref()).await;
    }
}

/// Replies to a [`Conversation`] with formatted text.
///
/// ```rust,ignore
/// reply!(conv, "Thanks for your order, {}!", name).await;
/// ```
#[macro_export]
macro_rules! reply {
    ($conv:expr, $($arg:tt)*) => {
        $conv.reply(::std::format!($($arg)*))
    };
}
