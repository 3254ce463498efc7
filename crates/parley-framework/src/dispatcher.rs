//! Command dispatch.
//!
//! The [`Dispatcher`] decides what happens to a normalized message. Rules
//! are applied in order and the first one that applies ends processing:
//!
//! 1. A help request addressed to the bot gets the help text, prefixed with
//!    `<@USER>: ` outside direct messages.
//! 2. In reply-only mode, messages not addressed to the bot are ignored.
//! 3. The first command whose template matches runs.
//! 4. Otherwise, in reply-only mode, the unknown-command handler runs with
//!    an empty match; in normal mode nothing happens.
//!
//! A message is addressed to the bot when it is a direct message, an
//! app-mention event, or contains the bot's mention token.
//!
//! # Tower Service Integration
//!
//! `Dispatcher` implements `tower::Service<InboundMessage>`, so middleware
//! can wrap dispatch:
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tower::{ServiceBuilder, timeout::TimeoutLayer};
//!
//! let service = ServiceBuilder::new()
//!     .layer(TimeoutLayer::new(Duration::from_secs(5)))
//!     .service(dispatcher);
//! ```

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;
use tracing::{Instrument, Level, debug, span, trace};

use parley_core::InboundMessage;

use crate::command::Command;
use crate::context::Conversation;
use crate::handle::BotHandle;
use crate::handler::BoxedHandler;
use crate::pattern::Match;
use crate::registry::CommandRegistry;

/// The outcome of dispatching one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The help text was sent.
    Help,
    /// Reply-only mode dropped a message not addressed to the bot.
    Ignored,
    /// A command handled the message.
    Handled {
        /// Template of the command that ran.
        template: String,
    },
    /// No command matched and the unknown-command handler ran.
    Unknown,
    /// No command matched and nothing ran.
    Unmatched,
}

/// Internal data for a Dispatcher.
///
/// Wrapped in an `Arc` so clones are cheap; builder methods copy on write.
#[derive(Clone)]
struct DispatcherInner {
    registry: CommandRegistry,
    prefix: String,
    reply_only: bool,
    unknown: Option<BoxedHandler<Conversation>>,
    bot: BotHandle,
}

/// Routes normalized messages to commands.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    /// Creates a dispatcher with an empty command table.
    pub fn new(bot: BotHandle) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                registry: CommandRegistry::new(),
                prefix: String::new(),
                reply_only: false,
                unknown: None,
                bot,
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut DispatcherInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Replaces the command table.
    pub fn registry(mut self, registry: CommandRegistry) -> Self {
        self.inner_mut().registry = registry;
        self
    }

    /// Adds a command.
    pub fn command(mut self, command: Command) -> Self {
        self.inner_mut().registry.register(command);
        self
    }

    /// Sets the command prefix used for help requests and help text.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.inner_mut().prefix = prefix.into();
        self
    }

    /// Enables or disables reply-only mode.
    pub fn reply_only(mut self, reply_only: bool) -> Self {
        self.inner_mut().reply_only = reply_only;
        self
    }

    /// Sets the unknown-command handler.
    pub fn unknown(mut self, handler: BoxedHandler<Conversation>) -> Self {
        self.inner_mut().unknown = Some(handler);
        self
    }

    /// Returns the command table.
    pub fn commands(&self) -> &CommandRegistry {
        &self.inner.registry
    }

    /// Returns the bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.inner.bot
    }

    /// Returns `true` if `text` asks for help.
    pub fn is_help_request(&self, text: &str) -> bool {
        text == "help" || text.strip_prefix(self.inner.prefix.as_str()) == Some("help")
    }

    /// Renders the help text.
    pub fn help_text(&self) -> String {
        self.inner.registry.help_text(&self.inner.prefix)
    }

    /// Processes one normalized message.
    pub async fn process(&self, msg: InboundMessage) -> Dispatch {
        let span = span!(
            Level::DEBUG,
            "dispatch",
            channel = %msg.channel(),
            user = %msg.user(),
            kind = %msg.kind(),
        );
        self.process_inner(msg).instrument(span).await
    }

    async fn process_inner(&self, msg: InboundMessage) -> Dispatch {
        let inner = &self.inner;
        let relevant = msg.is_relevant();

        if relevant && self.is_help_request(msg.text()) {
            let mut text = self.help_text();
            if !msg.is_direct_message() {
                text = format!("<@{}>: {text}", msg.user());
            }
            inner.bot.say(msg.channel(), &text).await;
            debug!("Sent help text");
            return Dispatch::Help;
        }

        if inner.reply_only && !relevant {
            trace!("Reply-only mode, message not addressed to the bot");
            return Dispatch::Ignored;
        }

        if let Some((command, matched)) = inner.registry.find(msg.text()) {
            let template = command.template().to_string();
            debug!(template = %template, "Command matched");
            command
                .call(Conversation::new(matched, msg, inner.bot.clone()))
                .await;
            return Dispatch::Handled { template };
        }

        if inner.reply_only
            && let Some(unknown) = &inner.unknown
        {
            debug!("No command matched, running unknown-command handler");
            unknown
                .call(Conversation::new(Match::empty(), msg, inner.bot.clone()))
                .await;
            return Dispatch::Unknown;
        }

        trace!("No command matched");
        Dispatch::Unmatched
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("command_count", &self.inner.registry.len())
            .field("prefix", &self.inner.prefix)
            .field("reply_only", &self.inner.reply_only)
            .field("has_unknown", &self.inner.unknown.is_some())
            .finish()
    }
}

// ============================================================================
// Tower Service Implementation for Dispatcher
// ============================================================================

impl Service<InboundMessage> for Dispatcher {
    type Response = Dispatch;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, msg: InboundMessage) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.process(msg).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::into_handler;
    use crate::testing::RecordingGateway;
    use parley_core::MessageKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl Fn(Conversation) -> futures::future::Ready<()> + Send + Sync + 'static {
        let counter = counter.clone();
        move |_conv| {
            counter.fetch_add(1, Ordering::SeqCst);
            futures::future::ready(())
        }
    }

    fn msg(kind: MessageKind, text: &str) -> InboundMessage {
        let channel = if kind == MessageKind::Direct { "D1" } else { "C1" };
        InboundMessage::new(channel, "U9", text, text, kind)
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let (bot, _gw) = RecordingGateway::handle();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(bot)
            .command(Command::new("status <x>", "", counting(&first)).unwrap())
            .command(Command::new("status now", "", counting(&second)).unwrap());

        let outcome = dispatcher.process(msg(MessageKind::Channel, "status now")).await;
        assert_eq!(
            outcome,
            Dispatch::Handled {
                template: "status <x>".to_string()
            }
        );
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_help_only_when_addressed() {
        let (bot, gw) = RecordingGateway::handle();
        let uptime = Command::new("uptime", "Reply with the uptime", counting(&Arc::default()));
        let dispatcher = Dispatcher::new(bot).prefix("!").command(uptime.unwrap());

        let plain = msg(MessageKind::Channel, "help");
        assert_eq!(dispatcher.process(plain).await, Dispatch::Unmatched);
        assert!(gw.posts().is_empty());

        let mentioned = msg(MessageKind::Channel, "!help").with_mentions_bot(true);
        assert_eq!(dispatcher.process(mentioned).await, Dispatch::Help);
        assert_eq!(
            gw.posts()[0].1,
            "<@U9>: The available commands are:\n\n`!uptime` – Reply with the uptime\n"
        );

        assert_eq!(
            dispatcher.process(msg(MessageKind::Direct, "help")).await,
            Dispatch::Help
        );
        assert_eq!(gw.posts()[1].0, "D1");
        assert!(gw.posts()[1].1.starts_with("The available commands are:"));
    }

    #[tokio::test]
    async fn test_reply_only_ignores_unaddressed() {
        let (bot, gw) = RecordingGateway::handle();
        let handled = Arc::new(AtomicUsize::new(0));
        let unknown = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(bot)
            .reply_only(true)
            .command(Command::new("uptime", "", counting(&handled)).unwrap())
            .unknown(into_handler(counting(&unknown)));

        for text in ["uptime", "nonsense", "help"] {
            assert_eq!(
                dispatcher.process(msg(MessageKind::Channel, text)).await,
                Dispatch::Ignored
            );
        }
        assert_eq!(handled.load(Ordering::SeqCst), 0);
        assert_eq!(unknown.load(Ordering::SeqCst), 0);
        assert!(gw.posts().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_fires_once_with_empty_match() {
        let (bot, _gw) = RecordingGateway::handle();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let s = seen.clone();
        let dispatcher = Dispatcher::new(bot)
            .reply_only(true)
            .unknown(into_handler(move |conv: Conversation| {
                s.lock().push(conv.params().clone());
                async {}
            }));

        let outcome = dispatcher.process(msg(MessageKind::Mention, "frobnicate")).await;
        assert_eq!(outcome, Dispatch::Unknown);
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_empty());
        assert_eq!(seen[0].get("anything"), None);
    }

    #[tokio::test]
    async fn test_unknown_not_used_outside_reply_only() {
        let (bot, _gw) = RecordingGateway::handle();
        let unknown = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new(bot).unknown(into_handler(counting(&unknown)));

        let outcome = dispatcher.process(msg(MessageKind::Direct, "frobnicate")).await;
        assert_eq!(outcome, Dispatch::Unmatched);
        assert_eq!(unknown.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_dispatcher_as_service() {
        let (bot, _gw) = RecordingGateway::handle();
        let handled = Arc::new(AtomicUsize::new(0));
        let dispatcher =
            Dispatcher::new(bot).command(Command::new("ping", "", counting(&handled)).unwrap());

        let response = dispatcher
            .oneshot(msg(MessageKind::Direct, "ping"))
            .await
            .unwrap();
        assert!(matches!(response, Dispatch::Handled { .. }));
        assert_eq!(handled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_is_help_request() {
        let (bot, _gw) = RecordingGateway::handle();
        let dispatcher = Dispatcher::new(bot.clone());
        assert!(dispatcher.is_help_request("help"));
        assert!(!dispatcher.is_help_request("helpme"));

        let prefixed = Dispatcher::new(bot).prefix("!");
        assert!(prefixed.is_help_request("!help"));
        assert!(prefixed.is_help_request("help"));
        assert!(!prefixed.is_help_request("?help"));
    }
}
