//! Bot setup and the receive loop.
//!
//! A [`Bot`] is configured mutably during setup: commands, interaction
//! flows, slash commands and event handlers are registered, settings are
//! applied. [`Bot::listen`] then consumes it, so nothing can be registered
//! once events are flowing.
//!
//! ```rust,ignore
//! let mut bot = Bot::connect(gateway).await?;
//! bot.set_command_prefix("!").set_reply_only(true);
//! bot.command("uptime", |conv: Conversation| async move {
//!     conv.reply("up").await;
//! })?;
//! bot.listen(events, shutdown).await;
//! ```
//!
//! Each received event is routed in its own task by a [`Router`], a cheap
//! cloneable snapshot of everything registered.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, error, info, span, trace};

use parley_core::{
    BoxedGateway, EventKind, GatewayEvent, GatewayResult, InteractionType, MessageEvent,
    SlashCommand,
};

use crate::ack::{Ack, DEFAULT_ACK_WINDOW};
use crate::command::Command;
use crate::context::Conversation;
use crate::dispatcher::{Dispatch, Dispatcher};
use crate::error::{HandlerResult, SetupError, SetupResult};
use crate::handle::BotHandle;
use crate::handler::{BoxedHandler, into_handler};
use crate::interaction::{Correlator, InteractionContext, InteractionRegistration, Route};
use crate::normalize::Normalizer;
use crate::registry::CommandRegistry;
use crate::slash::{EventContext, EventHandler, SlashContext, SlashHandler};

/// Event types the dispatcher consumes itself.
const RESERVED_EVENTS: &[&str] = &["message", "app_mention"];

/// A bot under setup.
pub struct Bot {
    handle: BotHandle,
    registry: CommandRegistry,
    prefix: String,
    reply_only: bool,
    unknown: Option<BoxedHandler<Conversation>>,
    correlator: Correlator,
    slash_commands: HashMap<String, SlashHandler>,
    event_handlers: HashMap<String, EventHandler>,
    ack_window: Duration,
}

impl Bot {
    /// Creates a bot, asking the gateway for the bot's identity.
    pub async fn connect(gateway: BoxedGateway) -> GatewayResult<Self> {
        let id = gateway.auth_test().await?;
        info!(bot_id = %id, "Authenticated with gateway");
        Ok(Self::new(id, gateway))
    }

    /// Creates a bot with a known identity.
    pub fn new(id: impl Into<String>, gateway: BoxedGateway) -> Self {
        let id: String = id.into();
        Self {
            handle: BotHandle::new(id, gateway),
            registry: CommandRegistry::new(),
            prefix: String::new(),
            reply_only: false,
            unknown: None,
            correlator: Correlator::new(),
            slash_commands: HashMap::new(),
            event_handlers: HashMap::new(),
            ack_window: DEFAULT_ACK_WINDOW,
        }
    }

    /// The bot's own user id.
    pub fn id(&self) -> &str {
        self.handle.id()
    }

    /// A handle for use outside handlers.
    pub fn handle(&self) -> BotHandle {
        self.handle.clone()
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Sets the command prefix.
    ///
    /// The prefix applies to commands registered after this call and to help
    /// requests.
    pub fn set_command_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = prefix.into();
        self
    }

    /// Returns the command prefix.
    pub fn command_prefix(&self) -> &str {
        &self.prefix
    }

    /// Enables or disables reply-only mode.
    ///
    /// In reply-only mode the bot ignores messages not addressed to it, and
    /// the unknown-command handler runs for addressed messages no command
    /// matches.
    pub fn set_reply_only(&mut self, reply_only: bool) -> &mut Self {
        self.reply_only = reply_only;
        self
    }

    /// Returns `true` if reply-only mode is enabled.
    pub fn is_reply_only(&self) -> bool {
        self.reply_only
    }

    /// Sets how long after receipt an acknowledgement is still on time.
    pub fn set_ack_window(&mut self, window: Duration) -> &mut Self {
        self.ack_window = window;
        self
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Registers a command without a description.
    pub fn command<F, Fut>(&mut self, template: &str, handler: F) -> SetupResult<&mut Self>
    where
        F: Fn(Conversation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(Command::new(template, "", handler)?)
    }

    /// Registers a prebuilt command, applying the current prefix.
    pub fn register(&mut self, command: Command) -> SetupResult<&mut Self> {
        let command = command.with_prefix(&self.prefix)?;
        debug!(template = %command.template(), "Command registered");
        self.registry.register(command);
        Ok(self)
    }

    /// Sets the handler for addressed messages no command matches.
    pub fn unknown_command<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(Conversation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.unknown = Some(into_handler(handler));
        self
    }

    /// Returns the registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Renders the help text.
    pub fn help_text(&self) -> String {
        self.registry.help_text(&self.prefix)
    }

    // =========================================================================
    // Interactions
    // =========================================================================

    /// Registers a two-phase dialog or modal flow.
    pub fn register_interaction_flow(
        &mut self,
        registration: InteractionRegistration,
    ) -> SetupResult<&mut Self> {
        self.correlator.register(registration)?;
        Ok(self)
    }

    /// Registers a handler for interactions of a type that no flow claims.
    pub fn register_interaction<F, Fut>(
        &mut self,
        interaction_type: InteractionType,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(InteractionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.correlator
            .register_fallback(interaction_type, into_handler(handler));
        self
    }

    /// Registers a slash command handler, keyed by the command including its
    /// leading slash.
    pub fn register_slash_command<F, Fut>(&mut self, command: &str, handler: F) -> &mut Self
    where
        F: Fn(SlashContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.slash_commands
            .insert(command.to_string(), into_handler(handler));
        self
    }

    /// Registers a handler for an events-API event type.
    ///
    /// # Errors
    ///
    /// `message` and `app_mention` are routed to the command dispatcher and
    /// cannot be registered here.
    pub fn register_event_handler<F, Fut>(
        &mut self,
        event_type: &str,
        handler: F,
    ) -> SetupResult<&mut Self>
    where
        F: Fn(EventContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        if RESERVED_EVENTS.contains(&event_type) {
            return Err(SetupError::ReservedEvent(event_type.to_string()));
        }
        self.event_handlers
            .insert(event_type.to_string(), into_handler(handler));
        Ok(self)
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Freezes the setup into a router.
    pub fn into_router(self) -> Router {
        let mut dispatcher = Dispatcher::new(self.handle.clone())
            .registry(self.registry)
            .prefix(self.prefix)
            .reply_only(self.reply_only);
        if let Some(unknown) = self.unknown {
            dispatcher = dispatcher.unknown(unknown);
        }

        Router {
            inner: Arc::new(RouterInner {
                normalizer: Normalizer::new(self.handle.id()),
                dispatcher,
                correlator: self.correlator,
                slash_commands: self.slash_commands,
                event_handlers: self.event_handlers,
                ack_window: self.ack_window,
                bot: self.handle,
            }),
        }
    }

    /// Routes events from `events` until the stream ends or `shutdown` is
    /// cancelled.
    ///
    /// Each event is handled in its own task. Cancelling stops the loop from
    /// accepting new events; tasks already running are left to finish.
    pub async fn listen(self, events: mpsc::Receiver<GatewayEvent>, shutdown: CancellationToken) {
        self.into_router().listen(events, shutdown).await;
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.id())
            .field("command_count", &self.registry.len())
            .field("prefix", &self.prefix)
            .field("reply_only", &self.reply_only)
            .field("flows", &self.correlator.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Where an event was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// A message or app-mention went through the dispatcher.
    Message(Dispatch),
    /// An interaction went through the correlator.
    Interaction(Route),
    /// A slash command; `true` if a handler ran.
    Slash(bool),
    /// Another events-API event; `true` if a handler ran.
    Event(bool),
    /// The event was dropped before routing (e.g. the bot's own message).
    Skipped,
}

struct RouterInner {
    bot: BotHandle,
    normalizer: Normalizer,
    dispatcher: Dispatcher,
    correlator: Correlator,
    slash_commands: HashMap<String, SlashHandler>,
    event_handlers: HashMap<String, EventHandler>,
    ack_window: Duration,
}

/// Routes gateway events to the dispatcher, correlator and handlers.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// The command dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    /// The bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.inner.bot
    }

    fn ack(&self, envelope_id: Option<String>) -> Ack {
        Ack::new(
            envelope_id,
            self.inner.bot.gateway().clone(),
            self.inner.ack_window,
        )
    }

    /// Routes one event to completion.
    pub async fn route(&self, event: GatewayEvent) -> Routed {
        let span = span!(Level::DEBUG, "event", kind = %event.kind.name());
        self.route_inner(event).instrument(span).await
    }

    async fn route_inner(&self, event: GatewayEvent) -> Routed {
        let ack = self.ack(event.envelope_id);
        match event.kind {
            EventKind::Message(msg) => {
                ack.send(None).await;
                self.route_message(msg, false).await
            }
            EventKind::AppMention(msg) => {
                ack.send(None).await;
                self.route_message(msg, true).await
            }
            EventKind::Interaction(interaction) => Routed::Interaction(
                self.inner
                    .correlator
                    .handle(interaction, self.inner.bot.clone(), ack)
                    .await,
            ),
            EventKind::SlashCommand(command) => {
                Routed::Slash(self.route_slash(command, ack).await)
            }
            EventKind::Other { event_type, data } => {
                ack.send(None).await;
                Routed::Event(self.route_other(&event_type, data).await)
            }
        }
    }

    async fn route_message(&self, msg: MessageEvent, mention: bool) -> Routed {
        let inner = &self.inner;
        if msg.is_from_bot() {
            debug!(channel = %msg.channel, ts = %msg.ts, "Skipping bot message");
            return Routed::Skipped;
        }
        match msg.user.as_deref() {
            Some(user) if user != inner.bot.id() => {}
            _ => {
                trace!(channel = %msg.channel, "Skipping message without a foreign author");
                return Routed::Skipped;
            }
        }

        let inbound = if mention {
            inner.normalizer.normalize_mention(&msg)
        } else {
            inner.normalizer.normalize_message(&msg)
        };
        Routed::Message(inner.dispatcher.process(inbound).await)
    }

    async fn route_slash(&self, command: SlashCommand, ack: Ack) -> bool {
        let Some(handler) = self.inner.slash_commands.get(&command.command) else {
            debug!(command = %command.command, "No handler for slash command");
            ack.send(None).await;
            return false;
        };

        let name = command.command.clone();
        let ctx = SlashContext::new(command, self.inner.bot.clone(), ack.clone());
        if let Err(e) = handler.call(ctx).await {
            error!(command = %name, error = %e, "Slash command handler failed");
        }
        if !ack.is_sent() {
            ack.send(None).await;
        }
        true
    }

    async fn route_other(&self, event_type: &str, data: Value) -> bool {
        let Some(handler) = self.inner.event_handlers.get(event_type) else {
            trace!(event_type, "No handler for event");
            return false;
        };

        let ctx = EventContext::new(event_type, data, self.inner.bot.clone());
        if let Err(e) = handler.call(ctx).await {
            error!(event_type, error = %e, "Event handler failed");
        }
        true
    }

    /// Routes events until the stream ends or `shutdown` is cancelled.
    pub async fn listen(
        &self,
        mut events: mpsc::Receiver<GatewayEvent>,
        shutdown: CancellationToken,
    ) {
        info!(
            bot_id = %self.inner.bot.id(),
            commands = self.inner.dispatcher.commands().len(),
            "Listening for events"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, no longer accepting events");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        let router = self.clone();
                        tokio::spawn(async move {
                            router.route(event).await;
                        });
                    }
                    None => {
                        info!("Gateway event stream closed");
                        break;
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("bot", &self.inner.bot)
            .field("dispatcher", &self.inner.dispatcher)
            .field("correlator", &self.inner.correlator)
            .field(
                "slash_commands",
                &self.inner.slash_commands.keys().collect::<Vec<_>>(),
            )
            .field(
                "event_handlers",
                &self.inner.event_handlers.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
