//! Interaction correlation for multi-step dialogs and modals.
//!
//! A flow is registered under a callback-id suffix and runs in two phases:
//!
//! 1. **Open.** The bot posts an attachment whose callback id is
//!    `bot_id + suffix` (see [`BotHandle::callback_id`]). A click on it
//!    arrives as an `interactive_message` interaction and runs the opener,
//!    which typically opens a dialog or modal.
//! 2. **Submit.** The opener gives the dialog or modal the callback id
//!    `user_id + suffix` (see [`InteractionContext::submission_callback_id`]).
//!    Its submission runs the submission handler. For dialogs the id is read
//!    from the payload's top level; for modals from its view.
//!
//! Keying the second phase on the user id keeps concurrent flows from
//! different users apart. Events no registration claims go to the per-type
//! fallback handlers, if any.
//!
//! Every event is acknowledged exactly once: by the handler through its
//! [`Ack`], or by the correlator after the handler returns.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, Level, debug, error, span, trace, warn};

use parley_core::{InteractionEvent, InteractionType, View};

use crate::ack::Ack;
use crate::error::{HandlerResult, SetupError, SetupResult};
use crate::handle::BotHandle;
use crate::handler::{BoxedHandler, into_handler};

/// A handler for interactions.
pub type InteractionHandler = BoxedHandler<InteractionContext, HandlerResult>;

/// The surface a flow's second phase uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// A legacy dialog, submitted as `dialog_submission`.
    Dialog,
    /// A modal view, submitted as `view_submission`.
    Modal,
}

/// Which phase of a flow an interaction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The initiating button click.
    Open,
    /// The dialog or modal submission.
    Submit,
    /// No registration claimed the event.
    Unregistered,
}

// ============================================================================
// Registration
// ============================================================================

/// A two-phase interaction flow.
#[derive(Clone)]
pub struct InteractionRegistration {
    suffix: String,
    kind: InteractionKind,
    opener: InteractionHandler,
    submission: InteractionHandler,
}

impl InteractionRegistration {
    /// Creates a flow whose second phase is a legacy dialog.
    pub fn dialog<O, OFut, S, SFut>(suffix: impl Into<String>, opener: O, submission: S) -> Self
    where
        O: Fn(InteractionContext) -> OFut + Send + Sync + 'static,
        OFut: Future<Output = HandlerResult> + Send + 'static,
        S: Fn(InteractionContext) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(
            suffix,
            InteractionKind::Dialog,
            into_handler(opener),
            into_handler(submission),
        )
    }

    /// Creates a flow whose second phase is a modal view.
    pub fn modal<O, OFut, S, SFut>(suffix: impl Into<String>, opener: O, submission: S) -> Self
    where
        O: Fn(InteractionContext) -> OFut + Send + Sync + 'static,
        OFut: Future<Output = HandlerResult> + Send + 'static,
        S: Fn(InteractionContext) -> SFut + Send + Sync + 'static,
        SFut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(
            suffix,
            InteractionKind::Modal,
            into_handler(opener),
            into_handler(submission),
        )
    }

    /// Creates a flow from boxed handlers.
    pub fn new(
        suffix: impl Into<String>,
        kind: InteractionKind,
        opener: InteractionHandler,
        submission: InteractionHandler,
    ) -> Self {
        Self {
            suffix: suffix.into(),
            kind,
            opener,
            submission,
        }
    }

    /// The callback-id suffix.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The second-phase surface.
    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    /// Returns `true` if `id` is `owner` followed by this flow's suffix.
    fn is_callback(&self, id: &str, owner: &str) -> bool {
        id.strip_prefix(owner) == Some(self.suffix.as_str())
    }

    fn claims(&self, event: &InteractionEvent, bot_id: &str) -> Option<Phase> {
        let user_id = event.user.id.as_str();

        match (event.interaction_type, self.kind) {
            (InteractionType::InteractiveMessage, _) => self
                .is_callback(&event.callback_id, bot_id)
                .then_some(Phase::Open),
            (InteractionType::DialogSubmission, InteractionKind::Dialog) => self
                .is_callback(&event.callback_id, user_id)
                .then_some(Phase::Submit),
            (InteractionType::ViewSubmission, InteractionKind::Modal) => event
                .view_callback_id()
                .filter(|&id| self.is_callback(id, user_id))
                .map(|_| Phase::Submit),
            _ => None,
        }
    }
}

impl std::fmt::Debug for InteractionRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRegistration")
            .field("suffix", &self.suffix)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Context
// ============================================================================

/// The context an interaction handler runs in.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    event: Arc<InteractionEvent>,
    phase: Phase,
    suffix: Option<Arc<str>>,
    bot: BotHandle,
    ack: Ack,
}

impl InteractionContext {
    /// Creates a context.
    pub fn new(
        event: InteractionEvent,
        phase: Phase,
        suffix: Option<&str>,
        bot: BotHandle,
        ack: Ack,
    ) -> Self {
        Self {
            event: Arc::new(event),
            phase,
            suffix: suffix.map(Arc::from),
            bot,
            ack,
        }
    }

    /// The raw interaction payload.
    pub fn event(&self) -> &InteractionEvent {
        &self.event
    }

    /// The phase this interaction was routed as.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The suffix of the flow that claimed this interaction.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// The bot handle.
    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    /// The acknowledgement handle.
    pub fn ack(&self) -> &Ack {
        &self.ack
    }

    /// The interacting user's id.
    pub fn user_id(&self) -> &str {
        &self.event.user.id
    }

    /// The channel the interaction happened in.
    pub fn channel_id(&self) -> Option<&str> {
        self.event.channel_id()
    }

    /// The trigger identity for opening a dialog or modal.
    pub fn trigger_id(&self) -> Option<&str> {
        self.event.trigger_id.as_deref()
    }

    /// Dialog submission values.
    pub fn submission(&self) -> Option<&Value> {
        self.event.submission.as_ref()
    }

    /// The modal view, for view interactions.
    pub fn view(&self) -> Option<&View> {
        self.event.view.as_ref()
    }

    /// The callback id the dialog or modal opened in this flow must carry
    /// for its submission to come back here.
    pub fn submission_callback_id(&self) -> String {
        format!("{}{}", self.event.user.id, self.suffix.as_deref().unwrap_or(""))
    }

    /// Posts text to the interaction's channel, logging failures.
    pub async fn say(&self, text: impl AsRef<str>) {
        match self.channel_id() {
            Some(channel) => self.bot.say(channel, text.as_ref()).await,
            None => warn!(user = %self.user_id(), "Interaction has no channel to reply in"),
        }
    }
}

// ============================================================================
// Correlator
// ============================================================================

/// Where an interaction was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A flow's opener ran.
    Opener {
        /// Suffix of the flow.
        suffix: String,
    },
    /// A flow's submission handler ran.
    Submission {
        /// Suffix of the flow.
        suffix: String,
    },
    /// A per-type fallback handler ran.
    Fallback(InteractionType),
    /// Nothing ran; the event was only acknowledged.
    Unhandled,
}

/// Routes interactions to registered flows and fallback handlers.
#[derive(Clone, Default)]
pub struct Correlator {
    registrations: Vec<InteractionRegistration>,
    fallbacks: HashMap<InteractionType, InteractionHandler>,
}

impl Correlator {
    /// Creates an empty correlator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a flow.
    ///
    /// Registering the same suffix and kind twice is allowed; the later
    /// registration wins.
    pub fn register(&mut self, registration: InteractionRegistration) -> SetupResult<()> {
        if registration.suffix.is_empty() {
            return Err(SetupError::EmptySuffix);
        }
        let duplicate = self
            .registrations
            .iter()
            .any(|r| r.suffix == registration.suffix && r.kind == registration.kind);
        if duplicate {
            warn!(
                suffix = %registration.suffix,
                kind = ?registration.kind,
                "Interaction flow registered twice, the later registration wins"
            );
        }
        self.registrations.push(registration);
        Ok(())
    }

    /// Registers a fallback handler for an interaction type.
    ///
    /// Replaces any earlier fallback for the same type.
    pub fn register_fallback(
        &mut self,
        interaction_type: InteractionType,
        handler: InteractionHandler,
    ) {
        if self.fallbacks.insert(interaction_type, handler).is_some() {
            warn!(%interaction_type, "Fallback interaction handler replaced");
        }
    }

    /// Returns the number of registered flows.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns `true` if no flows are registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Finds the flow claiming `event`, latest registration first.
    pub fn resolve(
        &self,
        event: &InteractionEvent,
        bot_id: &str,
    ) -> Option<(&InteractionRegistration, Phase)> {
        self.registrations
            .iter()
            .rev()
            .find_map(|r| r.claims(event, bot_id).map(|phase| (r, phase)))
    }

    /// Routes one interaction and makes sure it is acknowledged.
    pub async fn handle(&self, event: InteractionEvent, bot: BotHandle, ack: Ack) -> Route {
        let span = span!(
            Level::DEBUG,
            "interaction",
            interaction_type = %event.interaction_type,
            user = %event.user.id,
        );
        self.handle_inner(event, bot, ack).instrument(span).await
    }

    async fn handle_inner(&self, event: InteractionEvent, bot: BotHandle, ack: Ack) -> Route {
        let interaction_type = event.interaction_type;

        let (handler, route, ctx) = match self.resolve(&event, bot.id()) {
            Some((registration, phase)) => {
                let suffix = registration.suffix.clone();
                let (handler, route) = match phase {
                    Phase::Open => (&registration.opener, Route::Opener { suffix }),
                    _ => (&registration.submission, Route::Submission { suffix }),
                };
                debug!(suffix = %registration.suffix, ?phase, "Interaction matched flow");
                let ctx = InteractionContext::new(
                    event,
                    phase,
                    Some(&registration.suffix),
                    bot,
                    ack.clone(),
                );
                (handler, route, ctx)
            }
            None => match self.fallbacks.get(&interaction_type) {
                Some(handler) => {
                    debug!("Interaction routed to fallback handler");
                    let ctx =
                        InteractionContext::new(event, Phase::Unregistered, None, bot, ack.clone());
                    (handler, Route::Fallback(interaction_type), ctx)
                }
                None => {
                    trace!("No handler for interaction");
                    ack.send(None).await;
                    return Route::Unhandled;
                }
            },
        };

        if let Err(e) = handler.call(ctx).await {
            error!(error = %e, "Interaction handler failed");
        }
        if !ack.is_sent() {
            ack.send(None).await;
        }
        route
    }
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("registrations", &self.registrations)
            .field("fallback_types", &self.fallbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}
