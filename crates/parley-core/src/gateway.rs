//! The gateway contract.
//!
//! A [`Gateway`] is the external collaborator that owns the real-time
//! connection. It delivers [`GatewayEvent`](crate::GatewayEvent)s to the bot
//! and accepts the outbound operations defined here. Parley ships no
//! protocol implementation; applications provide one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GatewayResult, LookupResult};
use crate::message::Attachment;

/// Profile information for a workspace user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User identifier.
    pub id: String,
    /// Full name.
    #[serde(default)]
    pub real_name: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Email address, if visible to the bot.
    #[serde(default)]
    pub email: String,
}

/// Outbound operations the framework needs from the gateway.
///
/// All methods are called from concurrently running handler tasks, so
/// implementations must be `Send + Sync` and tolerate overlapping calls.
///
/// # Example Implementation
///
/// ```rust,ignore
/// struct SocketGateway { client: SocketClient }
///
/// #[async_trait]
/// impl Gateway for SocketGateway {
///     async fn auth_test(&self) -> GatewayResult<String> {
///         Ok(self.client.auth_test().await?.user_id)
///     }
///     // ...
/// }
/// ```
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Returns the bot's own user identifier.
    async fn auth_test(&self) -> GatewayResult<String>;

    /// Posts a plain-text message to a channel, returning its timestamp.
    async fn post_message(&self, channel: &str, text: &str) -> GatewayResult<String>;

    /// Posts a message carrying attachments, returning its timestamp.
    async fn post_attachments(
        &self,
        channel: &str,
        attachments: &[Attachment],
    ) -> GatewayResult<String>;

    /// Opens a legacy dialog using a trigger identity.
    async fn open_dialog(&self, trigger_id: &str, dialog: &Value) -> GatewayResult<()>;

    /// Opens a modal view using a trigger identity, returning the view id.
    async fn open_view(&self, trigger_id: &str, view: &Value) -> GatewayResult<String>;

    /// Replaces an open modal view.
    ///
    /// `hash` is the version hash from the last payload seen for the view.
    async fn update_view(&self, view: &Value, hash: &str, view_id: &str) -> GatewayResult<()>;

    /// Acknowledges a received envelope, optionally with a response payload
    /// (e.g. a replacement for the original message).
    async fn ack(&self, envelope_id: &str, payload: Option<Value>) -> GatewayResult<()>;

    /// Looks up a user's profile.
    async fn user_profile(&self, user_id: &str) -> LookupResult<UserProfile>;

    /// Lists the user identifiers in a user group.
    async fn user_group_members(&self, group_id: &str) -> LookupResult<Vec<String>>;
}

/// A shared gateway trait object.
pub type BoxedGateway = Arc<dyn Gateway>;
