//! Cheap, cloneable access to the bot from inside handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use parley_core::{Attachment, BoxedGateway, GatewayResult, LookupResult, UserProfile};

/// A handle to the running bot.
///
/// Every context handed to a handler carries one. It exposes the bot's
/// identity and the outbound gateway operations.
#[derive(Clone)]
pub struct BotHandle {
    id: Arc<str>,
    gateway: BoxedGateway,
}

impl BotHandle {
    /// Creates a handle for the bot with the given user id.
    pub fn new(id: impl Into<Arc<str>>, gateway: BoxedGateway) -> Self {
        Self {
            id: id.into(),
            gateway,
        }
    }

    /// The bot's own user id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The underlying gateway.
    pub fn gateway(&self) -> &BoxedGateway {
        &self.gateway
    }

    /// Returns the initiation callback id for an interaction suffix.
    ///
    /// Attachments whose buttons should open a registered dialog or modal
    /// must carry this id.
    pub fn callback_id(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.id)
    }

    /// Posts plain text to a channel, logging delivery failures.
    pub async fn say(&self, channel: &str, text: &str) {
        if let Err(e) = self.gateway.post_message(channel, text).await {
            warn!(channel, error = %e, "Failed to deliver message");
        }
    }

    /// Posts plain text to a channel.
    pub async fn post_message(&self, channel: &str, text: &str) -> GatewayResult<String> {
        self.gateway.post_message(channel, text).await
    }

    /// Posts a message carrying attachments.
    pub async fn post_attachments(
        &self,
        channel: &str,
        attachments: &[Attachment],
    ) -> GatewayResult<String> {
        self.gateway.post_attachments(channel, attachments).await
    }

    /// Opens a legacy dialog.
    pub async fn open_dialog(&self, trigger_id: &str, dialog: &Value) -> GatewayResult<()> {
        self.gateway.open_dialog(trigger_id, dialog).await
    }

    /// Opens a modal view, returning its id.
    pub async fn open_view(&self, trigger_id: &str, view: &Value) -> GatewayResult<String> {
        self.gateway.open_view(trigger_id, view).await
    }

    /// Replaces an open modal view.
    pub async fn update_view(&self, view: &Value, hash: &str, view_id: &str) -> GatewayResult<()> {
        self.gateway.update_view(view, hash, view_id).await
    }

    /// Looks up a user's profile.
    pub async fn user_profile(&self, user_id: &str) -> LookupResult<UserProfile> {
        self.gateway.user_profile(user_id).await
    }

    /// Returns a user's real name.
    pub async fn user_name(&self, user_id: &str) -> LookupResult<String> {
        Ok(self.gateway.user_profile(user_id).await?.real_name)
    }

    /// Returns a user's email address.
    pub async fn user_email(&self, user_id: &str) -> LookupResult<String> {
        Ok(self.gateway.user_profile(user_id).await?.email)
    }

    /// Returns `true` if `user_id` is a member of the user group.
    pub async fn is_user_in_group(&self, user_id: &str, group_id: &str) -> LookupResult<bool> {
        let members = self.gateway.user_group_members(group_id).await?;
        Ok(members.iter().any(|m| m == user_id))
    }
}

impl std::fmt::Debug for BotHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingGateway;
    use parley_core::LookupError;

    #[tokio::test]
    async fn test_callback_id() {
        let (handle, _gw) = RecordingGateway::handle();
        assert_eq!(handle.id(), "B1");
        assert_eq!(handle.callback_id("coffee_order_form"), "B1coffee_order_form");
    }

    #[tokio::test]
    async fn test_say_swallows_failures() {
        let (handle, gw) = RecordingGateway::handle();
        gw.fail_posts(true);
        handle.say("C1", "hi").await;
        assert!(gw.posts().is_empty());
        assert!(handle.post_message("C1", "hi").await.is_err());
    }

    #[tokio::test]
    async fn test_outbound_operations() {
        let (handle, gw) = RecordingGateway::handle();
        let dialog = serde_json::json!({"callback_id": "U1coffee_order_form"});
        let view = serde_json::json!({"type": "modal"});

        handle
            .post_attachments("C1", &[Attachment::new("order?")])
            .await
            .unwrap();
        handle.open_dialog("T1", &dialog).await.unwrap();
        let view_id = handle.open_view("T2", &view).await.unwrap();
        handle.update_view(&view, "h1", &view_id).await.unwrap();

        assert_eq!(gw.attachments()[0].0, "C1");
        assert_eq!(gw.dialogs(), vec![("T1".to_string(), dialog)]);
        assert_eq!(gw.views(), vec![("T2".to_string(), view)]);
        assert_eq!(gw.updates(), vec![(view_id, "h1".to_string())]);
    }

    #[tokio::test]
    async fn test_user_lookups() {
        let (handle, gw) = RecordingGateway::handle();
        gw.add_group("S1", &["U1", "U2"]);

        assert_eq!(handle.user_name("U1").await.unwrap(), "Ann Example");
        assert_eq!(handle.user_email("U1").await.unwrap(), "ann@example.com");
        assert!(handle.is_user_in_group("U2", "S1").await.unwrap());
        assert!(!handle.is_user_in_group("U3", "S1").await.unwrap());

        let err = handle.user_profile("U404").await.unwrap_err();
        assert!(matches!(err, LookupError::NotFound { kind: "user", .. }));
    }
}
