//! In-memory gateway for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use parley_core::{
    Attachment, Gateway, GatewayError, GatewayResult, LookupError, LookupResult, UserProfile,
};

use crate::handle::BotHandle;

pub(crate) const BOT_ID: &str = "B1";

/// Records every outbound operation.
#[derive(Default)]
pub(crate) struct RecordingGateway {
    posts: Mutex<Vec<(String, String)>>,
    attachments: Mutex<Vec<(String, Vec<Attachment>)>>,
    dialogs: Mutex<Vec<(String, Value)>>,
    views: Mutex<Vec<(String, Value)>>,
    updates: Mutex<Vec<(String, String)>>,
    acks: Mutex<Vec<(String, Option<Value>)>>,
    groups: Mutex<HashMap<String, Vec<String>>>,
    fail_posts: AtomicBool,
    fail_acks: AtomicBool,
}

impl RecordingGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn handle() -> (BotHandle, Arc<Self>) {
        let gateway = Self::new();
        (BotHandle::new(BOT_ID, gateway.clone()), gateway)
    }

    pub(crate) fn fail_posts(&self, fail: bool) {
        self.fail_posts.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_acks(&self, fail: bool) {
        self.fail_acks.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn add_group(&self, group: &str, members: &[&str]) {
        self.groups.lock().insert(
            group.to_string(),
            members.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub(crate) fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().clone()
    }

    pub(crate) fn attachments(&self) -> Vec<(String, Vec<Attachment>)> {
        self.attachments.lock().clone()
    }

    pub(crate) fn dialogs(&self) -> Vec<(String, Value)> {
        self.dialogs.lock().clone()
    }

    pub(crate) fn views(&self) -> Vec<(String, Value)> {
        self.views.lock().clone()
    }

    pub(crate) fn updates(&self) -> Vec<(String, String)> {
        self.updates.lock().clone()
    }

    pub(crate) fn acks(&self) -> Vec<(String, Option<Value>)> {
        self.acks.lock().clone()
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn auth_test(&self) -> GatewayResult<String> {
        Ok(BOT_ID.to_string())
    }

    async fn post_message(&self, channel: &str, text: &str) -> GatewayResult<String> {
        if self.fail_posts.load(Ordering::SeqCst) {
            return Err(GatewayError::rejected("chat.postMessage", "channel_not_found"));
        }
        let mut posts = self.posts.lock();
        posts.push((channel.to_string(), text.to_string()));
        Ok(format!("{}.0", posts.len()))
    }

    async fn post_attachments(
        &self,
        channel: &str,
        attachments: &[Attachment],
    ) -> GatewayResult<String> {
        let mut sent = self.attachments.lock();
        sent.push((channel.to_string(), attachments.to_vec()));
        Ok(format!("{}.1", sent.len()))
    }

    async fn open_dialog(&self, trigger_id: &str, dialog: &Value) -> GatewayResult<()> {
        self.dialogs
            .lock()
            .push((trigger_id.to_string(), dialog.clone()));
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> GatewayResult<String> {
        let mut views = self.views.lock();
        views.push((trigger_id.to_string(), view.clone()));
        Ok(format!("V{}", views.len()))
    }

    async fn update_view(&self, _view: &Value, hash: &str, view_id: &str) -> GatewayResult<()> {
        self.updates
            .lock()
            .push((view_id.to_string(), hash.to_string()));
        Ok(())
    }

    async fn ack(&self, envelope_id: &str, payload: Option<Value>) -> GatewayResult<()> {
        if self.fail_acks.load(Ordering::SeqCst) {
            return Err(GatewayError::NotConnected);
        }
        self.acks.lock().push((envelope_id.to_string(), payload));
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> LookupResult<UserProfile> {
        match user_id {
            "U1" => Ok(UserProfile {
                id: "U1".to_string(),
                real_name: "Ann Example".to_string(),
                display_name: "ann".to_string(),
                email: "ann@example.com".to_string(),
            }),
            other => Err(LookupError::not_found("user", other)),
        }
    }

    async fn user_group_members(&self, group_id: &str) -> LookupResult<Vec<String>> {
        self.groups
            .lock()
            .get(group_id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("usergroup", group_id))
    }
}
