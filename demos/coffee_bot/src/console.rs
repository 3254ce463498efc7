//! A gateway that talks to the terminal.
//!
//! Each stdin line becomes one event. Lines starting with `{` are decoded as
//! a full [`GatewayEvent`]; anything else is a direct message from the
//! configured user. Outbound operations are printed to stdout.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use parley::core::{
    Attachment, EventKind, Gateway, GatewayEvent, GatewayResult, LookupError, LookupResult,
    MessageEvent, UserProfile,
};

/// Prints outbound traffic and fakes a small user directory.
pub struct ConsoleGateway {
    bot_id: String,
    counter: AtomicU64,
}

impl ConsoleGateway {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            counter: AtomicU64::new(0),
        }
    }

    fn next_ts(&self) -> String {
        format!("{}.000100", self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    async fn auth_test(&self) -> GatewayResult<String> {
        Ok(self.bot_id.clone())
    }

    async fn post_message(&self, channel: &str, text: &str) -> GatewayResult<String> {
        println!("[{channel}] {text}");
        Ok(self.next_ts())
    }

    async fn post_attachments(
        &self,
        channel: &str,
        attachments: &[Attachment],
    ) -> GatewayResult<String> {
        for attachment in attachments {
            let buttons: Vec<&str> = attachment.actions.iter().map(|a| a.text.as_str()).collect();
            println!(
                "[{channel}] {} {buttons:?} (callback {})",
                attachment.text,
                attachment.callback_id.as_deref().unwrap_or("-")
            );
        }
        Ok(self.next_ts())
    }

    async fn open_dialog(&self, trigger_id: &str, dialog: &Value) -> GatewayResult<()> {
        println!("<dialog {trigger_id}> {dialog}");
        Ok(())
    }

    async fn open_view(&self, trigger_id: &str, view: &Value) -> GatewayResult<String> {
        let view_id = format!("V{}", self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        println!("<modal {view_id} via {trigger_id}> {view}");
        Ok(view_id)
    }

    async fn update_view(&self, view: &Value, hash: &str, view_id: &str) -> GatewayResult<()> {
        println!("<modal {view_id} @{hash}> {view}");
        Ok(())
    }

    async fn ack(&self, envelope_id: &str, payload: Option<Value>) -> GatewayResult<()> {
        match payload {
            Some(payload) => debug!(envelope_id, %payload, "ack"),
            None => debug!(envelope_id, "ack"),
        }
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
        Err(LookupError::not_found("usergroup", group_id))
    }
}

/// Turns one input line into an event.
pub fn parse_line(line: &str, channel: &str, user: &str, ts: u64) -> Option<GatewayEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with('{') {
        return match serde_json::from_str(line) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed event");
                None
            }
        };
    }
    let event = GatewayEvent::new(EventKind::Message(MessageEvent {
        channel: channel.to_string(),
        channel_type: None,
        user: Some(user.to_string()),
        text: line.to_string(),
        ts: format!("{ts}.000000"),
        thread_ts: None,
        bot_id: None,
        subtype: None,
    }));
    Some(event.with_envelope(format!("console-{ts}")))
}

/// Reads stdin until EOF, forwarding each line as an event.
pub fn spawn_stdin_reader(channel: String, user: String) -> mpsc::Receiver<GatewayEvent> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ts = 0u64;
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            ts += 1;
            if let Some(event) = parse_line(&line, &channel, &user, ts)
                && tx.send(event).await.is_err()
            {
                break;
            }
        }
    });
    rx
}
