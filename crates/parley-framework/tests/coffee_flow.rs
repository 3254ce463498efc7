//! End-to-end routing tests: commands, help and a two-phase dialog flow
//! driven through the router exactly as a gateway would feed it.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parley_core::{
    Attachment, AttachmentAction, EventKind, Gateway, GatewayEvent, GatewayResult,
    InteractionEvent, InteractionType, LookupError, LookupResult, MessageEvent, UserProfile,
};
use parley_framework::{
    Bot, Command, Conversation, Dispatch, InteractionContext, InteractionRegistration, Route,
    Routed, SessionStore, reply,
};

#[derive(Debug, Clone, PartialEq)]
enum Sent {
    Text(String, String),
    Attachments(String, usize),
    Dialog(String, Value),
    Ack(String),
}

#[derive(Default)]
struct MockGateway {
    sent: Mutex<Vec<Sent>>,
}

impl MockGateway {
    fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn auth_test(&self) -> GatewayResult<String> {
        Ok("BOT".to_string())
    }

    async fn post_message(&self, channel: &str, text: &str) -> GatewayResult<String> {
        self.sent
            .lock()
            .push(Sent::Text(channel.to_string(), text.to_string()));
        Ok("1.0".to_string())
    }

    async fn post_attachments(
        &self,
        channel: &str,
        attachments: &[Attachment],
    ) -> GatewayResult<String> {
        self.sent
            .lock()
            .push(Sent::Attachments(channel.to_string(), attachments.len()));
        Ok("1.1".to_string())
    }

    async fn open_dialog(&self, trigger_id: &str, dialog: &Value) -> GatewayResult<()> {
        self.sent
            .lock()
            .push(Sent::Dialog(trigger_id.to_string(), dialog.clone()));
        Ok(())
    }

    async fn open_view(&self, _trigger_id: &str, _view: &Value) -> GatewayResult<String> {
        Ok("V1".to_string())
    }

    async fn update_view(&self, _view: &Value, _hash: &str, _view_id: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn ack(&self, envelope_id: &str, _payload: Option<Value>) -> GatewayResult<()> {
        self.sent.lock().push(Sent::Ack(envelope_id.to_string()));
        Ok(())
    }

    async fn user_profile(&self, user_id: &str) -> LookupResult<UserProfile> {
        Err(LookupError::not_found("user", user_id))
    }

    async fn user_group_members(&self, group_id: &str) -> LookupResult<Vec<String>> {
        Err(LookupError::not_found("usergroup", group_id))
    }
}

fn message(channel: &str, user: &str, text: &str) -> GatewayEvent {
    GatewayEvent::new(EventKind::Message(MessageEvent {
        channel: channel.to_string(),
        channel_type: None,
        user: Some(user.to_string()),
        text: text.to_string(),
        ts: "1.0".to_string(),
        thread_ts: None,
        bot_id: None,
        subtype: None,
    }))
}

async fn coffee_bot() -> (Bot, Arc<MockGateway>, SessionStore<String, String>) {
    let gateway = Arc::new(MockGateway::default());
    let mut bot = Bot::connect(gateway.clone()).await.unwrap();
    let orders: SessionStore<String, String> = SessionStore::new();

    bot.set_command_prefix("!").set_reply_only(true);
    bot.register(
        Command::new("uptime", "Reply with the uptime", |conv: Conversation| async move {
            conv.reply("up 3 days").await;
        })
        .unwrap(),
    )
    .unwrap();
    bot.command("coffee", |conv: Conversation| async move {
        let attachment = Attachment::new("Would you like a coffee?")
            .callback_id(conv.bot().callback_id("coffee_order_form"))
            .action(AttachmentAction::button("coffee_order", "Order", "order"));
        conv.bot()
            .post_attachments(conv.message().channel(), &[attachment])
            .await
            .unwrap();
    })
    .unwrap();
    bot.command("echo <word>", |conv: Conversation| async move {
        let word = conv.param("word").unwrap_or_default().to_string();
        reply!(conv, "you said {word}").await;
    })
    .unwrap();
    bot.unknown_command(|conv: Conversation| async move {
        conv.reply("I don't know that one").await;
    });

    let pending = orders.clone();
    bot.register_interaction_flow(InteractionRegistration::dialog(
        "coffee_order_form",
        |ctx: InteractionContext| async move {
            let dialog = json!({
                "callback_id": ctx.submission_callback_id(),
                "title": "Request a coffee",
            });
            let trigger = ctx.trigger_id().unwrap_or_default().to_string();
            ctx.bot().open_dialog(&trigger, &dialog).await?;
            Ok(())
        },
        move |ctx: InteractionContext| {
            let pending = pending.clone();
            async move {
                let drink = ctx
                    .submission()
                    .and_then(|s| s["drink"].as_str())
                    .unwrap_or("coffee")
                    .to_string();
                pending.insert(ctx.user_id().to_string(), drink.clone());
                ctx.say(format!("<@{}> ordered a {drink}", ctx.user_id())).await;
                Ok(())
            }
        },
    ))
    .unwrap();

    (bot, gateway, orders)
}

#[tokio::test]
async fn test_commands_and_help() {
    let (bot, gateway, _orders) = coffee_bot().await;
    let help = bot.help_text();
    assert_eq!(
        help,
        "The available commands are:\n\n\
         `!uptime` – Reply with the uptime\n\
         `!coffee`\n\
         `!echo <word>`\n"
    );
    let router = bot.into_router();

    // channel chatter is ignored in reply-only mode
    let routed = router.route(message("C1", "U1", "!uptime")).await;
    assert_eq!(routed, Routed::Message(Dispatch::Ignored));

    let routed = router.route(message("C1", "U1", "<@BOT> !uptime")).await;
    assert!(matches!(routed, Routed::Message(Dispatch::Handled { .. })));

    let routed = router.route(message("C1", "U1", "<@BOT> !help")).await;
    assert_eq!(routed, Routed::Message(Dispatch::Help));

    let routed = router.route(message("D1", "U1", "!echo hello")).await;
    assert!(matches!(routed, Routed::Message(Dispatch::Handled { .. })));

    let routed = router.route(message("D1", "U1", "!echo hello world")).await;
    assert_eq!(routed, Routed::Message(Dispatch::Unknown));

    assert_eq!(
        gateway.take(),
        vec![
            Sent::Text("C1".to_string(), "up 3 days".to_string()),
            Sent::Text("C1".to_string(), format!("<@U1>: {help}")),
            Sent::Text("D1".to_string(), "you said hello".to_string()),
            Sent::Text("D1".to_string(), "I don't know that one".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_dialog_flow_for_two_users() {
    let (bot, gateway, orders) = coffee_bot().await;
    let router = bot.into_router();

    router.route(message("D1", "U1", "!coffee")).await;
    assert_eq!(
        gateway.take(),
        vec![Sent::Attachments("D1".to_string(), 1)]
    );

    for (user, trigger) in [("U1", "T1"), ("U2", "T2")] {
        let click = InteractionEvent::new(
            InteractionType::InteractiveMessage,
            "BOTcoffee_order_form",
            user,
        )
        .with_channel("C1")
        .with_trigger(trigger);
        let routed = router
            .route(GatewayEvent::new(EventKind::Interaction(click)).with_envelope(trigger))
            .await;
        assert!(matches!(routed, Routed::Interaction(Route::Opener { .. })));
    }

    let sent = gateway.take();
    assert_eq!(
        sent,
        vec![
            Sent::Dialog(
                "T1".to_string(),
                json!({"callback_id": "U1coffee_order_form", "title": "Request a coffee"})
            ),
            Sent::Ack("T1".to_string()),
            Sent::Dialog(
                "T2".to_string(),
                json!({"callback_id": "U2coffee_order_form", "title": "Request a coffee"})
            ),
            Sent::Ack("T2".to_string()),
        ]
    );

    let (tx, rx) = mpsc::channel(4);
    let shutdown = CancellationToken::new();
    let listener = tokio::spawn({
        let router = router.clone();
        let shutdown = shutdown.clone();
        async move { router.listen(rx, shutdown).await }
    });

    for (user, drink) in [("U2", "latte"), ("U1", "espresso")] {
        let mut submit = InteractionEvent::new(
            InteractionType::DialogSubmission,
            format!("{user}coffee_order_form"),
            user,
        )
        .with_channel("C1");
        submit.submission = Some(json!({ "drink": drink }));
        tx.send(GatewayEvent::new(EventKind::Interaction(submit)).with_envelope(user))
            .await
            .unwrap();
    }

    // handlers run in detached tasks; wait for both orders to land
    for _ in 0..200 {
        if orders.len() == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    shutdown.cancel();
    listener.await.unwrap();

    assert_eq!(orders.get(&"U1".to_string()), Some("espresso".to_string()));
    assert_eq!(orders.get(&"U2".to_string()), Some("latte".to_string()));
}
