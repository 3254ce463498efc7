//! Coffee ordering through a dialog and through a modal.
//!
//! Both flows start from a button on a message posted by a command. The
//! button click opens a form whose callback id carries the clicking user's
//! id, so submissions from several users are told apart.

use serde_json::{Value, json};

use parley::prelude::*;

/// Suffix of the dialog-based flow.
pub const DIALOG_FLOW: &str = "coffee_order_form";

/// Suffix of the modal-based flow.
pub const MODAL_FLOW: &str = "modal_coffee_order_form";

const DRINKS: &[(&str, &str)] = &[
    ("Cappuccino", "cappuccino"),
    ("Latte", "latte"),
    ("Pour Over", "pourOver"),
    ("Cold Brew", "coldBrew"),
];

/// Orders taken so far, keyed by user id.
pub type Orders = SessionStore<String, String>;

/// Registers the `coffee` and `coffee-modal` commands and their flows.
pub fn register(bot: &mut Bot, orders: &Orders) -> SetupResult<()> {
    bot.register(Command::new(
        "coffee",
        "Reply with the coffee action dialog",
        |conv: Conversation| async move { post_order_button(&conv, DIALOG_FLOW).await },
    )?)?;
    bot.register(Command::new(
        "coffee-modal",
        "Reply with the coffee action modal",
        |conv: Conversation| async move { post_order_button(&conv, MODAL_FLOW).await },
    )?)?;

    let dialog_orders = orders.clone();
    bot.register_interaction_flow(InteractionRegistration::dialog(
        DIALOG_FLOW,
        open_dialog,
        move |ctx: InteractionContext| {
            let orders = dialog_orders.clone();
            async move { take_dialog_order(ctx, orders).await }
        },
    ))?;

    let modal_orders = orders.clone();
    bot.register_interaction_flow(InteractionRegistration::modal(
        MODAL_FLOW,
        open_modal,
        move |ctx: InteractionContext| {
            let orders = modal_orders.clone();
            async move { take_modal_order(ctx, orders).await }
        },
    ))?;

    Ok(())
}

async fn post_order_button(conv: &Conversation, flow: &str) {
    let attachment = Attachment::new(
        "I am Coffeebot :robot_face:, and I'm here to help bring you fresh coffee :coffee:",
    )
    .color("#3AA3E3")
    .callback_id(conv.bot().callback_id(flow))
    .action(AttachmentAction::button(
        "coffee_order",
        ":coffee: Order Coffee",
        "coffee_order",
    ));

    if let Err(e) = conv
        .bot()
        .post_attachments(conv.message().channel(), &[attachment])
        .await
    {
        warn!(error = %e, "Failed to post coffee button");
    }
}

/// Replaces the button message while the form is open.
fn taking_order() -> Value {
    json!({
        "replace_original": true,
        "text": ":pencil: Taking your order...",
        "attachments": [],
    })
}

async fn open_dialog(ctx: InteractionContext) -> HandlerResult {
    let trigger = ctx.trigger_id().ok_or("interaction carries no trigger id")?;
    let options: Vec<Value> = DRINKS
        .iter()
        .map(|(label, value)| json!({"label": label, "value": value}))
        .collect();
    let dialog = json!({
        "title": "Request a coffee",
        "submit_label": "Submit",
        "callback_id": ctx.submission_callback_id(),
        "elements": [
            {
                "label": "Coffee Type",
                "type": "select",
                "name": "mealPreferences",
                "placeholder": "Select a drink",
                "options": options,
            },
            {
                "label": "Customization orders",
                "type": "textarea",
                "name": "customizePreference",
                "optional": true,
            },
        ],
    });

    ctx.bot().open_dialog(trigger, &dialog).await?;
    ctx.ack().send(Some(taking_order())).await;
    Ok(())
}

async fn take_dialog_order(ctx: InteractionContext, orders: Orders) -> HandlerResult {
    let submission = ctx.submission().cloned().unwrap_or(Value::Null);
    let drink = submission["mealPreferences"]
        .as_str()
        .unwrap_or("coffee")
        .to_string();
    info!(user = ctx.user_id(), %drink, "Dialog order received");
    orders.insert(ctx.user_id().to_string(), drink);

    ctx.ack().send(None).await;
    let attachment = Attachment::new(":white_check_mark: Order received!")
        .callback_id(ctx.bot().callback_id(DIALOG_FLOW));
    if let Some(channel) = ctx.channel_id() {
        ctx.bot().post_attachments(channel, &[attachment]).await?;
    }
    Ok(())
}

async fn open_modal(ctx: InteractionContext) -> HandlerResult {
    let trigger = ctx.trigger_id().ok_or("interaction carries no trigger id")?;
    let options: Vec<Value> = DRINKS
        .iter()
        .map(|(label, _)| {
            json!({"text": {"type": "plain_text", "text": label}, "value": label})
        })
        .collect();
    let modal = json!({
        "type": "modal",
        "callback_id": ctx.submission_callback_id(),
        "title": {"type": "plain_text", "text": "Coffee Modal"},
        "close": {"type": "plain_text", "text": "Close"},
        "submit": {"type": "plain_text", "text": "Submit"},
        "blocks": [
            {
                "type": "input",
                "block_id": "drink",
                "label": {"type": "plain_text", "text": "Drink"},
                "element": {"type": "static_select", "action_id": "coffee-options", "options": options},
            },
            {
                "type": "input",
                "block_id": "customisation",
                "label": {"type": "plain_text", "text": "Customisation"},
                "hint": {"type": "plain_text", "text": "How would you like to customise your drink"},
                "element": {"type": "plain_text_input", "action_id": "customisation"},
            },
        ],
    });

    ctx.bot().open_view(trigger, &modal).await?;
    ctx.ack().send(Some(taking_order())).await;
    Ok(())
}

async fn take_modal_order(ctx: InteractionContext, orders: Orders) -> HandlerResult {
    let view = ctx.view().ok_or("submission carries no view")?;
    let drink = view.state["values"]["drink"]["coffee-options"]["selected_option"]["value"]
        .as_str()
        .unwrap_or("coffee")
        .to_string();
    info!(user = ctx.user_id(), %drink, "Modal order received");
    orders.insert(ctx.user_id().to_string(), drink);

    ctx.bot()
        .update_view(&order_taken(), &view.hash, &view.id)
        .await?;
    Ok(())
}

/// The view shown once an order went through.
pub fn order_taken() -> Value {
    json!({
        "type": "modal",
        "title": {"type": "plain_text", "text": "My App"},
        "close": {"type": "plain_text", "text": "Close"},
        "blocks": [
            {"type": "section", "text": {"type": "mrkdwn", "text": "Order Taken!"}},
        ],
    })
}
