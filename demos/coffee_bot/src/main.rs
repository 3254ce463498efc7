//! Coffee Bot Example
//!
//! A console rendition of the classic coffee-ordering bot. Type commands on
//! stdin as if they were direct messages; outbound messages, dialogs and
//! modals are printed. Interactions can be fed as JSON lines:
//!
//! ```text
//! help
//! coffee
//! {"envelope_id": "e1", "kind": "interaction", "payload": {"type": "interactive_message", "callback_id": "BCOFFEEcoffee_order_form", "user": {"id": "U1"}, "channel": {"id": "D1"}, "trigger_id": "T1"}}
//! {"envelope_id": "e2", "kind": "interaction", "payload": {"type": "dialog_submission", "callback_id": "U1coffee_order_form", "user": {"id": "U1"}, "channel": {"id": "D1"}, "submission": {"mealPreferences": "latte"}}}
//! {"envelope_id": "e3", "kind": "slash_command", "payload": {"command": "/modaltest", "trigger_id": "T2"}}
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package coffee-bot -- --config demos/coffee_bot/parley.toml
//! ```

mod coffee;
mod console;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use serde_json::json;

use parley::core::InteractionType;
use parley::prelude::*;
use parley::runtime::RuntimeBuilder;

use crate::console::ConsoleGateway;

#[derive(Parser, Debug)]
#[command(version, about = "A coffee-ordering bot on your terminal")]
struct Args {
    /// Configuration file (defaults to parley.toml in the working directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile
    #[arg(short, long)]
    profile: Option<String>,

    /// Identity the console gateway reports for the bot
    #[arg(long, default_value = "BCOFFEE")]
    bot_id: String,

    /// Channel plain input lines are posted in
    #[arg(long, default_value = "D1")]
    channel: String,

    /// User plain input lines are posted by
    #[arg(long, default_value = "U1")]
    user: String,
}

// ============================================================================
// Commands
// ============================================================================

fn register_commands(bot: &mut Bot, started: Instant) -> SetupResult<()> {
    bot.register(Command::new(
        "uptime",
        "Reply with the uptime",
        move |conv: Conversation| async move {
            reply!(
                conv,
                "Thanks for asking! I'm running since `{:?}`",
                started.elapsed()
            )
            .await;
        },
    )?)?;

    bot.register(Command::new(
        "getuser",
        "Get user info",
        |conv: Conversation| async move {
            match conv.bot().user_name(conv.message().user()).await {
                Ok(name) => reply!(conv, "Thanks for asking! Your username is `{name}`").await,
                Err(e) => reply!(conv, "Error getting user info: {e}").await,
            }
        },
    )?)?;

    bot.register(Command::new(
        "add <a:integer> <b:integer>",
        "Add two numbers",
        |conv: Conversation| async move {
            let (Some(a), Some(b)) = (conv.integer("a"), conv.integer("b")) else {
                return;
            };
            reply!(conv, "{a} + {b} = {}", a.saturating_add(b)).await;
        },
    )?)?;

    bot.unknown_command(|conv: Conversation| async move {
        conv.reply("Sorry, I don't know that one. Try `help`.").await;
    });

    Ok(())
}

// ============================================================================
// Slash Commands & Raw Interactions
// ============================================================================

fn register_modal_test(bot: &mut Bot) {
    bot.register_slash_command("/modaltest", |ctx: SlashContext| async move {
        let modal = json!({
            "type": "modal",
            "title": {"type": "plain_text", "text": "My App"},
            "close": {"type": "plain_text", "text": "Close"},
            "submit": {"type": "plain_text", "text": "Submit"},
            "blocks": [
                {"type": "section", "text": {"type": "mrkdwn", "text": "Hello from `/modaltest`"}},
            ],
        });
        ctx.bot().open_view(ctx.trigger_id(), &modal).await?;
        Ok(())
    });

    // Submissions of views no flow owns, such as the /modaltest modal.
    bot.register_interaction(
        InteractionType::ViewSubmission,
        |ctx: InteractionContext| async move {
            let view = ctx.view().ok_or("submission carries no view")?;
            ctx.bot()
                .update_view(&coffee::order_taken(), &view.hash, &view.id)
                .await?;
            debug!(view_id = %view.id, "Updated unowned view");
            Ok(())
        },
    );
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let started = Instant::now();

    let mut builder = RuntimeBuilder::new();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build()?;

    let gateway = Arc::new(ConsoleGateway::new(&args.bot_id));
    let mut bot = runtime.connect(gateway).await?;

    let orders = coffee::Orders::new();
    register_commands(&mut bot, started)?;
    coffee::register(&mut bot, &orders)?;
    register_modal_test(&mut bot);

    info!(
        bot_id = %bot.id(),
        prefix = %bot.command_prefix(),
        commands = bot.commands().len(),
        "Coffee bot ready, type `help` to list commands"
    );

    let events = console::spawn_stdin_reader(args.channel, args.user);
    runtime.run(bot, events).await?;

    info!(orders = orders.len(), "Coffee bot stopped");
    Ok(())
}
