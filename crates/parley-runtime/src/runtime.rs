//! Runtime orchestration.
//!
//! The runtime owns the loaded configuration, initializes logging, applies
//! the bot settings and runs the receive loop until shutdown.
//!
//! ```rust,ignore
//! use parley_runtime::ParleyRuntime;
//!
//! let runtime = ParleyRuntime::new();
//! let mut bot = runtime.connect(gateway).await?;
//! bot.command("uptime", |conv: Conversation| async move {
//!     conv.reply("up").await;
//! })?;
//! runtime.run(bot, events).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::{RwLock, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use parley_core::{BoxedGateway, GatewayEvent};
use parley_framework::Bot;

use crate::config::{ConfigLoader, ConfigResult, ParleyConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Drives a [`Bot`] with settings from [`ParleyConfig`].
pub struct ParleyRuntime {
    config: ParleyConfig,
    running: Arc<RwLock<bool>>,
}

impl ParleyRuntime {
    /// Creates a runtime from `parley.toml` and `PARLEY_*` variables.
    ///
    /// Falls back to defaults if the configuration cannot be loaded.
    pub fn new() -> Self {
        let config = ConfigLoader::new().load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config ({e}), using defaults");
            ParleyConfig::default()
        });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from configuration and initializes logging.
    pub fn from_config(config: &ParleyConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            command_prefix = %config.bot.command_prefix,
            reply_only = config.bot.reply_only,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ParleyConfig {
        &self.config
    }

    /// Authenticates against the gateway and returns a configured bot.
    ///
    /// The command prefix only applies to commands registered afterwards,
    /// so register commands on the returned bot.
    pub async fn connect(&self, gateway: BoxedGateway) -> RuntimeResult<Bot> {
        let mut bot = Bot::connect(gateway).await?;
        self.configure_bot(&mut bot);
        Ok(bot)
    }

    /// Applies the configured bot settings.
    pub fn configure_bot(&self, bot: &mut Bot) {
        let settings = &self.config.bot;
        if !bot.commands().is_empty() && settings.command_prefix != bot.command_prefix() {
            warn!(
                registered = bot.commands().len(),
                "Command prefix changed after commands were registered; they keep their old prefix"
            );
        }
        bot.set_command_prefix(settings.command_prefix.clone())
            .set_reply_only(settings.reply_only)
            .set_ack_window(settings.ack_timeout());
    }

    /// Returns `true` while a bot is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs the bot until Ctrl+C or SIGTERM.
    pub async fn run(&self, bot: Bot, events: mpsc::Receiver<GatewayEvent>) -> RuntimeResult<()> {
        info!("Parley runtime is now running. Press Ctrl+C to stop.");
        self.run_until(bot, events, wait_for_shutdown()).await
    }

    /// Runs the bot until `shutdown` resolves or the event stream closes.
    pub async fn run_until<F>(
        &self,
        bot: Bot,
        events: mpsc::Receiver<GatewayEvent>,
        shutdown: F,
    ) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(RuntimeError::AlreadyRunning);
            }
            *running = true;
        }

        let token = CancellationToken::new();
        let listener = bot.listen(events, token.clone());
        tokio::pin!(listener);

        let interrupted = tokio::select! {
            _ = &mut listener => false,
            _ = shutdown => true,
        };
        if interrupted {
            token.cancel();
            listener.await;
        } else {
            info!("Event stream closed");
        }

        *self.running.write().await = false;
        info!("Runtime stopped");
        Ok(())
    }
}

impl Default for ParleyRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for shutdown signals (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!(error = %e, "Failed to register SIGTERM handler");
                wait_for_ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`ParleyRuntime`] with custom configuration.
///
/// ```rust,ignore
/// let runtime = ParleyRuntime::builder()
///     .config_file("config/parley.toml")
///     .profile("production")
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g. "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<ParleyRuntime> {
        let config = self.config_loader.load()?;
        Ok(ParleyRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;

    use parley_core::{
        Attachment, EventKind, Gateway, GatewayResult, LookupError, LookupResult, MessageEvent,
        UserProfile,
    };
    use parley_framework::Conversation;

    use super::*;

    #[derive(Default)]
    struct NullGateway {
        posts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Gateway for NullGateway {
        async fn auth_test(&self) -> GatewayResult<String> {
            Ok("B1".to_string())
        }

        async fn post_message(&self, _channel: &str, text: &str) -> GatewayResult<String> {
            self.posts.lock().push(text.to_string());
            Ok("1.0".to_string())
        }

        async fn post_attachments(&self, _channel: &str, _items: &[Attachment]) -> GatewayResult<String> {
            Ok("1.0".to_string())
        }

        async fn open_dialog(&self, _trigger: &str, _dialog: &Value) -> GatewayResult<()> {
            Ok(())
        }

        async fn open_view(&self, _trigger: &str, _view: &Value) -> GatewayResult<String> {
            Ok("V1".to_string())
        }

        async fn update_view(&self, _view: &Value, _hash: &str, _id: &str) -> GatewayResult<()> {
            Ok(())
        }

        async fn ack(&self, _envelope: &str, _payload: Option<Value>) -> GatewayResult<()> {
            Ok(())
        }

        async fn user_profile(&self, user_id: &str) -> LookupResult<UserProfile> {
            Err(LookupError::not_found("user", user_id))
        }

        async fn user_group_members(&self, group_id: &str) -> LookupResult<Vec<String>> {
            Err(LookupError::not_found("usergroup", group_id))
        }
    }

    fn runtime(prefix: &str, reply_only: bool) -> ParleyRuntime {
        let mut config = ParleyConfig::default();
        config.bot.command_prefix = prefix.to_string();
        config.bot.reply_only = reply_only;
        config.bot.ack_timeout_ms = 500;
        ParleyRuntime::from_config(&config)
    }

    fn direct(text: &str) -> GatewayEvent {
        GatewayEvent::new(EventKind::Message(MessageEvent {
            channel: "D1".to_string(),
            channel_type: None,
            user: Some("U1".to_string()),
            text: text.to_string(),
            ts: "1.0".to_string(),
            thread_ts: None,
            bot_id: None,
            subtype: None,
        }))
    }

    #[tokio::test]
    async fn test_connect_applies_settings() {
        let runtime = runtime("!", true);
        let gateway = Arc::new(NullGateway::default());
        let bot = runtime.connect(gateway).await.unwrap();
        assert_eq!(bot.id(), "B1");
        assert_eq!(bot.command_prefix(), "!");
        assert!(bot.is_reply_only());
    }

    #[tokio::test]
    async fn test_run_until_event_stream_closes() {
        let runtime = runtime("!", false);
        let gateway = Arc::new(NullGateway::default());
        let mut bot = runtime.connect(gateway.clone()).await.unwrap();
        bot.command("ping", |conv: Conversation| async move {
            conv.reply("pong").await;
        })
        .unwrap();

        let (tx, rx) = mpsc::channel(4);
        tx.send(direct("!ping")).await.unwrap();
        drop(tx);

        runtime
            .run_until(bot, rx, std::future::pending::<()>())
            .await
            .unwrap();
        assert!(!runtime.is_running().await);

        // routed tasks are detached; give them a moment
        for _ in 0..100 {
            if !gateway.posts.lock().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(*gateway.posts.lock(), vec!["pong".to_string()]);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let runtime = Arc::new(runtime("", false));
        let bot = runtime
            .connect(Arc::new(NullGateway::default()))
            .await
            .unwrap();
        let (_tx, rx) = mpsc::channel(4);
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn({
            let runtime = runtime.clone();
            async move {
                runtime
                    .run_until(bot, rx, async {
                        let _ = stop_rx.await;
                    })
                    .await
            }
        });

        for _ in 0..100 {
            if runtime.is_running().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(runtime.is_running().await);

        let second = runtime
            .connect(Arc::new(NullGateway::default()))
            .await
            .unwrap();
        let (_tx2, rx2) = mpsc::channel(1);
        let err = runtime
            .run_until(second, rx2, std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyRunning));

        stop_tx.send(()).unwrap();
        task.await.unwrap().unwrap();
        assert!(!runtime.is_running().await);
    }

    #[test]
    fn test_builder_merges_settings() {
        figment::Jail::expect_with(|jail| {
            let mut config = ParleyConfig::default();
            config.bot.command_prefix = "?".to_string();
            let runtime = ParleyRuntime::builder()
                .search_path(jail.directory())
                .without_env()
                .merge(config)
                .build()
                .map_err(|e| e.to_string())?;
            assert_eq!(runtime.config().bot.command_prefix, "?");
            Ok(())
        });
    }
}
