//! Command definitions.
//!
//! A [`Command`] binds a compiled [`Template`] to a handler and an optional
//! help description. Commands are created with [`Command::new`], handed to
//! the bot, and never change afterwards.

use std::future::Future;

use crate::context::Conversation;
use crate::error::PatternResult;
use crate::handler::{BoxedHandler, into_handler};
use crate::pattern::{Match, Template};

/// A registered command: template, description and handler.
#[derive(Clone)]
pub struct Command {
    template: Template,
    description: String,
    handler: BoxedHandler<Conversation>,
}

impl Command {
    /// Compiles `template` and creates a command.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`](crate::PatternError) if the template is
    /// malformed.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let cmd = Command::new("uptime", "Reply with the uptime", |conv: Conversation| async move {
    ///     conv.reply("up since monday").await;
    /// })?;
    /// ```
    pub fn new<F, Fut>(
        template: &str,
        description: impl Into<String>,
        handler: F,
    ) -> PatternResult<Self>
    where
        F: Fn(Conversation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::from_boxed(template, description, into_handler(handler))
    }

    /// Creates a command from an already boxed handler.
    pub fn from_boxed(
        template: &str,
        description: impl Into<String>,
        handler: BoxedHandler<Conversation>,
    ) -> PatternResult<Self> {
        Ok(Self {
            template: Template::compile(template)?,
            description: description.into(),
            handler,
        })
    }

    /// Recompiles the template so its first token must start with `prefix`.
    ///
    /// Any prefix applied earlier is replaced.
    pub fn with_prefix(mut self, prefix: &str) -> PatternResult<Self> {
        self.template = Template::compile_with_prefix(prefix, self.template.as_str())?;
        Ok(self)
    }

    /// Returns the compiled template.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Returns the help description (possibly empty).
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Matches the command against normalized text.
    pub fn matches(&self, text: &str) -> Option<Match> {
        self.template.matches(text)
    }

    /// Invokes the handler.
    pub async fn call(&self, conv: Conversation) {
        self.handler.call(conv).await;
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("template", &self.template.to_string())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PatternError;

    async fn noop(_conv: Conversation) {}

    #[test]
    fn test_new_compiles_template() {
        let cmd = Command::new("echo <word>", "Echo a word", noop).unwrap();
        assert_eq!(cmd.template().as_str(), "echo <word>");
        assert_eq!(cmd.description(), "Echo a word");
        assert_eq!(cmd.matches("echo hi").unwrap().get("word"), Some("hi"));
    }

    #[test]
    fn test_new_rejects_malformed_template() {
        let err = Command::new("echo <word", "", noop).unwrap_err();
        assert!(matches!(err, PatternError::Unbalanced { .. }));
    }

    #[test]
    fn test_with_prefix_replaces_previous_prefix() {
        let cmd = Command::new("ping", "", noop)
            .unwrap()
            .with_prefix("!")
            .unwrap()
            .with_prefix("?")
            .unwrap();
        assert!(cmd.matches("?ping").is_some());
        assert!(cmd.matches("!ping").is_none());
        assert!(cmd.matches("!?ping").is_none());
    }
}
