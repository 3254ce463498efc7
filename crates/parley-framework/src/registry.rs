//! Ordered command table.
//!
//! Insertion order is priority: lookups return the first command whose
//! template matches. Duplicate templates are legal; the earlier one shadows
//! the later.

use std::fmt::Write as _;

use crate::command::Command;
use crate::pattern::Match;

/// First line of the generated help text.
pub const HELP_BANNER: &str = "The available commands are:\n\n";

/// Separator between a command template and its description in help text.
pub const HELP_SEPARATOR: &str = " – ";

/// The ordered list of registered commands.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command.
    pub fn register(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Returns all commands in registration order.
    pub fn all(&self) -> &[Command] {
        &self.commands
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Finds the first command matching `text`.
    pub fn find(&self, text: &str) -> Option<(&Command, Match)> {
        self.commands
            .iter()
            .find_map(|cmd| cmd.matches(text).map(|m| (cmd, m)))
    }

    /// Renders the help listing.
    ///
    /// One line per command, in registration order:
    /// `` `{prefix}{template}` `` followed by ` – {description}` when the
    /// description is non-empty.
    pub fn help_text(&self, prefix: &str) -> String {
        let mut out = String::from(HELP_BANNER);
        for cmd in &self.commands {
            let _ = write!(out, "`{prefix}{}`", cmd.template().as_str());
            if !cmd.description().is_empty() {
                out.push_str(HELP_SEPARATOR);
                out.push_str(cmd.description());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Conversation;

    async fn noop(_conv: Conversation) {}

    fn cmd(template: &str, description: &str) -> Command {
        Command::new(template, description, noop).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = CommandRegistry::new();
        registry.register(cmd("deploy <env>", "first"));
        registry.register(cmd("deploy <target>", "second"));
        registry.register(cmd("deploy prod", "third"));

        let (found, m) = registry.find("deploy prod").unwrap();
        assert_eq!(found.description(), "first");
        assert_eq!(m.get("env"), Some("prod"));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_find_none() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.find("anything").is_none());
    }

    #[test]
    fn test_help_text_format() {
        let mut registry = CommandRegistry::new();
        registry.register(cmd("uptime", "Reply with the uptime"));
        registry.register(cmd("getuser", ""));

        assert_eq!(
            registry.help_text("!"),
            "The available commands are:\n\n\
             `!uptime` – Reply with the uptime\n\
             `!getuser`\n"
        );
    }

    #[test]
    fn test_help_text_empty_registry() {
        assert_eq!(CommandRegistry::new().help_text(""), HELP_BANNER);
    }
}
