//! Error types for the Parley framework.

use thiserror::Error;

/// Errors raised while compiling a command template.
///
/// These are only ever produced at registration time; a compiled template
/// cannot fail while matching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The template contains no tokens.
    #[error("command template is empty")]
    Empty,

    /// An angle bracket has no partner.
    #[error("unbalanced angle bracket in template '{template}' at byte {position}")]
    Unbalanced {
        /// The offending template.
        template: String,
        /// Byte offset of the unmatched bracket.
        position: usize,
    },

    /// A placeholder shares a token with literal text or another placeholder.
    #[error("placeholder must occupy a whole token, found '{token}'")]
    EmbeddedPlaceholder {
        /// The offending token.
        token: String,
    },

    /// A placeholder name is empty or contains invalid characters.
    #[error("invalid placeholder name '{name}'")]
    InvalidName {
        /// The offending name.
        name: String,
    },

    /// A placeholder declares an unknown value type.
    #[error("unknown placeholder type '{ty}' for '{name}'")]
    UnknownType {
        /// Placeholder name.
        name: String,
        /// The unknown type.
        ty: String,
    },

    /// Two placeholders share a name.
    #[error("duplicate placeholder name '{name}'")]
    DuplicateName {
        /// The duplicated name.
        name: String,
    },

    /// A command prefix contains whitespace or angle brackets.
    #[error("invalid command prefix '{prefix}'")]
    InvalidPrefix {
        /// The offending prefix.
        prefix: String,
    },
}

/// Errors raised while setting up a bot, before it starts listening.
///
/// Every variant indicates a programming error; callers are expected to
/// propagate it out of `main` rather than continue with a partial table.
#[derive(Debug, Clone, Error)]
pub enum SetupError {
    /// A command template failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The event type is consumed by the dispatcher itself.
    #[error("event type '{0}' is reserved for the command dispatcher")]
    ReservedEvent(String),

    /// An interaction registration has an empty callback-id suffix.
    #[error("interaction suffix must not be empty")]
    EmptySuffix,
}

/// Boxed error returned by interaction, slash command and event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by interaction and slash command handlers.
pub type HandlerResult = Result<(), HandlerError>;

/// Result type for template compilation.
pub type PatternResult<T> = Result<T, PatternError>;

/// Result type for bot setup.
pub type SetupResult<T> = Result<T, SetupError>;
