//! Inbound message normalization.
//!
//! Gateway text carries markup the command templates should never see:
//!
//! - the bot's own mention token, `<@B123>` or `<@B123|name>`, is removed
//! - labelled links and references, `<https://example.com|example>`,
//!   `<@U456|ann>`, `<#C789|general>`, become their label
//! - bare user and channel references, `<@U456>` and `<#C789>`, become the id
//! - bare links, `<https://example.com>`, become the URL
//! - mail links, `<mailto:ann@example.com>`, become the address
//!
//! Unlabelled special commands such as `<!here>` carry no display value and
//! are kept verbatim. The result is trimmed. Normalizing already-normalized
//! text changes nothing.

use parley_core::{InboundMessage, MessageEvent, MessageKind};

/// Strips the bot's mention and link markup from inbound messages.
#[derive(Debug, Clone)]
pub struct Normalizer {
    bot_id: String,
}

impl Normalizer {
    /// Creates a normalizer for the bot with the given user id.
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
        }
    }

    /// Returns the bot id this normalizer strips.
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Returns `true` if `text` contains the bot's mention token.
    pub fn mentions(&self, text: &str) -> bool {
        self.find_mention(text, 0).is_some()
    }

    /// Normalizes message text.
    pub fn normalize_text(&self, text: &str) -> String {
        let stripped = self.strip_mentions(text);
        strip_link_markup(&stripped).trim().to_string()
    }

    /// Normalizes a plain message event.
    ///
    /// The kind is [`MessageKind::Direct`] for direct-message channels and
    /// [`MessageKind::Channel`] otherwise.
    pub fn normalize_message(&self, event: &MessageEvent) -> InboundMessage {
        let kind = if event.is_direct() {
            MessageKind::Direct
        } else {
            MessageKind::Channel
        };
        self.build(event, kind)
    }

    /// Normalizes an app-mention event.
    pub fn normalize_mention(&self, event: &MessageEvent) -> InboundMessage {
        self.build(event, MessageKind::Mention)
    }

    fn build(&self, event: &MessageEvent, kind: MessageKind) -> InboundMessage {
        InboundMessage::new(
            event.channel.as_str(),
            event.user.clone().unwrap_or_default(),
            event.text.as_str(),
            self.normalize_text(&event.text),
            kind,
        )
        .with_mentions_bot(self.mentions(&event.text))
        .with_ts(event.ts.as_str())
        .with_thread_ts(event.thread_ts.clone())
    }

    /// Returns the byte range of the next bot mention token at or after `from`.
    fn find_mention(&self, text: &str, from: usize) -> Option<(usize, usize)> {
        if self.bot_id.is_empty() {
            return None;
        }
        let needle = format!("<@{}", self.bot_id);
        let mut search = from;

        while let Some(offset) = text[search..].find(&needle) {
            let start = search + offset;
            let after = start + needle.len();
            match text[after..].chars().next() {
                Some('>') => return Some((start, after + 1)),
                Some('|') => {
                    if let Some(close) = text[after..].find('>') {
                        return Some((start, after + close + 1));
                    }
                }
                _ => {}
            }
            search = after;
        }
        None
    }

    fn strip_mentions(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        while let Some((start, end)) = self.find_mention(text, cursor) {
            out.push_str(&text[cursor..start]);
            cursor = end;
        }
        out.push_str(&text[cursor..]);
        out
    }
}

/// Replaces link markup with its visible text.
fn strip_link_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };

        let inner = &tail[1..close];
        match unwrap_link(inner) {
            Some(visible) => out.push_str(visible),
            None => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Returns the visible text of a link token, or `None` to keep it verbatim.
fn unwrap_link(inner: &str) -> Option<&str> {
    if let Some((_, label)) = inner.split_once('|') {
        return Some(label);
    }
    if let Some(id) = inner.strip_prefix(['@', '#']) {
        return Some(id);
    }
    if inner.starts_with("http://") || inner.starts_with("https://") {
        return Some(inner);
    }
    inner.strip_prefix("mailto:")
}
