//! Command template compiler.
//!
//! A [`Template`] is literal text with `<name>` placeholders, e.g.
//! `remind <user> about <topic>`. Templates are compiled once, at
//! registration time, into a token sequence:
//!
//! - literal tokens must equal the input token exactly (case-sensitive)
//! - each placeholder captures exactly one whitespace-free input token
//! - the whole input must be consumed, so `help` never matches `helpme`
//!   and `ping` never matches `ping now`
//!
//! Placeholders may declare a value type: `<name:string>` (the default) or
//! `<name:integer>`, which only accepts a run of ASCII digits.
//!
//! A command prefix is required at the start of the first input token,
//! whether the template opens with a literal or a placeholder: with prefix
//! `!`, `uptime` matches `!uptime` and `<word>` matches `!anything`.
//!
//! ```rust
//! use parley_framework::Template;
//!
//! let template = Template::compile("remind <user> in <minutes:integer>").unwrap();
//! let matched = template.matches("remind bob in 15").unwrap();
//! assert_eq!(matched.get("user"), Some("bob"));
//! assert_eq!(matched.integer("minutes"), Some(15));
//! assert!(template.matches("remind bob in soon").is_none());
//! ```

use std::str::FromStr;

use crate::error::{PatternError, PatternResult};

/// The value type accepted by a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Any whitespace-free token.
    String,
    /// A run of ASCII digits.
    Integer,
}

impl ParamKind {
    fn parse(name: &str, ty: &str) -> PatternResult<Self> {
        match ty {
            "" | "string" => Ok(Self::String),
            "integer" | "int" => Ok(Self::Integer),
            other => Err(PatternError::UnknownType {
                name: name.to_string(),
                ty: other.to_string(),
            }),
        }
    }

    fn accepts(self, token: &str) -> bool {
        match self {
            Self::String => !token.is_empty(),
            Self::Integer => !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, kind: ParamKind },
}

/// A compiled command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Template text as authored, without prefix.
    source: String,
    /// Required at the start of the first input token.
    prefix: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Compiles a template with no prefix.
    pub fn compile(source: &str) -> PatternResult<Self> {
        Self::compile_with_prefix("", source)
    }

    /// Compiles a template whose first token must start with `prefix`.
    ///
    /// `!` + `ping` only matches `!ping`; `!` + `<word>` matches `!hello`
    /// and captures `hello`.
    ///
    /// # Errors
    ///
    /// [`PatternError::InvalidPrefix`] if the prefix contains whitespace or
    /// angle brackets, plus every error [`Template::compile`] reports.
    pub fn compile_with_prefix(prefix: &str, source: &str) -> PatternResult<Self> {
        if prefix.contains(|c: char| c.is_whitespace() || c == '<' || c == '>') {
            return Err(PatternError::InvalidPrefix {
                prefix: prefix.to_string(),
            });
        }
        let segments = parse_segments(source)?;

        Ok(Self {
            source: source.to_string(),
            prefix: prefix.to_string(),
            segments,
        })
    }

    /// Returns the template text as authored, without prefix.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the prefix this template was compiled with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the number of placeholders.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param { .. }))
            .count()
    }

    /// Returns the placeholder names in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches the template against the whole of `text`.
    ///
    /// Returns `None` when the text does not match; this is the normal
    /// "try the next command" signal, not an error.
    pub fn matches(&self, text: &str) -> Option<Match> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != self.segments.len() {
            return None;
        }
        let first = tokens.first()?.strip_prefix(self.prefix.as_str())?;

        let mut params = Vec::with_capacity(self.param_count());
        let unprefixed = std::iter::once(first).chain(tokens[1..].iter().copied());
        for (segment, token) in self.segments.iter().zip(unprefixed) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != token {
                        return None;
                    }
                }
                Segment::Param { name, kind } => {
                    if !kind.accepts(token) {
                        return None;
                    }
                    params.push((name.clone(), token.to_string()));
                }
            }
        }

        Some(Match {
            params,
            span: tokens.join(" "),
        })
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix, self.source)
    }
}

impl FromStr for Template {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

fn parse_segments(template: &str) -> PatternResult<Vec<Segment>> {
    check_brackets(template)?;

    let mut segments = Vec::new();
    for token in template.split_whitespace() {
        if !token.contains(['<', '>']) {
            segments.push(Segment::Literal(token.to_string()));
            continue;
        }

        let inner = token
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .filter(|t| !t.contains(['<', '>']))
            .ok_or_else(|| PatternError::EmbeddedPlaceholder {
                token: token.to_string(),
            })?;

        let (name, ty) = inner.split_once(':').unwrap_or((inner, ""));
        if !is_valid_name(name) {
            return Err(PatternError::InvalidName {
                name: name.to_string(),
            });
        }
        let kind = ParamKind::parse(name, ty)?;

        let duplicate = segments
            .iter()
            .any(|s| matches!(s, Segment::Param { name: n, .. } if n == name));
        if duplicate {
            return Err(PatternError::DuplicateName {
                name: name.to_string(),
            });
        }

        segments.push(Segment::Param {
            name: name.to_string(),
            kind,
        });
    }

    if segments.is_empty() {
        return Err(PatternError::Empty);
    }
    Ok(segments)
}

/// Rejects nested, unopened and unclosed brackets.
///
/// A `<` that is still open when another `<` appears is reported at its own
/// position.
fn check_brackets(template: &str) -> PatternResult<()> {
    let mut open: Option<usize> = None;
    for (position, ch) in template.char_indices() {
        match (ch, open) {
            ('<', Some(start)) => {
                return Err(PatternError::Unbalanced {
                    template: template.to_string(),
                    position: start,
                });
            }
            ('<', None) => open = Some(position),
            ('>', None) => {
                return Err(PatternError::Unbalanced {
                    template: template.to_string(),
                    position,
                });
            }
            ('>', Some(_)) => open = None,
            _ => {}
        }
    }

    match open {
        Some(position) => Err(PatternError::Unbalanced {
            template: template.to_string(),
            position,
        }),
        None => Ok(()),
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

// ============================================================================
// Match
// ============================================================================

/// The result of a successful template match.
///
/// Captures are kept in template order. [`Match::empty`] is the match handed
/// to the unknown-command handler: every lookup on it reports not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Match {
    params: Vec<(String, String)>,
    span: String,
}

impl Match {
    /// A match with no parameters and an empty span.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the captured value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parses the captured value for `name`.
    pub fn parse<T: FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Returns the captured value for `name` as an integer.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.parse(name)
    }

    /// Returns the whole matched text, whitespace-collapsed.
    pub fn span(&self) -> &str {
        &self.span
    }

    /// Returns the number of captured parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterates over `(name, value)` pairs in template order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_literal_requires_exact_match() {
        let t = assert_ok!(Template::compile("help"));
        assert!(t.matches("help").is_some());
        assert!(t.matches("  help  ").is_some());
        assert!(t.matches("helpme").is_none());
        assert!(t.matches("help me").is_none());
        assert!(t.matches("Help").is_none());
        assert!(t.matches("").is_none());
    }

    #[test]
    fn test_placeholders_take_one_token_each() {
        let t = assert_ok!(Template::compile("remind <user> about <topic>"));
        assert_eq!(t.param_count(), 2);
        assert_eq!(t.param_names().collect::<Vec<_>>(), vec!["user", "topic"]);

        let m = t.matches("remind ann about lunch").unwrap();
        assert_eq!(m.get("user"), Some("ann"));
        assert_eq!(m.get("topic"), Some("lunch"));
        assert_eq!(m.span(), "remind ann about lunch");
        assert_eq!(
            m.iter().collect::<Vec<_>>(),
            vec![("user", "ann"), ("topic", "lunch")]
        );

        assert!(t.matches("remind ann about lunch today").is_none());
        assert!(t.matches("remind ann about").is_none());
        assert!(t.matches("remind ann regarding lunch").is_none());
    }

    #[test]
    fn test_k_placeholders_accept_exactly_k_free_tokens() {
        for k in 0..5 {
            let mut source = String::from("cmd");
            for i in 0..k {
                source.push_str(&format!(" <p{i}>"));
            }
            let t = assert_ok!(Template::compile(&source));

            let input = |n: usize| {
                let mut s = String::from("cmd");
                for i in 0..n {
                    s.push_str(&format!(" v{i}"));
                }
                s
            };
            assert!(t.matches(&input(k)).is_some(), "k={k}");
            assert!(t.matches(&input(k + 1)).is_none(), "k={k}");
            if k > 0 {
                assert!(t.matches(&input(k - 1)).is_none(), "k={k}");
            }
        }
    }

    #[test]
    fn test_integer_placeholder() {
        let t = assert_ok!(Template::compile("roll <sides:integer>"));
        assert_eq!(t.matches("roll 20").unwrap().integer("sides"), Some(20));
        assert_eq!(t.matches("roll 007").unwrap().integer("sides"), Some(7));
        assert!(t.matches("roll twenty").is_none());
        assert!(t.matches("roll -3").is_none());
        assert!(t.matches("roll +3").is_none());

        let t = assert_ok!(Template::compile("say <word:string>"));
        assert_eq!(t.matches("say 42").unwrap().get("word"), Some("42"));
    }

    #[test]
    fn test_prefix_is_part_of_first_literal() {
        let t = assert_ok!(Template::compile_with_prefix("!", "uptime"));
        assert_eq!(t.as_str(), "uptime");
        assert_eq!(t.prefix(), "!");
        assert_eq!(t.to_string(), "!uptime");
        assert!(t.matches("!uptime").is_some());
        assert!(t.matches("uptime").is_none());
        assert!(t.matches("! uptime").is_none());
        assert!(t.matches("!!uptime").is_none());
    }

    #[test]
    fn test_prefix_before_leading_placeholder() {
        let t = assert_ok!(Template::compile_with_prefix("!", "<word>"));
        assert_eq!(t.to_string(), "!<word>");
        assert_eq!(t.matches("!hello").unwrap().get("word"), Some("hello"));
        assert_eq!(t.matches("!!hello").unwrap().get("word"), Some("!hello"));
        assert!(t.matches("hello").is_none());
        assert!(t.matches("!").is_none());

        let t = assert_ok!(Template::compile_with_prefix("!", "<n:integer> times"));
        assert_eq!(t.matches("!3 times").unwrap().integer("n"), Some(3));
        assert!(t.matches("3 times").is_none());
    }

    #[test]
    fn test_prefix_must_be_a_single_plain_token() {
        for prefix in ["hey ", "<", "a>b"] {
            assert!(matches!(
                Template::compile_with_prefix(prefix, "ping"),
                Err(PatternError::InvalidPrefix { .. })
            ));
        }
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(
            Template::compile("remind <user about <topic>"),
            Err(PatternError::Unbalanced { position: 7, .. })
        ));
        assert!(matches!(
            Template::compile("remind user>"),
            Err(PatternError::Unbalanced { .. })
        ));
        assert!(matches!(
            Template::compile("remind <user"),
            Err(PatternError::Unbalanced { position: 7, .. })
        ));
        assert!(matches!(
            Template::compile("id-<n>"),
            Err(PatternError::EmbeddedPlaceholder { .. })
        ));
        assert!(matches!(
            Template::compile("<a><b>"),
            Err(PatternError::EmbeddedPlaceholder { .. })
        ));
        assert!(matches!(
            Template::compile("go <>"),
            Err(PatternError::InvalidName { .. })
        ));
        assert!(matches!(
            Template::compile("go <n:float>"),
            Err(PatternError::UnknownType { .. })
        ));
        assert!(matches!(
            Template::compile("swap <a> <a>"),
            Err(PatternError::DuplicateName { .. })
        ));
        assert_eq!(Template::compile("   "), Err(PatternError::Empty));
    }

    #[test]
    fn test_empty_match_reports_not_found() {
        let m = Match::empty();
        assert!(m.is_empty());
        assert_eq!(m.len(), 0);
        assert_eq!(m.get("anything"), None);
        assert_eq!(m.integer("anything"), None);
        assert_eq!(m.span(), "");
    }
}
