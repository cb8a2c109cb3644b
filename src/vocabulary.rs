//! The fixed inline vocabulary shared by the canonicalizer, the keyword
//! tagger and the splitter, plus a tokenizer and tag stack over markup that
//! uses only that vocabulary.

use regex::Regex;
use std::sync::LazyLock;

/// The only tags canonical markup may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AllowedTag {
    Bold,
    Italic,
    Underline,
    Strike,
    Spoiler,
    Link,
    Code,
    Pre,
    Blockquote,
}

impl AllowedTag {
    pub const ALL: [AllowedTag; 9] = [
        AllowedTag::Bold,
        AllowedTag::Italic,
        AllowedTag::Underline,
        AllowedTag::Strike,
        AllowedTag::Spoiler,
        AllowedTag::Link,
        AllowedTag::Code,
        AllowedTag::Pre,
        AllowedTag::Blockquote,
    ];

    /// The tag name used in canonical markup.
    pub fn name(self) -> &'static str {
        match self {
            AllowedTag::Bold => "b",
            AllowedTag::Italic => "i",
            AllowedTag::Underline => "u",
            AllowedTag::Strike => "s",
            AllowedTag::Spoiler => "tg-spoiler",
            AllowedTag::Link => "a",
            AllowedTag::Code => "code",
            AllowedTag::Pre => "pre",
            AllowedTag::Blockquote => "blockquote",
        }
    }

    /// Look up a canonical tag name (case-insensitive).
    pub fn from_name(name: &str) -> Option<AllowedTag> {
        let lowered = name.to_ascii_lowercase();
        AllowedTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.name() == lowered)
    }

    /// Like [`AllowedTag::from_name`], but also accepts the HTML synonyms a
    /// source document may use for the same inline semantics.
    pub fn from_source_name(name: &str) -> Option<AllowedTag> {
        match name.to_ascii_lowercase().as_str() {
            "strong" => Some(AllowedTag::Bold),
            "em" => Some(AllowedTag::Italic),
            "ins" => Some(AllowedTag::Underline),
            "del" | "strike" => Some(AllowedTag::Strike),
            other => AllowedTag::from_name(other),
        }
    }

    /// The opening tag without attributes, e.g. `<b>`.
    pub fn opening(self) -> String {
        format!("<{}>", self.name())
    }

    /// The closing tag, e.g. `</b>`.
    pub fn closing(self) -> String {
        format!("</{}>", self.name())
    }

    /// Content of these tags is emitted verbatim, never reinterpreted.
    pub fn is_verbatim(self) -> bool {
        matches!(self, AllowedTag::Code | AllowedTag::Pre)
    }
}

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)(?:\s[^<>]*)?/?>").unwrap());

static TEXT_ATOM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);|.").unwrap()
});

static HREF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\bhref\s*=\s*"([^"]*)""#).unwrap());

/// One piece of canonical markup.  `raw` slices borrow the input, so
/// re-emitting every token reproduces it byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Open { tag: AllowedTag, raw: &'a str },
    Close { tag: AllowedTag, raw: &'a str },
    Text(&'a str),
}

impl<'a> Token<'a> {
    pub fn raw(&self) -> &'a str {
        match *self {
            Token::Open { raw, .. } | Token::Close { raw, .. } => raw,
            Token::Text(text) => text,
        }
    }
}

/// Split markup into vocabulary tags and text runs.  Anything that looks
/// like a tag but is not in the vocabulary stays part of the text.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::vocabulary::{tokenize, AllowedTag, Token};
///
/// let tokens = tokenize("a<b>b</b><x>");
/// assert_eq!(tokens[0], Token::Text("a"));
/// assert_eq!(tokens[1], Token::Open { tag: AllowedTag::Bold, raw: "<b>" });
/// assert_eq!(tokens[4], Token::Text("<x>"));
/// ```
pub fn tokenize(markup: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut text_start = 0;
    for caps in TAG_REGEX.captures_iter(markup) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        let tag = match AllowedTag::from_name(name) {
            Some(tag) => tag,
            None => continue,
        };
        if whole.start() > text_start {
            tokens.push(Token::Text(&markup[text_start..whole.start()]));
        }
        let is_close = caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
        let raw = whole.as_str();
        tokens.push(if is_close {
            Token::Close { tag, raw }
        } else {
            Token::Open { tag, raw }
        });
        text_start = whole.end();
    }
    if text_start < markup.len() {
        tokens.push(Token::Text(&markup[text_start..]));
    }
    tokens
}

/// Split a text run into the smallest units that may be separated: single
/// characters, with character references kept whole.
pub fn text_atoms(text: &str) -> impl Iterator<Item = &str> {
    TEXT_ATOM.find_iter(text).map(|m| m.as_str())
}

/// Value of the `href` attribute of a raw opening tag, if any.
pub fn href_of(raw_open: &str) -> Option<&str> {
    HREF_REGEX
        .captures(raw_open)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Concatenated text of all [`Token::Text`] runs: the markup with every
/// vocabulary tag removed (character references are left encoded).
pub fn strip_tags(markup: &str) -> String {
    tokenize(markup)
        .into_iter()
        .filter_map(|t| match t {
            Token::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

/// Names of tag-shaped constructs in `markup` that are not part of the
/// vocabulary.
pub fn foreign_tags(markup: &str) -> Vec<&str> {
    TAG_REGEX
        .captures_iter(markup)
        .filter_map(|caps| caps.get(2))
        .map(|m| m.as_str())
        .filter(|name| AllowedTag::from_name(name).is_none())
        .collect()
}

/// Return `true` if every vocabulary tag in `markup` is closed in order.
pub fn is_balanced(markup: &str) -> bool {
    let mut open: Vec<AllowedTag> = vec![];
    for token in tokenize(markup) {
        match token {
            Token::Open { tag, .. } => open.push(tag),
            Token::Close { tag, .. } => {
                if open.pop() != Some(tag) {
                    return false;
                }
            }
            Token::Text(_) => {}
        }
    }
    open.is_empty()
}

/// Number of characters (not bytes) in `text`; the unit every length
/// limit is expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The tags open at a cursor position, outermost first.  Each entry keeps
/// the raw opening text so that re-opening a link restores its `href`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStack {
    open: Vec<(AllowedTag, String)>,
}

impl TagStack {
    pub fn new() -> TagStack {
        TagStack::default()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn innermost(&self) -> Option<AllowedTag> {
        self.open.last().map(|(tag, _)| *tag)
    }

    /// Whether the cursor sits inside `pre` or `code` content.
    pub fn in_verbatim(&self) -> bool {
        self.innermost().is_some_and(AllowedTag::is_verbatim)
    }

    pub fn tags(&self) -> impl Iterator<Item = AllowedTag> + '_ {
        self.open.iter().map(|(tag, _)| *tag)
    }

    pub fn push(&mut self, tag: AllowedTag, raw_open: &str) {
        self.open.push((tag, raw_open.to_string()));
    }

    /// Pop `tag` if it is the innermost open tag.  A mismatched close is
    /// ignored and reported as `false`.
    pub fn close(&mut self, tag: AllowedTag) -> bool {
        match self.open.last() {
            Some((top, _)) if *top == tag => {
                self.open.pop();
                true
            }
            _ => false,
        }
    }

    /// Feed a token; returns `false` only for a mismatched close.
    pub fn apply(&mut self, token: &Token<'_>) -> bool {
        match token {
            Token::Open { tag, raw } => {
                self.push(*tag, raw);
                true
            }
            Token::Close { tag, .. } => self.close(*tag),
            Token::Text(_) => true,
        }
    }

    /// Text that re-opens every tag, outermost first.
    pub fn reopen(&self) -> String {
        self.open.iter().map(|(_, raw)| raw.as_str()).collect()
    }

    /// Text that closes every tag, innermost first.
    pub fn closing(&self) -> String {
        self.open.iter().rev().map(|(tag, _)| tag.closing()).collect()
    }

    pub fn reopen_len(&self) -> usize {
        self.open.iter().map(|(_, raw)| char_len(raw)).sum()
    }

    pub fn closing_len(&self) -> usize {
        self.open.iter().map(|(tag, _)| tag.name().len() + 3).sum()
    }
}
