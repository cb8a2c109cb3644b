//! Rewrites bold-labeled fields such as `<b>Жанр</b>: Action, RPG` into
//! hashtag lists, working on canonical markup only.

use crate::utils::{escape_text, unescape_html_entities};
use crate::vocabulary::{href_of, strip_tags, tokenize, AllowedTag, TagStack, Token};
use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W+").unwrap());

/// Visible text of the link kept next to a hashtag.
pub const LINK_CAPTION: &str = "more…";

fn label_pattern(label: &str) -> Option<Regex> {
    // The colon may sit inside or right after the bold label.
    let pattern = format!(
        r"(?i)<b>\s*{}\s*(?::\s*</b>|</b>\s*:)",
        regex::escape(label.trim())
    );
    Regex::new(pattern.as_str()).ok()
}

/// Indexes of the opening tags in `tokens` that are closed again within
/// `tokens`.
fn closed_openings(tokens: &[Token<'_>]) -> Vec<bool> {
    let mut closed = vec![false; tokens.len()];
    let mut open: Vec<(AllowedTag, usize)> = vec![];
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            Token::Open { tag, .. } => open.push((tag, i)),
            Token::Close { tag, .. } => {
                if let Some(&(top, at)) = open.last() {
                    if top == tag {
                        closed[at] = true;
                        open.pop();
                    }
                }
            }
            Token::Text(_) => {}
        }
    }
    closed
}

/// Split a field value on commas that are not inside a tag pair.  A tag
/// still open where the value ends does not hide the commas after it.
fn split_items(value: &str) -> Vec<String> {
    let tokens = tokenize(value);
    let closed = closed_openings(&tokens);
    let mut items = vec![String::new()];
    let mut depth = 0usize;
    let mut masking: Vec<bool> = vec![];
    for (i, token) in tokens.iter().enumerate() {
        match *token {
            Token::Open { raw, .. } => {
                masking.push(closed[i]);
                if closed[i] {
                    depth += 1;
                }
                push_to_last(&mut items, raw);
            }
            Token::Close { raw, .. } => {
                if masking.pop() == Some(true) {
                    depth -= 1;
                }
                push_to_last(&mut items, raw);
            }
            Token::Text(text) => {
                for (n, part) in text.split(',').enumerate() {
                    if n > 0 {
                        if depth == 0 {
                            items.push(String::new());
                        } else {
                            push_to_last(&mut items, ",");
                        }
                    }
                    push_to_last(&mut items, part);
                }
            }
        }
    }
    items
}

/// Markup to put after the rewritten items so the rest of the line keeps
/// its tags: closings of tags opened before the value, then the openings
/// of tags the value leaves open.  `None` if the value closes a tag out of
/// order.
fn value_boundary(value: &str) -> Option<String> {
    let mut stack = TagStack::new();
    let mut boundary = String::new();
    for token in tokenize(value) {
        if let Token::Close { raw, .. } = token {
            if stack.is_empty() {
                boundary.push_str(raw);
                continue;
            }
        }
        if !stack.apply(&token) {
            return None;
        }
    }
    boundary.push_str(stack.reopen().as_str());
    Some(boundary)
}

fn push_to_last(items: &mut [String], text: &str) {
    if let Some(last) = items.last_mut() {
        last.push_str(text);
    }
}

fn item_link(item: &str) -> Option<String> {
    tokenize(item).into_iter().find_map(|token| match token {
        Token::Open {
            tag: AllowedTag::Link,
            raw,
        } => href_of(raw).map(|href| href.to_string()),
        _ => None,
    })
}

fn format_item(item: &str) -> Option<String> {
    let visible = unescape_html_entities(strip_tags(item).as_str());
    let token = NON_WORD.replace_all(visible.trim(), "");
    if token.is_empty() {
        return None;
    }
    Some(match item_link(item) {
        Some(href) => format!(
            " #{} (<a href=\"{}\">{}</a>)",
            token,
            href,
            escape_text(LINK_CAPTION)
        ),
        None => format!(" #{}", token),
    })
}

/// Rewrite the first `<b>{label}</b>:` field of `markup` into hashtags.
///
/// The value runs to the end of the line.  Each comma-separated item
/// becomes ` #{token}`, where the token is the item's visible text with
/// non-word characters removed; an item that contains a link keeps it as
/// ` #{token} (<a href="...">more…</a>)`.  Tags the value leaves open
/// are re-opened after the items, so balanced markup stays balanced.  A
/// missing label, an empty label, an empty value or a value that closes
/// tags out of order leaves `markup` unchanged.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::tag_keyword_field;
///
/// let tagged = tag_keyword_field("<b>Жанр</b>: Action, RPG", "Жанр");
/// assert_eq!(tagged, "<b>Жанр</b>: #Action, #RPG");
/// ```
pub fn tag_keyword_field(markup: &str, label: &str) -> String {
    if label.trim().is_empty() {
        return markup.to_string();
    }
    let found = match label_pattern(label).and_then(|re| re.find(markup)) {
        Some(found) => found,
        None => return markup.to_string(),
    };
    let value_start = found.end();
    let value_end = markup[value_start..]
        .find('\n')
        .map(|i| value_start + i)
        .unwrap_or(markup.len());
    let value = &markup[value_start..value_end];
    let boundary = match value_boundary(value) {
        Some(boundary) => boundary,
        None => return markup.to_string(),
    };

    let formatted: Vec<String> = split_items(value)
        .iter()
        .filter_map(|item| format_item(item))
        .collect();
    if formatted.is_empty() {
        return markup.to_string();
    }

    let mut tagged = String::with_capacity(markup.len() + formatted.len() * 2);
    tagged.push_str(&markup[..value_start]);
    tagged.push_str(formatted.join(",").as_str());
    tagged.push_str(boundary.as_str());
    tagged.push_str(&markup[value_end..]);
    tagged
}

/// Apply [`tag_keyword_field`] for every label, in order.
pub fn tag_keyword_fields<S: AsRef<str>>(markup: &str, labels: &[S]) -> String {
    labels
        .iter()
        .fold(markup.to_string(), |acc, label| {
            tag_keyword_field(acc.as_str(), label.as_ref())
        })
}
