//! Sanitizes forum-post HTML into a small fixed vocabulary of inline tags
//! and splits the result into length-bounded, tag-balanced chunks for a
//! rich-text messaging channel.
//!
//! ## Quick start
//!
//! ```rust
//! use markup_reflow::{canonicalize, split, tag_keyword_field};
//!
//! let raw = r#"<span class="post-b">Жанр</span>: Action, RPG<br><span class="post-color">Text</span>"#;
//! let markup = tag_keyword_field(&canonicalize(raw), "Жанр");
//! assert_eq!(markup, "<b>Жанр</b>: #Action, #RPG\nText");
//!
//! let chunks = split(&markup, 4096);
//! assert_eq!(chunks.len(), 1);
//! ```
//!
//! ## Module layout
//!
//! * **Top level** – [`canonicalize`], [`tag_keyword_field`] and [`split`]
//!   form the pipeline; [`extract_topic`], [`compose_message`] and
//!   [`plan_delivery`] sit around it for whole topic pages.
//! * [`vocabulary`] – the allowed tags, a tokenizer and the tag stack the
//!   splitter carries across chunk boundaries.
//! * [`parser`] – thin wrappers around the underlying HTML parser
//!   ([`parser::NodeRef`], [`parser::parse_html`]).
//! * [`shared_utils`] – DOM and text helpers useful for post-processing.
//! * [`logging`] – span and warning listeners.

macro_rules! d {
    ($code:block) => {
        if cfg!(debug_assertions) {
            $code
        }
    };
}

#[macro_use]
pub mod logging;

mod canonicalizer;
mod delivery;
mod keywords;
mod models;
mod node_utils;
mod reflow;
mod topic;
mod utils;
pub mod vocabulary;

pub use canonicalizer::Canonicalizer;
pub use delivery::{compose_message, plan_delivery};
pub use keywords::{tag_keyword_field, tag_keyword_fields, LINK_CAPTION};
pub use logging::logger::{Listener, PerfListener};
pub use models::{
    CanonicalOptions, Ceilings, DeliveryPlan, Passes, SpoilerStyle, Topic, TopicOptions, Warning,
};
pub use node_utils::{new_html_element, NodeExt};
pub use reflow::{split, Chunk, Splitter};
pub use topic::extract_topic;

/// Convenience re-exports of DOM and text helpers.
pub mod shared_utils {
    pub use crate::utils::{
        apply, escape_attr, escape_text, normalize_text, resolve_internal_route, text_lines,
        unescape_html_entities,
    };
}

/// Thin wrappers around the underlying HTML parser.
///
/// [`NodeRef`] is the reference-counted DOM node type used throughout the crate.
/// [`parse_html`] parses a complete HTML document into a [`NodeRef`] tree.
pub mod parser {
    use kuchikikiki::traits::TendrilSink;
    pub use kuchikikiki::NodeRef;
    pub use crate::node_utils::{new_element_with_text, new_html_element, NodeExt};

    /// Parse an HTML string into a [`NodeRef`] document tree.
    ///
    /// Fragments are accepted; an implicit `<html>`, `<head>` and `<body>`
    /// are synthesised around them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use markup_reflow::parser::parse_html;
    ///
    /// let doc = parse_html("<div><p>hello</p></div>");
    /// assert!(doc.select_first("p").is_ok());
    /// ```
    pub fn parse_html(html: &str) -> NodeRef {
        kuchikikiki::parse_html().one(html)
    }
}

/// Canonicalize a source fragment with [`CanonicalOptions::default`].
///
/// The output uses only the tags in [`vocabulary::AllowedTag`], escapes
/// all text, and is a fixed point: canonicalizing it again returns it
/// unchanged.  Empty input yields an empty string.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::canonicalize;
///
/// let raw = "<div class='sp-wrap'><div class='sp-head'>Скриншоты</div><div class='sp-body'>a<br/>b</div></div>";
/// assert_eq!(canonicalize(raw), "");
/// ```
pub fn canonicalize(raw: &str) -> String {
    canonicalize_with(raw, &CanonicalOptions::default())
}

/// [`canonicalize`] with explicit options.
pub fn canonicalize_with(raw: &str, options: &CanonicalOptions) -> String {
    Canonicalizer::new(raw, options).canonicalize()
}
