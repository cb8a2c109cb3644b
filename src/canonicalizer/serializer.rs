//! Tree-to-markup serialization restricted to the output vocabulary.
//!
//! Allowed elements are written with canonical tags, everything else is
//! unwrapped, and only text outside `<pre>`/`<code>` is whitespace
//! normalized.

use crate::logging::logger::*;
use crate::logging::logging_defs::*;
use crate::parser::{NodeExt, NodeRef};
use crate::utils::{escape_attr, escape_text, is_line_break, BLOCK_ELEMENTS};
use crate::vocabulary::AllowedTag;
use regex::Regex;
use std::sync::LazyLock;

static TRAILING_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());
static LEADING_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]+").unwrap());
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

// Never rendered, whatever the enabled passes.
static SKIPPED_ELEMENTS: [&str; 5] = ["head", "script", "style", "template", "noscript"];

fn normalize_flow(flow: &str) -> String {
    let flow = flow.replace('\r', "");
    let flow = TRAILING_SPACES.replace_all(&flow, "\n");
    let flow = LEADING_SPACES.replace_all(&flow, "\n");
    let flow = EXCESS_NEWLINES.replace_all(&flow, "\n\n");
    let flow = SPACE_RUNS.replace_all(&flow, " ");
    flow.replace(" :", ":")
}

/// Accumulates output, keeping normalizable flow text apart from verbatim
/// segments.
#[derive(Default)]
struct MarkupWriter {
    out: String,
    flow: String,
}

impl MarkupWriter {
    fn text(&mut self, text: &str) {
        self.flow.push_str(escape_text(text).as_str());
    }

    fn raw(&mut self, markup: &str) {
        self.flow.push_str(markup);
    }

    /// Tags go straight to the output so attribute values are never
    /// normalized.  Every normalization pattern lives inside one text run,
    /// so cutting the flow at a tag does not change the result.
    fn tag(&mut self, markup: &str) {
        self.flush();
        self.out.push_str(markup);
    }

    fn verbatim(&mut self, tag: AllowedTag, text: &str) {
        // A newline right after <pre> is eaten by the parser.
        let text = text.trim_start_matches(['\n', '\r']);
        if text.trim().is_empty() {
            return;
        }
        self.flush();
        self.out.push_str(tag.opening().as_str());
        self.out.push_str(escape_text(text).as_str());
        self.out.push_str(tag.closing().as_str());
    }

    fn flush(&mut self) {
        if !self.flow.is_empty() {
            self.out.push_str(normalize_flow(self.flow.as_str()).as_str());
            self.flow.clear();
        }
    }

    fn finish(mut self) -> String {
        self.flush();
        self.out.trim().to_string()
    }
}

fn write_inline(node: &NodeRef, opening: &str, tag: AllowedTag, w: &mut MarkupWriter) {
    if node.text_contents().trim().is_empty() {
        write_children(node, w);
        return;
    }
    w.tag(opening);
    write_children(node, w);
    w.tag(tag.closing().as_str());
}

fn write_element(node: &NodeRef, name: &str, w: &mut MarkupWriter) {
    if SKIPPED_ELEMENTS.contains(&name) {
        return;
    }
    match AllowedTag::from_source_name(name) {
        Some(tag) if tag.is_verbatim() => w.verbatim(tag, node.text_contents().as_str()),
        Some(AllowedTag::Link) => match node.attr_value("href") {
            Some(href) if !href.trim().is_empty() => {
                let opening = format!("<a href=\"{}\">", escape_attr(href.trim()));
                write_inline(node, opening.as_str(), AllowedTag::Link, w);
            }
            _ => write_children(node, w),
        },
        Some(tag) => write_inline(node, tag.opening().as_str(), tag, w),
        None => {
            let block = BLOCK_ELEMENTS.contains(name);
            if block {
                w.raw("\n");
            }
            write_children(node, w);
            if block {
                w.raw("\n");
            }
        }
    }
}

fn write_children(node: &NodeRef, w: &mut MarkupWriter) {
    for child in node.children() {
        if let Some(text) = child.as_text() {
            w.text(text.borrow().as_str());
        } else if is_line_break(&child) {
            w.raw("\n");
        } else if let Some(name) = child.element_name() {
            write_element(&child, name, w);
        } else if child.as_document().is_some() {
            write_children(&child, w);
        }
    }
}

/// Serialize `root` to canonical markup.
pub fn serialize(root: &NodeRef, logger: &PerfLogger) -> String {
    start_span!(logger, SERIALIZE);
    let mut writer = MarkupWriter::default();
    write_children(root, &mut writer);
    let markup = writer.finish();
    end_span!(logger, SERIALIZE);
    markup
}
