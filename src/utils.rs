use crate::parser::{NodeExt, NodeRef};

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Elements whose boundaries read as a line break when a subtree is
/// flattened to text.
pub static BLOCK_ELEMENTS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from([
        "blockquote", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ol", "p", "pre", "tr",
        "ul",
    ])
});

pub static UNESCAPE_NAMED_ENTITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:quot|amp|apos|lt|gt|nbsp);").unwrap());
pub static UNESCAPE_NUMERIC_ENTITIES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(?:x([0-9a-fA-F]+)|([0-9]+));").unwrap());

static NORMALIZE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Detach every descendant of `node` that matches the CSS `selector`.
pub fn remove_tags_with_selector(node: &NodeRef, selector: &str) {
    for n in select_descendants(node, selector) {
        n.detach();
    }
}

/// Return all descendants of `node` that match `selector`, excluding `node`
/// itself.  An invalid selector returns an empty `Vec` rather than panicking.
pub fn select_descendants(node: &NodeRef, selector: &str) -> Vec<NodeRef> {
    match node.select(selector) {
        Ok(iter) => iter
            .filter_map(|e| {
                let n = e.as_node();
                if n == node { None } else { Some(n.clone()) }
            })
            .collect(),
        Err(_) => vec![],
    }
}

/// Remove all HTML comment nodes (`<!-- … -->`) from the subtree rooted at
/// `node`.
pub fn remove_comment_nodes(node: &NodeRef) {
    let descendants: Vec<_> = node.descendants().collect();
    for n in descendants {
        if n.as_comment().is_some() {
            n.detach();
        }
    }
}

/// Apply `func(node, selector)` to every descendant of `root_node` that
/// matches any selector in `selectors`.  Each selector's matches are
/// visited in reverse document order, so inner constructs are handled
/// before the ones that contain them and detaching is safe.  Invalid CSS
/// selectors are silently skipped.
///
/// # Examples
///
/// ```rust
/// use std::cell::Cell;
/// use markup_reflow::parser::parse_html;
/// use markup_reflow::shared_utils::apply;
///
/// let doc = parse_html("<div><p>one</p><p>two</p></div>");
/// let count = Cell::new(0usize);
/// apply(&doc, &["p"], |_node, _sel| { count.set(count.get() + 1); });
/// assert_eq!(count.get(), 2);
/// ```
pub fn apply<F>(root_node: &NodeRef, selectors: &[&str], func: F)
where
    F: Fn(&NodeRef, &str),
{
    for s in selectors {
        for n in select_descendants(root_node, s).into_iter().rev() {
            func(&n, s);
        }
    }
}

/// Return `true` for the source dialect's line-break constructs: `<br>`
/// and the forum's `<span class="post-br">`.
pub fn is_line_break(node: &NodeRef) -> bool {
    match node.element_name() {
        Some("br") => true,
        Some("span") => node.has_class("post-br"),
        _ => false,
    }
}

/// Flatten `node` to text, turning line-break constructs and block
/// boundaries into `\n`, trimming every line and dropping blank ones.
pub fn text_lines(node: &NodeRef) -> Vec<String> {
    let mut raw = String::new();
    collect_text(node, &mut raw);
    raw.split('\n')
        .map(|line| normalize_text(line.trim()))
        .filter(|line| !line.is_empty())
        .collect()
}

fn collect_text(node: &NodeRef, out: &mut String) {
    for child in node.children() {
        if let Some(text) = child.as_text() {
            out.push_str(text.borrow().as_str());
        } else if is_line_break(&child) {
            out.push('\n');
        } else if let Some(name) = child.element_name() {
            let block = BLOCK_ELEMENTS.contains(name);
            if block {
                out.push('\n');
            }
            collect_text(&child, out);
            if block {
                out.push('\n');
            }
        }
    }
}

/// [`text_lines`] joined with `\n`.
pub fn text_with_breaks(node: &NodeRef) -> String {
    text_lines(node).join("\n")
}

/// Collapse every run of two or more whitespace characters in `src` into a
/// single ASCII space.
pub fn normalize_text(src: &str) -> String {
    NORMALIZE_REGEX.replace_all(src, " ").to_string()
}

/// Escape the characters that are significant in markup text content.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Decode the named HTML entities (`&quot;` `&amp;` `&apos;` `&lt;` `&gt;`
/// `&nbsp;`) and all numeric character references (`&#…;` / `&#x…;`) in
/// `value`.  Invalid code points are replaced with U+FFFD.
pub fn unescape_html_entities(value: &str) -> String {
    if value.is_empty() {
        return value.to_string();
    }

    let replaced = UNESCAPE_NAMED_ENTITIES.replace_all(value, |caps: &regex::Captures| {
        match caps.get(0).map(|m| m.as_str()).unwrap_or_default() {
            "&quot;" => "\"",
            "&amp;" => "&",
            "&apos;" => "'",
            "&lt;" => "<",
            "&gt;" => ">",
            "&nbsp;" => "\u{a0}",
            _ => "",
        }
    });

    let replaced = UNESCAPE_NUMERIC_ENTITIES.replace_all(&replaced, |caps: &regex::Captures| {
        let num = if let Some(hex) = caps.get(1) {
            u32::from_str_radix(hex.as_str(), 16).unwrap_or(0)
        } else if let Some(dec) = caps.get(2) {
            dec.as_str().parse::<u32>().unwrap_or(0)
        } else {
            0
        };

        let num = if num == 0 || num > 0x10FFFF || (0xD800..=0xDFFF).contains(&num) {
            0xFFFD
        } else {
            num
        };
        std::char::from_u32(num).unwrap_or('\u{FFFD}').to_string()
    });

    replaced.into_owned()
}

/// Resolve `href` against `base_uri` when it starts with one of the
/// `prefixes` (site-internal routes written as relative paths).  Anything
/// else, including an unparsable base, is returned unchanged.
pub fn resolve_internal_route(href: &str, base_uri: &str, prefixes: &[String]) -> String {
    let href = href.trim();
    if !prefixes.iter().any(|p| href.starts_with(p.as_str())) {
        return href.to_string();
    }
    if let Ok(base) = url::Url::parse(base_uri) {
        if let Ok(absolute) = base.join(href) {
            return absolute.into();
        }
    }
    href.to_string()
}
