use crate::logging::logger::*;
use crate::logging::logging_defs::*;
use crate::models::{CanonicalOptions, SpoilerStyle};
use crate::parser::{new_element_with_text, NodeExt, NodeRef};
use crate::utils::*;
use std::cell::Cell;

// Subtrees that carry no text worth keeping.
pub static REMOVED_ELEMENTS: [&str; 8] = [
    "script", "style", "iframe", "object", "embed", "var", "img", "hr",
];

// Attachment blocks, signatures and the "X wrote:" header of quotes.
pub static REMOVED_CLASSES: [&str; 4] = [".attach_wrap", ".attach_fu", ".signature", ".q-head"];

pub static STYLE_CLASS_TAGS: [(&str, &str); 4] = [
    ("span.post-u", "u"),
    ("span.post-i", "i"),
    ("span.post-b", "b"),
    ("span.post-strike", "s"),
];

pub static PRESENTATION_SPANS: [&str; 3] = ["span.post-color", "span.post-size", "span[style]"];

fn bold(text: &str) -> NodeRef {
    new_element_with_text("b", text)
}

pub fn remove_non_content(doc: &NodeRef, logger: &PerfLogger) {
    start_span!(logger, REMOVAL_PASS);
    remove_comment_nodes(doc);
    for selector in REMOVED_ELEMENTS.iter().chain(REMOVED_CLASSES.iter()) {
        remove_tags_with_selector(doc, selector);
    }
    end_span!(logger, REMOVAL_PASS);
}

fn spoiler_title(wrap: &NodeRef, default_title: &str) -> String {
    let head = match wrap.select_first("div.sp-head") {
        Ok(head) => head.as_node().clone(),
        Err(_) => return default_title.to_string(),
    };
    remove_tags_with_selector(&head, "span.plusmn");
    let title = head.text_contents().replace(':', "");
    let title = normalize_text(title.trim());
    if title.is_empty() {
        default_title.to_string()
    } else {
        title
    }
}

fn is_skipped_title(title: &str, options: &CanonicalOptions) -> bool {
    let lowered = title.to_lowercase();
    options
        .skip_spoiler_titles
        .iter()
        .any(|skip| skip.to_lowercase() == lowered)
}

fn spoiler_replacement(title: &str, body: &str, style: SpoilerStyle) -> Vec<NodeRef> {
    let label = bold(format!("{}:", title).as_str());
    match style {
        SpoilerStyle::Paragraph => vec![
            NodeRef::new_text("\n"),
            label,
            NodeRef::new_text(format!("\n{}\n", body)),
        ],
        SpoilerStyle::Inline => {
            let mut nodes = vec![NodeRef::new_text("\n"), label, NodeRef::new_text("\n")];
            if !body.is_empty() {
                nodes.push(new_element_with_text("tg-spoiler", body));
            }
            nodes.push(NodeRef::new_text("\n"));
            nodes
        }
    }
}

/// Collapse every `div.sp-wrap` into a bold label and its body text.
pub fn convert_spoilers(doc: &NodeRef, options: &CanonicalOptions, logger: &PerfLogger) {
    start_span!(logger, SPOILER_PASS);
    let skipped = Cell::new(0usize);
    apply(doc, &["div.sp-wrap"], |wrap, _| {
        let title = spoiler_title(wrap, options.default_spoiler_title.as_str());
        if is_skipped_title(title.as_str(), options) {
            wrap.detach();
            skipped.set(skipped.get() + 1);
            return;
        }
        let body = wrap
            .select_first("div.sp-body")
            .map(|body| text_with_breaks(body.as_node()))
            .unwrap_or_default();
        wrap.replace_with(spoiler_replacement(
            title.as_str(),
            body.as_str(),
            options.spoiler_style,
        ));
    });
    d!({
        annotate_span!(
            logger,
            SPOILER_PASS,
            format!("skipped {} spoiler boxes", skipped.get())
        );
    });
    end_span!(logger, SPOILER_PASS);
}

/// Replace every `div.q-wrap` with its body text, each line prefixed
/// with `> `.
pub fn convert_quotes(doc: &NodeRef, options: &CanonicalOptions, logger: &PerfLogger) {
    start_span!(logger, QUOTE_PASS);
    apply(doc, &["div.q-wrap"], |wrap, _| {
        let lines = wrap
            .select_first("div.q")
            .map(|body| text_lines(body.as_node()))
            .unwrap_or_default();
        let body = if lines.is_empty() {
            format!("> {}", options.default_quote_text)
        } else {
            lines
                .iter()
                .map(|line| format!("> {}", line))
                .collect::<Vec<_>>()
                .join("\n")
        };
        wrap.replace_with(vec![NodeRef::new_text(format!("\n{}\n", body))]);
    });
    end_span!(logger, QUOTE_PASS);
}

pub fn convert_style_spans(doc: &NodeRef, logger: &PerfLogger) {
    start_span!(logger, STYLE_PASS);
    for (selector, tag) in STYLE_CLASS_TAGS.iter() {
        apply(doc, &[*selector], |span, _| {
            span.rename_element(tag);
        });
    }
    add_point_to_span_str!(logger, STYLE_PASS, "renamed_style_class_spans");
    apply(doc, &PRESENTATION_SPANS, |span, _| span.unwrap_element());
    end_span!(logger, STYLE_PASS);
}

/// Flatten every `pre` to a single text child so nothing nested inside it
/// is interpreted later.
pub fn flatten_preformatted(doc: &NodeRef, logger: &PerfLogger) {
    start_span!(logger, PREFORMATTED_PASS);
    apply(doc, &["pre"], |pre, _| {
        let text = pre.text_contents();
        pre.replace_with(vec![new_element_with_text("pre", text.as_str())]);
    });
    end_span!(logger, PREFORMATTED_PASS);
}

fn list_block(list: &NodeRef) -> String {
    let ordered = list.element_name() == Some("ol");
    let mut items: Vec<String> = vec![];
    for item in list.element_children() {
        if item.element_name() != Some("li") {
            continue;
        }
        let lines = text_lines(&item);
        if lines.is_empty() {
            continue;
        }
        let prefix = if ordered {
            format!("{}. ", items.len() + 1)
        } else {
            String::from("• ")
        };
        // No-break spaces survive the space collapsing of the serializer.
        let indent = "\u{a0}".repeat(prefix.chars().count());
        items.push(format!(
            "{}{}",
            prefix,
            lines.join(format!("\n{}", indent).as_str())
        ));
    }
    items.join("\n")
}

pub fn convert_lists(doc: &NodeRef, logger: &PerfLogger) {
    start_span!(logger, LIST_PASS);
    apply(doc, &["ul, ol"], |list, _| {
        let block = list_block(list);
        if block.is_empty() {
            list.detach();
        } else {
            list.replace_with(vec![NodeRef::new_text(format!("\n{}\n", block))]);
        }
    });
    end_span!(logger, LIST_PASS);
}

fn rewrite_link(link: &NodeRef, options: &CanonicalOptions) {
    let href = match link.attr_value("href") {
        Some(href) if !href.trim().is_empty() => href.trim().to_string(),
        _ => {
            link.unwrap_element();
            return;
        }
    };
    let text = text_lines(link).join(" ");
    let scheme = href.to_ascii_lowercase();

    if scheme.starts_with("magnet:") {
        let visible = if text.is_empty() { href.clone() } else { text };
        link.replace_with(vec![new_element_with_text("code", visible.as_str())]);
        return;
    }
    if text.is_empty() || scheme.starts_with("javascript:") {
        link.unwrap_element();
        return;
    }

    let href = resolve_internal_route(
        href.as_str(),
        options.site_base_url.as_str(),
        &options.internal_route_prefixes,
    );
    let rewritten = new_element_with_text("a", text.as_str());
    if let Some(e) = rewritten.as_element() {
        e.attributes.borrow_mut().insert("href", href);
    }
    link.replace_with(vec![rewritten]);
}

pub fn rewrite_links(doc: &NodeRef, options: &CanonicalOptions, logger: &PerfLogger) {
    start_span!(logger, LINK_PASS);
    apply(doc, &["a"], |link, _| rewrite_link(link, options));
    end_span!(logger, LINK_PASS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;

    fn logger() -> PerfLogger {
        PerfLogger::new(vec![])
    }

    fn body_of(doc: &NodeRef) -> NodeRef {
        doc.select_first("body").unwrap().as_node().clone()
    }

    #[test]
    fn removal_drops_images_and_signatures() {
        let doc = parse_html(
            r#"<div>keep<img src="x.png"><hr><div class="signature">sig</div><!-- c --><script>x()</script></div>"#,
        );
        remove_non_content(&doc, &logger());
        assert_eq!(body_of(&doc).inner_html(), "<div>keep</div>");
    }

    #[test]
    fn spoiler_title_drops_plusmn_and_colons() {
        let doc = parse_html(
            r#"<div class="sp-wrap"><div class="sp-head"><span class="plusmn">+</span>Системные требования:</div><div class="sp-body">ОС: Windows<br>RAM: 8 GB</div></div>"#,
        );
        convert_spoilers(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(
            body_of(&doc).inner_html(),
            "\n<b>Системные требования:</b>\nОС: Windows\nRAM: 8 GB\n"
        );
    }

    #[test]
    fn spoiler_without_head_gets_default_title() {
        let doc = parse_html(r#"<div class="sp-wrap"><div class="sp-body">text</div></div>"#);
        convert_spoilers(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(body_of(&doc).inner_html(), "\n<b>Spoiler:</b>\ntext\n");
    }

    #[test]
    fn screenshot_spoilers_are_dropped() {
        let doc = parse_html(
            r#"<p>a</p><div class="sp-wrap"><div class="sp-head">СКРИНШОТЫ</div><div class="sp-body">x</div></div>"#,
        );
        convert_spoilers(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(body_of(&doc).inner_html(), "<p>a</p>");
    }

    #[test]
    fn inline_spoiler_style_uses_native_tag() {
        let doc = parse_html(
            r#"<div class="sp-wrap"><div class="sp-head">Plot</div><div class="sp-body">twist</div></div>"#,
        );
        let options = CanonicalOptions {
            spoiler_style: SpoilerStyle::Inline,
            ..Default::default()
        };
        convert_spoilers(&doc, &options, &logger());
        assert_eq!(
            body_of(&doc).inner_html(),
            "\n<b>Plot:</b>\n<tg-spoiler>twist</tg-spoiler>\n"
        );
    }

    #[test]
    fn quotes_are_prefixed_per_line() {
        let doc = parse_html(
            r#"<div class="q-wrap"><div class="q-head">Someone wrote:</div><div class="q">one<br>two</div></div>"#,
        );
        remove_non_content(&doc, &logger());
        convert_quotes(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(body_of(&doc).text_contents(), "\n> one\n> two\n");
    }

    #[test]
    fn quote_without_body_uses_default_text() {
        let doc = parse_html(r#"<div class="q-wrap"></div>"#);
        convert_quotes(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(body_of(&doc).text_contents(), "\n> Quoted Text\n");
    }

    #[test]
    fn style_spans_map_to_vocabulary() {
        let doc = parse_html(
            r#"<span class="post-b"><span class="post-color" style="color: red">red</span> <span class="post-i">it</span></span>"#,
        );
        convert_style_spans(&doc, &logger());
        assert_eq!(body_of(&doc).inner_html(), "<b>red <i>it</i></b>");
    }

    #[test]
    fn preformatted_content_is_flattened() {
        let doc = parse_html(r#"<pre class="post-pre">a <span class="post-b">b</span></pre>"#);
        flatten_preformatted(&doc, &logger());
        assert_eq!(body_of(&doc).inner_html(), "<pre>a b</pre>");
    }

    #[test]
    fn lists_get_prefixes_and_aligned_continuations() {
        let doc = parse_html("<ol><li>one<br>more</li><li></li><li>two</li></ol><ul><li>x</li></ul>");
        convert_lists(&doc, &logger());
        assert_eq!(
            body_of(&doc).text_contents(),
            "\n1. one\n\u{a0}\u{a0}\u{a0}more\n2. two\n\n• x\n"
        );
    }

    #[test]
    fn nested_lists_are_flattened_inside_out() {
        let doc = parse_html("<ul><li>outer<ul><li>inner</li></ul></li></ul>");
        convert_lists(&doc, &logger());
        assert_eq!(
            body_of(&doc).text_contents(),
            "\n• outer\n\u{a0}\u{a0}• inner\n"
        );
    }

    #[test]
    fn links_are_resolved_and_magnets_become_code() {
        let doc = parse_html(
            r#"<a href="viewtopic.php?t=1"><b>Topic</b></a> <a href="magnet:?xt=urn:btih:ABC"></a> <a href="https://e.com"> </a> <a name="x">anchor</a>"#,
        );
        rewrite_links(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(
            body_of(&doc).inner_html(),
            r#"<a href="https://rutracker.org/forum/viewtopic.php?t=1">Topic</a> <code>magnet:?xt=urn:btih:ABC</code>   anchor"#
        );
    }

    #[test]
    fn javascript_links_are_unwrapped() {
        let doc = parse_html(r#"<a href="javascript:void(0)">click</a>"#);
        rewrite_links(&doc, &CanonicalOptions::default(), &logger());
        assert_eq!(body_of(&doc).inner_html(), "click");
    }
}
