//! Pulls a postable [`Topic`] out of a tracker topic page.

use crate::canonicalizer::Canonicalizer;
use crate::keywords::tag_keyword_fields;
use crate::logging::create_perf_logger;
use crate::logging::logger::*;
use crate::logging::logging_defs::*;
use crate::models::{Topic, TopicOptions};
use crate::parser::{parse_html, NodeExt, NodeRef};
use crate::utils::{is_line_break, normalize_text, select_descendants};
use regex::Regex;
use std::sync::LazyLock;

static MAGNET_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"magnet:\?xt=urn:btih:[a-zA-Z0-9]+").unwrap());

pub static UNKNOWN_TITLE: &str = "Unknown Title";
static SITE_SUFFIX: &str = "- Rutracker.org";

fn display_title(doc: &NodeRef, options: &TopicOptions) -> String {
    let title = if let Ok(title) = doc.select_first("title") {
        let text = title.as_node().text_contents();
        match text.split_once("::") {
            Some((head, _)) => head.trim().to_string(),
            None => text.replace(SITE_SUFFIX, "").trim().to_string(),
        }
    } else if let Ok(header) = doc.select_first("h1#topic-title") {
        header.as_node().text_contents().trim().to_string()
    } else {
        UNKNOWN_TITLE.to_string()
    };
    let title = options
        .title_noise
        .iter()
        .fold(title, |acc, noise| acc.replace(noise.as_str(), ""));
    normalize_text(title.trim())
}

fn magnet_link(doc: &NodeRef) -> Option<String> {
    let hash_of = |node: &NodeRef| {
        node.attr_value("href")
            .and_then(|href| MAGNET_HASH.find(href.as_str()).map(|m| m.as_str().to_string()))
    };
    select_descendants(doc, "a.magnet-link")
        .iter()
        .find_map(hash_of)
        .or_else(|| {
            select_descendants(doc, "a[href*='magnet:?xt=']")
                .iter()
                .find_map(hash_of)
        })
}

fn image_url(post: &NodeRef) -> Option<String> {
    let aligned = select_descendants(post, "img.postImgAligned, img.img-right")
        .iter()
        .find_map(|img| img.attr_value("src"));
    aligned.or_else(|| {
        select_descendants(post, "var.postImg[title]")
            .first()
            .and_then(|var| var.attr_value("title"))
    })
}

fn is_aligned_image(node: &NodeRef) -> bool {
    node.element_name() == Some("img") && node.has_class("postImgAligned")
}

fn has_direct_text(node: &NodeRef) -> bool {
    node.children().any(|c| {
        c.as_text()
            .map(|t| !t.borrow().trim().is_empty())
            .unwrap_or(false)
    })
}

/// Whether `node`, a direct child of the post body, opens the description.
fn starts_description(node: &NodeRef, options: &TopicOptions) -> bool {
    let is_start_keyword = |node: &NodeRef| {
        let text = node.text_contents().replace(':', "");
        options
            .description_start_keywords
            .contains(text.trim())
    };
    match node.element_name() {
        Some("hr") | Some("ol") | Some("ul") => true,
        Some("div") => node.has_class("sp-wrap") || node.has_class("q-wrap"),
        Some("b") => is_start_keyword(node),
        Some("span") if node.has_class("post-b") && is_start_keyword(node) => true,
        Some("span") => {
            !has_direct_text(node) && node.descendants().any(|d| is_line_break(&d))
        }
        Some("img") => is_aligned_image(node),
        _ => false,
    }
}

/// The post's heading nodes and the serialized markup of everything after.
fn split_post(post: &NodeRef, options: &TopicOptions) -> (Vec<NodeRef>, String) {
    let mut heading = vec![];
    let mut description = String::new();
    let mut collecting_heading = true;
    for child in post.children() {
        if collecting_heading && starts_description(&child, options) {
            collecting_heading = false;
        }
        if collecting_heading {
            if !is_aligned_image(&child) {
                heading.push(child);
            }
        } else {
            description.push_str(child.to_string().as_str());
        }
    }
    (heading, description)
}

fn search_title(heading: &[NodeRef], display_title: &str) -> String {
    let text = heading
        .iter()
        .filter(|node| !is_line_break(node))
        .map(|node| node.text_contents())
        .collect::<Vec<_>>()
        .join(" ");
    let text = normalize_text(text.trim());
    if text.chars().count() < 3 {
        display_title.to_string()
    } else {
        text
    }
}

fn is_updated(feed_title: &str, options: &TopicOptions) -> bool {
    options
        .updated_markers
        .iter()
        .any(|marker| feed_title.contains(marker.as_str()))
}

/// Extract the display title, search query, cover, magnet link and
/// canonical description from a topic page.
///
/// Returns `None` when the page has no `div.post_body` or no magnet link.
pub fn extract_topic(page_html: &str, feed_title: &str, options: &TopicOptions) -> Option<Topic> {
    let logger = create_perf_logger(options.canonical.debug, &[]);
    let logger = &logger;
    start_span!(logger, EXTRACT_TOPIC);
    let document = parse_html(page_html);
    let topic = topic_from_document(&document, feed_title, options, logger);
    end_span!(logger, EXTRACT_TOPIC);
    topic
}

fn topic_from_document(
    document: &NodeRef,
    feed_title: &str,
    options: &TopicOptions,
    logger: &PerfLogger,
) -> Option<Topic> {
    let display_title = display_title(document, options);
    let post = document.select_first("div.post_body").ok()?.as_node().clone();
    let magnet_link = magnet_link(document)?;
    add_point_to_span_str!(logger, EXTRACT_TOPIC, "found_post_and_magnet");

    let image_url = image_url(&post);
    let (heading, description_html) = split_post(&post, options);
    let search_title = search_title(&heading, display_title.as_str());
    add_point_to_span_str!(logger, EXTRACT_TOPIC, "split_post_body");

    let description = Canonicalizer::new(description_html.as_str(), &options.canonical).canonicalize();
    let description = tag_keyword_fields(description.as_str(), &options.keyword_labels);

    Some(Topic {
        display_title,
        search_title,
        image_url,
        magnet_link,
        description,
        is_updated: is_updated(feed_title, options),
    })
}
