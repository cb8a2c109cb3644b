mod passes;
mod serializer;

use crate::logging::create_perf_logger;
use crate::logging::logger::*;
use crate::logging::logging_defs::*;
use crate::models::{CanonicalOptions, Passes};
use crate::parser::parse_html;

/// Runs the tree passes selected in [`CanonicalOptions::passes`] over one
/// source fragment and serializes the result.
pub struct Canonicalizer<'a> {
    pub raw: &'a str,
    pub options: &'a CanonicalOptions,
    listeners: Vec<Listener>,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(raw: &'a str, options: &'a CanonicalOptions) -> Canonicalizer<'a> {
        Canonicalizer {
            raw,
            options,
            listeners: vec![],
        }
    }

    pub fn with_listener(mut self, listener: Listener) -> Canonicalizer<'a> {
        self.listeners.push(listener);
        self
    }

    pub fn canonicalize(self) -> String {
        let logger = create_perf_logger(self.options.debug, &self.listeners);
        let logger = &logger;
        start_span!(logger, CANONICALIZE);
        if self.raw.trim().is_empty() {
            end_span!(logger, CANONICALIZE);
            return String::new();
        }

        let document = parse_html(self.raw);
        let enabled = self.options.passes;
        add_point_to_span_str!(logger, CANONICALIZE, "parsed_fragment");

        if enabled.contains(Passes::REMOVAL) {
            passes::remove_non_content(&document, logger);
        }
        if enabled.contains(Passes::SPOILERS) {
            passes::convert_spoilers(&document, self.options, logger);
        }
        if enabled.contains(Passes::QUOTES) {
            passes::convert_quotes(&document, self.options, logger);
        }
        if enabled.contains(Passes::STYLES) {
            passes::convert_style_spans(&document, logger);
        }
        if enabled.contains(Passes::PREFORMATTED) {
            passes::flatten_preformatted(&document, logger);
        }
        if enabled.contains(Passes::LISTS) {
            passes::convert_lists(&document, logger);
        }
        if enabled.contains(Passes::LINKS) {
            passes::rewrite_links(&document, self.options, logger);
        }
        add_point_to_span_str!(logger, CANONICALIZE, "finished_tree_passes");

        let markup = serializer::serialize(&document, logger);
        annotate_span!(
            logger,
            CANONICALIZE,
            format!("{} -> {} chars", self.raw.len(), markup.len())
        );
        end_span!(logger, CANONICALIZE);
        markup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::foreign_tags;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    fn canon(raw: &str) -> String {
        Canonicalizer::new(raw, &CanonicalOptions::default()).canonicalize()
    }

    fn only_vocabulary_tags(markup: &str) -> bool {
        foreign_tags(markup).is_empty()
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(canon(""), "");
        assert_eq!(canon("   \n "), "");
    }

    #[test]
    fn screenshot_spoiler_is_dropped_entirely() {
        assert_eq!(
            canon("<div class='sp-wrap'><div class='sp-head'>Скриншоты</div><div class='sp-body'>a<br/>b</div></div>"),
            ""
        );
    }

    #[test]
    fn spoiler_collapses_to_labeled_paragraph() {
        assert_eq!(
            canon("intro<div class='sp-wrap'><div class='sp-head'>Details</div><div class='sp-body'>a<br/>b</div></div>outro"),
            "intro\n<b>Details:</b>\na\nb\noutro"
        );
    }

    #[test]
    fn forum_post_is_reduced_to_vocabulary() {
        let raw = concat!(
            r#"<span class="post-b">Жанр</span>: <a href="tracker.php?f=1">Action</a>, RPG<span class="post-br"><br></span>"#,
            r#"<span class="post-color" style="color: blue;"><span class="post-u">Под</span>черк</span><br>"#,
            r#"<var class="postImg" title="https://i.example/1.png">&#10;</var>"#,
            r#"<ul><li>one</li><li>two</li></ul>"#,
            r#"<div class="q-wrap"><div class="q-head">X wrote:</div><div class="q">hi</div></div>"#,
            r#"<pre class="post-pre">a <b>b</b></pre>"#,
            r#"<div class="signature">bye</div>"#,
        );
        let out = canon(raw);
        assert_eq!(
            out,
            concat!(
                "<b>Жанр</b>: <a href=\"https://rutracker.org/forum/tracker.php?f=1\">Action</a>, RPG\n",
                "<u>Под</u>черк\n",
                "\n• one\n• two\n\n",
                "&gt; hi\n",
                "<pre>a b</pre>",
            )
        );
        assert!(only_vocabulary_tags(&out));
    }

    #[test]
    fn disabled_passes_fall_back_to_unwrapping() {
        let options = CanonicalOptions {
            passes: Passes::ALL - Passes::STYLES,
            ..Default::default()
        };
        let out = Canonicalizer::new(r#"<span class="post-b">x</span>"#, &options).canonicalize();
        assert_eq!(out, "x");
    }

    #[test]
    fn canonical_output_is_a_fixed_point() {
        let raws = [
            "<div class='sp-wrap'><div class='sp-head'>A</div><div class='sp-body'>x &amp; y<br>z</div></div>",
            "<ol><li>a<br>b</li><li>c</li></ol>tail",
            r#"<a href="viewtopic.php?t=5">t &lt;5&gt;</a> and <a href="magnet:?xt=urn:btih:F00">m</a>"#,
            "<pre>\n\n  keep   this\n</pre>  after",
            "<b><i>deep <u>nest</u></i></b> :colon",
        ];
        for raw in raws.iter() {
            let once = canon(raw);
            assert_eq!(canon(&once), once, "not a fixed point for {:?}", raw);
            assert!(only_vocabulary_tags(&once), "foreign tag in {:?}", once);
        }
    }

    #[derive(Default)]
    struct Spans {
        started: RefCell<Vec<u64>>,
    }

    impl PerfListener for Spans {
        fn is_interested_in_span(&self, _span_id: u64) -> bool {
            true
        }
        fn on_span_start(&self, span_id: u64, _start_time: Instant) {
            self.started.borrow_mut().push(span_id);
        }
        fn on_check_point(&self, _: u64, _: Instant, _: Duration, _: &str) {}
        fn on_annotate(&self, _span_id: u64, _annotation: &str) {}
        fn on_span_end(&self, _span_id: u64, _span_duration: Duration) {}
        fn on_warning(&self, _span_id: u64, _warning: &crate::models::Warning) {}
    }

    #[test]
    fn passes_run_in_order() {
        let spans = Rc::new(Spans::default());
        let options = CanonicalOptions::default();
        Canonicalizer::new("<b>x</b>", &options)
            .with_listener(Listener::new(spans.clone()))
            .canonicalize();
        if cfg!(debug_assertions) {
            assert_eq!(
                *spans.started.borrow(),
                vec![
                    CANONICALIZE,
                    REMOVAL_PASS,
                    SPOILER_PASS,
                    QUOTE_PASS,
                    STYLE_PASS,
                    PREFORMATTED_PASS,
                    LIST_PASS,
                    LINK_PASS,
                    SERIALIZE
                ]
            );
        }
    }
}
