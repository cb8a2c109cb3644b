use bitflags::bitflags;
use std::collections::HashSet;
use std::fmt;

bitflags! {
    /// The tree-level passes run by [`crate::canonicalize_with`].  Passes
    /// always run in declaration order; clearing a flag skips that pass and
    /// leaves the affected constructs to the final serializer, which
    /// unwraps anything outside the output vocabulary.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Passes: u32 {
        const REMOVAL      = 1 << 0;
        const SPOILERS     = 1 << 1;
        const QUOTES       = 1 << 2;
        const STYLES       = 1 << 3;
        const PREFORMATTED = 1 << 4;
        const LISTS        = 1 << 5;
        const LINKS        = 1 << 6;
        const ALL = Self::REMOVAL.bits()
            | Self::SPOILERS.bits()
            | Self::QUOTES.bits()
            | Self::STYLES.bits()
            | Self::PREFORMATTED.bits()
            | Self::LISTS.bits()
            | Self::LINKS.bits();
    }
}

/// How a collapsible spoiler box is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpoilerStyle {
    /// `\n<b>{title}:</b>\n{body}\n`, a labeled paragraph.
    #[default]
    Paragraph,
    /// The bold label followed by the body inside `<tg-spoiler>`, for
    /// channels that understand the native click-to-reveal tag.
    Inline,
}

/// Knobs that control the canonicalizer.
///
/// All fields have sensible defaults via [`Default`]; start there and only
/// override what you need.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::{CanonicalOptions, Passes, SpoilerStyle};
///
/// let mut opts = CanonicalOptions::default();
/// opts.spoiler_style = SpoilerStyle::Inline;
/// opts.passes.remove(Passes::LISTS);
/// ```
#[derive(Debug, Clone)]
pub struct CanonicalOptions {
    /// Print span events and warnings to the console.
    pub debug: bool,
    /// Which passes to run.
    pub passes: Passes,
    pub spoiler_style: SpoilerStyle,
    /// Label used when a spoiler box has no (non-empty) title.
    pub default_spoiler_title: String,
    /// Spoiler boxes whose title case-insensitively equals one of these are
    /// dropped entirely (screenshot galleries carry no text).
    pub skip_spoiler_titles: HashSet<String>,
    /// Body used for a quote box that has no body element.
    pub default_quote_text: String,
    /// Absolute base that site-internal relative links are resolved against.
    pub site_base_url: String,
    /// Relative href prefixes that are known site routes.
    pub internal_route_prefixes: Vec<String>,
}

impl Default for CanonicalOptions {
    fn default() -> CanonicalOptions {
        CanonicalOptions {
            debug: false,
            passes: Passes::ALL,
            spoiler_style: SpoilerStyle::Paragraph,
            default_spoiler_title: String::from("Spoiler"),
            skip_spoiler_titles: HashSet::from([
                String::from("скриншоты"),
                String::from("screenshots"),
            ]),
            default_quote_text: String::from("Quoted Text"),
            site_base_url: String::from("https://rutracker.org/forum/"),
            internal_route_prefixes: vec![
                String::from("viewtopic.php"),
                String::from("tracker.php"),
            ],
        }
    }
}

/// Soft conditions reported through
/// [`PerfListener::on_warning`][crate::PerfListener::on_warning].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A single line did not fit into an empty chunk and was cut at a
    /// character boundary.
    LineOverflow {
        /// Index of the first chunk the line was cut into.
        chunk_index: usize,
        /// Zero-based line number in the split input.
        line_index: usize,
        /// Length of the line in characters.
        line_len: usize,
        /// Room a fresh chunk had for it (`max_len` minus re-open prefix).
        available: usize,
        /// The open tags alone left no room for text, so the cut pieces
        /// were emitted without them.
        tags_dropped: bool,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::LineOverflow {
                chunk_index,
                line_index,
                line_len,
                available,
                tags_dropped,
            } => {
                write!(
                    f,
                    "line {} ({} chars) exceeds the {} chars available, force-split from chunk {}",
                    line_index, line_len, available, chunk_index
                )?;
                if *tags_dropped {
                    write!(f, " without its tags")?;
                }
                Ok(())
            }
        }
    }
}

/// Knobs for [`crate::extract_topic`].
#[derive(Debug, Clone)]
pub struct TopicOptions {
    pub canonical: CanonicalOptions,
    /// Bold-labeled fields whose values are turned into hashtags, applied
    /// in order.
    pub keyword_labels: Vec<String>,
    /// Bold labels that mark the start of the description inside a post.
    pub description_start_keywords: HashSet<String>,
    /// Fragments stripped from the page title.
    pub title_noise: Vec<String>,
    /// Feed-title markers that flag an updated topic.
    pub updated_markers: Vec<String>,
}

impl Default for TopicOptions {
    fn default() -> TopicOptions {
        TopicOptions {
            canonical: CanonicalOptions::default(),
            keyword_labels: ["Жанр", "Genre", "Год выпуска", "Release year"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            description_start_keywords: [
                "Год выпуска",
                "Release year",
                "Жанр",
                "Genre",
                "Разработчик",
                "Developer",
                "Описание",
                "Description",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            title_noise: ["[Nintendo Switch]", "[Обновлено]", "[Updated]"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            updated_markers: ["[Обновлено]", "[Updated]"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// The output of [`crate::extract_topic`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topic {
    /// Page title with site suffix and noise markers removed.
    pub display_title: String,
    /// Plain text of the post's heading block, suitable as a search query.
    pub search_title: String,
    /// Cover image URL, if the post has one.
    pub image_url: Option<String>,
    /// `magnet:?xt=urn:btih:<hash>` without trackers or display name.
    pub magnet_link: String,
    /// Canonical, keyword-tagged description markup.
    pub description: String,
    /// Whether the feed entry announced an update.
    pub is_updated: bool,
}

/// Per-call length ceilings of the delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ceilings {
    /// Limit for text attached to an image.
    pub caption: usize,
    /// Limit for a stand-alone text message.
    pub message: usize,
}

impl Default for Ceilings {
    fn default() -> Ceilings {
        Ceilings {
            caption: 1024,
            message: 4096,
        }
    }
}

/// What to send, in order: an optional image caption followed by text
/// messages.  Produced by [`crate::plan_delivery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryPlan {
    pub caption: Option<String>,
    pub messages: Vec<String>,
}

impl DeliveryPlan {
    pub fn is_empty(&self) -> bool {
        self.caption.is_none() && self.messages.is_empty()
    }
}
