//! Length-bounded, tag-balanced splitting of canonical markup.
//!
//! The splitter walks the input line by line, carrying a [`TagStack`] of
//! the tags open at the cursor.  A chunk that ends while tags are open gets
//! them closed, innermost first, and the next chunk re-opens them,
//! outermost first, so every chunk is valid markup on its own.

use crate::logging::create_perf_logger;
use crate::logging::logger::*;
use crate::logging::logging_defs::*;
use crate::models::Warning;
use crate::vocabulary::{char_len, text_atoms, tokenize, TagStack, Token};

/// One delivered unit of markup with its position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Splits canonical markup into chunks of at most `max_len` characters.
///
/// # Panics
///
/// [`Splitter::new`] panics if `max_len` is zero; that is a caller bug,
/// not bad input.
///
/// # Examples
///
/// ```rust
/// use markup_reflow::Splitter;
///
/// let chunks = Splitter::new(11).split("line1\nline2\nline3");
/// assert_eq!(chunks, vec!["line1\nline2", "line3"]);
/// ```
#[derive(Clone)]
pub struct Splitter {
    max_len: usize,
    debug: bool,
    listeners: Vec<Listener>,
}

impl Splitter {
    pub fn new(max_len: usize) -> Splitter {
        assert!(max_len > 0, "Splitter::new: max_len must be greater than zero");
        Splitter {
            max_len,
            debug: false,
            listeners: vec![],
        }
    }

    /// Receive [`Warning::LineOverflow`] (and span events, if interested).
    pub fn with_listener(mut self, listener: Listener) -> Splitter {
        self.listeners.push(listener);
        self
    }

    /// Print span events and warnings to the console.
    pub fn debug(mut self, debug: bool) -> Splitter {
        self.debug = debug;
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn split(&self, markup: &str) -> Vec<String> {
        self.chunks(markup).into_iter().map(|c| c.text).collect()
    }

    pub fn chunks(&self, markup: &str) -> Vec<Chunk> {
        let logger = create_perf_logger(self.debug, &self.listeners);
        start_span!(logger, SPLIT);
        let mut builder = ChunkBuilder::new(self.max_len);
        let lines = markup.split_inclusive('\n');
        for (line_index, line) in lines.enumerate() {
            builder.place_line(line_index, line, &logger);
        }
        let chunks = builder.finish();
        annotate_span!(logger, SPLIT, format!("{} chunks", chunks.len()));
        end_span!(logger, SPLIT);
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }
}

/// Split `markup` into chunks of at most `max_len` characters each.
///
/// Every chunk is tag-balanced.  A line that cannot fit even into an empty
/// chunk is cut between characters; use [`Splitter::with_listener`] to be
/// told when that happens.
///
/// # Panics
///
/// Panics if `max_len` is zero.
pub fn split(markup: &str, max_len: usize) -> Vec<String> {
    Splitter::new(max_len).split(markup)
}

/// A line re-emitted token by token against a starting stack, with stray
/// closing tags dropped.
struct LaidOutLine {
    text: String,
    /// Length once trailing whitespace is trimmed, which is all it costs
    /// when it ends a chunk outside `pre` and `code`.
    visible_len: usize,
    after: TagStack,
    blank: bool,
}

fn lay_out_line(stack: &TagStack, tokens: &[Token<'_>]) -> LaidOutLine {
    let mut after = stack.clone();
    let mut text = String::new();
    for token in tokens {
        if after.apply(token) {
            text.push_str(token.raw());
        }
    }
    let visible_len = if after.in_verbatim() {
        char_len(&text)
    } else {
        char_len(text.trim_end())
    };
    let blank = text.trim().is_empty();
    LaidOutLine {
        text,
        visible_len,
        after,
        blank,
    }
}

struct ChunkBuilder {
    max_len: usize,
    chunks: Vec<String>,
    body: String,
    body_len: usize,
    has_content: bool,
    stack: TagStack,
    /// Emitting a forced cut without the open tags.
    bare: bool,
}

impl ChunkBuilder {
    fn new(max_len: usize) -> ChunkBuilder {
        ChunkBuilder {
            max_len,
            chunks: vec![],
            body: String::new(),
            body_len: 0,
            has_content: false,
            stack: TagStack::new(),
            bare: false,
        }
    }

    fn fits(&self, extra_len: usize, closing_len: usize) -> bool {
        self.body_len + extra_len + closing_len <= self.max_len
    }

    /// Closing text the current chunk will need.
    fn closing_len(&self) -> usize {
        if self.bare {
            0
        } else {
            self.stack.closing_len()
        }
    }

    /// What re-opening and closing the open tags costs a fresh chunk.
    fn tag_overhead(&self) -> usize {
        self.stack.reopen_len() + self.stack.closing_len()
    }

    fn push_str(&mut self, text: &str) {
        self.body.push_str(text);
        self.body_len += char_len(text);
    }

    fn place_line(&mut self, line_index: usize, line: &str, logger: &PerfLogger) {
        let tokens = tokenize(line);
        let mut laid_out = lay_out_line(&self.stack, &tokens);
        if !self.has_content && laid_out.blank {
            return;
        }
        if self.fits(laid_out.visible_len, laid_out.after.closing_len()) {
            self.commit(laid_out);
            return;
        }
        if self.has_content {
            self.finish_chunk();
            if laid_out.blank {
                return;
            }
            laid_out = lay_out_line(&self.stack, &tokens);
            if self.fits(laid_out.visible_len, laid_out.after.closing_len()) {
                self.commit(laid_out);
                return;
            }
        }
        let chunk_index = self.chunks.len();
        let available = self.max_len.saturating_sub(self.body_len);
        let tags_dropped = self.force_line(&tokens);
        logger.warn(
            SPLIT,
            Warning::LineOverflow {
                chunk_index,
                line_index,
                line_len: char_len(&laid_out.text),
                available,
                tags_dropped,
            },
        );
    }

    fn commit(&mut self, laid_out: LaidOutLine) {
        self.push_str(&laid_out.text);
        self.stack = laid_out.after;
        self.has_content = true;
    }

    /// Place a line that does not fit into an empty chunk, cutting between
    /// text atoms.  Tags are never cut and always get room for their
    /// closing counterpart, so chunks stay balanced here as well.  When the
    /// open tags leave no room for a single atom, the rest of the line is
    /// cut without them; returns whether that happened.
    fn force_line(&mut self, tokens: &[Token<'_>]) -> bool {
        let mut tags_dropped = false;
        for token in tokens {
            match *token {
                Token::Open { tag, raw } => {
                    let needed = char_len(raw) + tag.name().len() + 3;
                    if !self.bare && self.tag_overhead() + needed >= self.max_len {
                        self.start_bare();
                        tags_dropped = true;
                    }
                    if self.bare {
                        self.stack.push(tag, raw);
                        continue;
                    }
                    if self.has_content && !self.fits(needed, self.stack.closing_len()) {
                        self.finish_chunk();
                    }
                    self.push_str(raw);
                    self.stack.push(tag, raw);
                }
                Token::Close { tag, raw } => {
                    if !self.stack.close(tag) || self.bare {
                        continue;
                    }
                    if self.has_content {
                        self.push_str(raw);
                    } else {
                        // Nothing but re-opened tags yet; drop the empty pair.
                        self.body = self.stack.reopen();
                        self.body_len = self.stack.reopen_len();
                    }
                }
                Token::Text(text) => {
                    for atom in text_atoms(text) {
                        let atom_len = char_len(atom);
                        if !self.bare
                            && !self.stack.is_empty()
                            && self.tag_overhead() + atom_len > self.max_len
                        {
                            self.start_bare();
                            tags_dropped = true;
                        }
                        if self.has_content && !self.fits(atom_len, self.closing_len()) {
                            self.finish_chunk();
                        }
                        if !self.has_content && atom.trim().is_empty() {
                            continue;
                        }
                        self.push_str(atom);
                        self.has_content = true;
                    }
                }
            }
        }
        if self.bare {
            self.finish_chunk();
            self.bare = false;
            self.body = self.stack.reopen();
            self.body_len = self.stack.reopen_len();
        }
        tags_dropped
    }

    fn start_bare(&mut self) {
        if self.has_content {
            self.finish_chunk();
        }
        self.bare = true;
        self.body.clear();
        self.body_len = 0;
    }

    fn finish_chunk(&mut self) {
        if self.has_content {
            let mut text = if self.bare || self.stack.in_verbatim() {
                self.body.clone()
            } else {
                self.body.trim_end().to_string()
            };
            if !self.bare {
                text.push_str(&self.stack.closing());
            }
            let text = text.trim();
            if !text.is_empty() {
                self.chunks.push(text.to_string());
            }
        }
        if self.bare {
            self.body.clear();
            self.body_len = 0;
        } else {
            self.body = self.stack.reopen();
            self.body_len = self.stack.reopen_len();
        }
        self.has_content = false;
    }

    fn finish(mut self) -> Vec<String> {
        self.finish_chunk();
        self.chunks
    }
}
