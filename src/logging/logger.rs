use crate::models::Warning;
use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Deref;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

/// Observer interface for span events and soft warnings.  Implement this
/// trait and wrap it in a [`Listener`] to receive timing data from the
/// canonicalizer / splitter, or to be told when a chunk had to be cut
/// mid-line.
///
/// All methods are called synchronously from the processing code; keep
/// them lightweight.
pub trait PerfListener {
    /// Return whether this listener cares about the given span.  If `false`,
    /// none of the span callbacks will fire for that span.  Warnings are
    /// delivered regardless.
    fn is_interested_in_span(&self, span_id: u64) -> bool;
    /// Called when a span begins.
    fn on_span_start(&self, span_id: u64, start_time: Instant);
    /// Called at each checkpoint within a span, with the wall-clock duration
    /// since the previous checkpoint (or span start).
    fn on_check_point(
        &self,
        span_id: u64,
        point_time: Instant,
        duration_since_last_checkpoint: Duration,
        label: &str,
    );
    /// Called when a free-text annotation is attached to a span.
    fn on_annotate(&self, span_id: u64, annotation: &str);
    /// Called when a span ends, with its total duration.
    fn on_span_end(&self, span_id: u64, span_duration: Duration);
    /// Called when processing degraded in a way the caller may want to log.
    fn on_warning(&self, span_id: u64, warning: &Warning);
}

/// A clonable, reference-counted wrapper around a [`PerfListener`].
/// Clone is cheap (just an `Rc` bump); the underlying listener is shared.
#[derive(Clone)]
pub struct Listener {
    inner_impl: Rc<dyn PerfListener>,
}

impl Listener {
    /// Wrap a [`PerfListener`] implementation for use with [`PerfLogger`].
    pub fn new(listener: Rc<dyn PerfListener>) -> Listener {
        Listener {
            inner_impl: listener,
        }
    }
}

impl Deref for Listener {
    type Target = dyn PerfListener;
    fn deref(&self) -> &Self::Target {
        &*self.inner_impl
    }
}

struct PerfCheckPoint {
    pub label: String,
    pub time: Instant,
}

struct PerfEvent {
    pub span_id: u64,
    pub start_time: Instant,
    pub last_point: Option<Instant>,
    pub listeners: Vec<Listener>,
}

impl PerfEvent {
    pub fn point(&mut self, point: PerfCheckPoint) {
        let since = self.last_point.unwrap_or(self.start_time);
        let duration_since_last_checkpoint = point.time.duration_since(since);
        self.listeners.iter().for_each(|l| {
            l.on_check_point(
                self.span_id,
                point.time,
                duration_since_last_checkpoint,
                point.label.as_str(),
            )
        });
        self.last_point = Some(point.time);
    }

    pub fn annotate(&mut self, annotation: &str) {
        self.listeners.iter().for_each(|l| {
            l.on_annotate(self.span_id, annotation);
        });
    }
}

/// Tracks in-flight spans and fans events out to registered [`Listener`]s.
///
/// **Not `Send` or `Sync`**: the internal event map uses `RefCell`.  Each
/// canonicalize / split call creates its own `PerfLogger`, so independent
/// calls on different threads never share one.
pub struct PerfLogger {
    events: RefCell<HashMap<u64, PerfEvent>>,
    listeners: Vec<Listener>,
}

impl PerfLogger {
    /// Create a new logger with the given set of listeners.  Pass an empty
    /// `Vec` to disable all logging.
    pub fn new(listeners: Vec<Listener>) -> PerfLogger {
        PerfLogger {
            events: RefCell::new(HashMap::new()),
            listeners,
        }
    }

    /// Begin a new span identified by `span_id`.  Only listeners that
    /// return `true` from [`PerfListener::is_interested_in_span`] are
    /// notified and stored.
    pub fn start(&self, span_id: u64) {
        let event_listeners = self
            .listeners
            .iter()
            .filter(|l| l.is_interested_in_span(span_id))
            .cloned()
            .collect::<Vec<_>>();
        if !event_listeners.is_empty() {
            let start_time = Instant::now();
            event_listeners
                .iter()
                .for_each(|l| l.on_span_start(span_id, start_time));
            let event = PerfEvent {
                span_id,
                start_time,
                last_point: None,
                listeners: event_listeners,
            };
            self.events.borrow_mut().insert(span_id, event);
        }
    }

    /// Record a checkpoint with a `&str` label inside the given span.
    pub fn check_point_str(&self, span_id: u64, label: &str) {
        if let Some(event) = self.events.borrow_mut().get_mut(&span_id) {
            let point = PerfCheckPoint {
                label: String::from(label),
                time: Instant::now(),
            };
            event.point(point);
        }
    }

    /// Record a checkpoint with an owned `String` label inside the given span.
    pub fn check_point(&self, span_id: u64, label: String) {
        if let Some(event) = self.events.borrow_mut().get_mut(&span_id) {
            let point = PerfCheckPoint {
                label,
                time: Instant::now(),
            };
            event.point(point);
        }
    }

    /// Attach a free-text annotation (`&str`) to the given span.
    pub fn annotate_str(&self, span_id: u64, annotation: &str) {
        if let Some(event) = self.events.borrow_mut().get_mut(&span_id) {
            event.annotate(annotation);
        }
    }

    /// Attach a free-text annotation (owned `String`) to the given span.
    pub fn annotate(&self, span_id: u64, annotation: String) {
        if let Some(event) = self.events.borrow_mut().get_mut(&span_id) {
            event.annotate(annotation.as_str());
        }
    }

    /// Report a warning to every registered listener.  Unlike span events,
    /// warnings are not gated on `debug_assertions` or span interest.
    pub fn warn(&self, span_id: u64, warning: Warning) {
        self.listeners
            .iter()
            .for_each(|l| l.on_warning(span_id, &warning));
    }

    /// End the span, notify listeners with the total duration, and remove
    /// it from the active-events map.
    pub fn end(&self, span_id: u64) {
        if let Some(event) = self.events.borrow_mut().remove(&span_id) {
            let duration = Instant::now().duration_since(event.start_time);
            event.listeners.iter().for_each(|l| {
                l.on_span_end(span_id, duration);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Counting {
        starts: Cell<usize>,
        points: Cell<usize>,
        ends: Cell<usize>,
        warnings: Cell<usize>,
    }

    impl PerfListener for Counting {
        fn is_interested_in_span(&self, span_id: u64) -> bool {
            span_id == 1
        }
        fn on_span_start(&self, _span_id: u64, _start_time: Instant) {
            self.starts.set(self.starts.get() + 1);
        }
        fn on_check_point(&self, _: u64, _: Instant, _: Duration, _: &str) {
            self.points.set(self.points.get() + 1);
        }
        fn on_annotate(&self, _span_id: u64, _annotation: &str) {}
        fn on_span_end(&self, _span_id: u64, _span_duration: Duration) {
            self.ends.set(self.ends.get() + 1);
        }
        fn on_warning(&self, _span_id: u64, _warning: &Warning) {
            self.warnings.set(self.warnings.get() + 1);
        }
    }

    #[test]
    fn only_interesting_spans_are_reported() {
        let counting = Rc::new(Counting::default());
        let logger = PerfLogger::new(vec![Listener::new(counting.clone())]);
        logger.start(1);
        logger.check_point_str(1, "a");
        logger.end(1);
        logger.start(2);
        logger.check_point_str(2, "b");
        logger.end(2);
        assert_eq!(counting.starts.get(), 1);
        assert_eq!(counting.points.get(), 1);
        assert_eq!(counting.ends.get(), 1);
    }

    #[test]
    fn warnings_reach_listeners_without_a_span() {
        let counting = Rc::new(Counting::default());
        let logger = PerfLogger::new(vec![Listener::new(counting.clone())]);
        logger.warn(
            99,
            Warning::LineOverflow {
                chunk_index: 0,
                line_index: 0,
                line_len: 10,
                available: 5,
                tags_dropped: false,
            },
        );
        assert_eq!(counting.warnings.get(), 1);
    }
}
