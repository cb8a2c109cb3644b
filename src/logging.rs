pub mod logger;

pub mod logging_defs;
#[macro_use]
pub mod macros;

use crate::models::Warning;
use logger::{Listener, PerfListener, PerfLogger};
use logging_defs::*;
use std::rc::Rc;
use std::time::Duration;
use std::time::Instant;

/// A [`PerfListener`] that prints span events to stdout and warnings to
/// stderr.  Span output is off ([`is_interested_in_span`][PerfListener::is_interested_in_span]
/// returns `false`); flip it locally while profiling a pass.
pub struct PerfConsoleListener;

impl PerfListener for PerfConsoleListener {
    fn is_interested_in_span(&self, _span_id: u64) -> bool {
        // _span_id == CANONICALIZE
        false
    }

    fn on_span_start(&self, span_id: u64, _start_time: Instant) {
        println!("Start of span: {}", name(span_id));
    }

    fn on_check_point(
        &self,
        span_id: u64,
        _point_time: Instant,
        duration_since_last_checkpoint: Duration,
        point_label: &str,
    ) {
        println!(
            "Span: \"{}\" point: \"{}\": {} seconds",
            name(span_id),
            point_label,
            duration_since_last_checkpoint.as_secs_f64()
        );
    }

    fn on_annotate(&self, span_id: u64, annotation: &str) {
        println!("Span: \"{}\" annotation: \"{}\"", name(span_id), annotation);
    }

    fn on_span_end(&self, span_id: u64, span_duration: Duration) {
        println!(
            "Span ended: \"{}\": {} seconds",
            name(span_id),
            span_duration.as_secs_f64()
        );
    }

    fn on_warning(&self, span_id: u64, warning: &Warning) {
        eprintln!("warning in \"{}\": {}", name(span_id), warning);
    }
}

/// Logger used by every public entry point: the caller's listeners, plus
/// the console listener when `debug` is set.
pub(crate) fn create_perf_logger(debug: bool, extra: &[Listener]) -> PerfLogger {
    let mut listeners = Vec::with_capacity(extra.len() + 1);
    if debug {
        listeners.push(Listener::new(Rc::new(PerfConsoleListener {})));
    }
    listeners.extend(extra.iter().cloned());
    PerfLogger::new(listeners)
}
