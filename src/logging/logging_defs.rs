/// Span IDs for logging events.  Each ID must be unique; simply increment
/// when adding a new span.
pub const CANONICALIZE: u64 = 1;
pub const REMOVAL_PASS: u64 = 2;
pub const SPOILER_PASS: u64 = 3;
pub const QUOTE_PASS: u64 = 4;
pub const STYLE_PASS: u64 = 5;
pub const PREFORMATTED_PASS: u64 = 6;
pub const LIST_PASS: u64 = 7;
pub const LINK_PASS: u64 = 8;
pub const SERIALIZE: u64 = 9;
pub const SPLIT: u64 = 10;
pub const EXTRACT_TOPIC: u64 = 11;

pub fn name(span_id: u64) -> &'static str {
    match span_id {
        CANONICALIZE => "CANONICALIZE",
        REMOVAL_PASS => "REMOVAL_PASS",
        SPOILER_PASS => "SPOILER_PASS",
        QUOTE_PASS => "QUOTE_PASS",
        STYLE_PASS => "STYLE_PASS",
        PREFORMATTED_PASS => "PREFORMATTED_PASS",
        LIST_PASS => "LIST_PASS",
        LINK_PASS => "LINK_PASS",
        SERIALIZE => "SERIALIZE",
        SPLIT => "SPLIT",
        EXTRACT_TOPIC => "EXTRACT_TOPIC",
        _ => panic!(
            "Calling logging::logging_defs::name with unknown span_id: {}",
            span_id
        ),
    }
}
