//! Line classifier
//!
//! Markers are matched as substrings, the way the engine embeds them in
//! longer log lines (e.g. `ImageHead: head_img_x_start, ...`).

use crate::protocol::StreamCategory;

/// Opens a detection cycle
pub const CYCLE_START_MARKER: &str = "new frame";
/// Precedes the skeleton line
pub const BODY_MARKER: &str = "(x, y, score):";
/// Precedes the left-hand pixel line
pub const LEFT_HAND_MARKER: &str = "ImageLeftHand:";
/// Precedes the right-hand pixel line
pub const RIGHT_HAND_MARKER: &str = "ImageRightHand:";
/// Precedes the head pixel line
pub const HEAD_MARKER: &str = "ImageHead:";
/// Closes a detection cycle
pub const CYCLE_END_MARKER: &str = "[End]";

/// What a single upstream line means
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    CycleStart,
    CategoryStart(StreamCategory),
    CycleEnd,
    /// Anything that is not a marker
    Payload(&'a str),
}

/// Classify a line; markers take precedence over payload
pub fn classify(line: &str) -> LineKind<'_> {
    if line.contains(CYCLE_START_MARKER) {
        LineKind::CycleStart
    } else if line.contains(BODY_MARKER) {
        LineKind::CategoryStart(StreamCategory::ClosestBody)
    } else if line.contains(LEFT_HAND_MARKER) {
        LineKind::CategoryStart(StreamCategory::HandColorLH)
    } else if line.contains(RIGHT_HAND_MARKER) {
        LineKind::CategoryStart(StreamCategory::HandColorRH)
    } else if line.contains(HEAD_MARKER) {
        LineKind::CategoryStart(StreamCategory::HeadColor)
    } else if line.contains(CYCLE_END_MARKER) {
        LineKind::CycleEnd
    } else {
        LineKind::Payload(line)
    }
}
