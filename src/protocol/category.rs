//! Stream categories
//!
//! A category is one of the four independent data kinds a client can
//! subscribe to. Each category has a fixed stream id used only during the
//! handshake, and a frame code written into its frames.

use std::fmt;

use super::constants::*;
use super::layout::{FrameLayout, BODY_LAYOUT, IMAGE_LAYOUT};

/// Subscription category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamCategory {
    /// Skeleton of the closest detected person
    ClosestBody,
    /// Left-hand color crop
    HandColorLH,
    /// Right-hand color crop
    HandColorRH,
    /// Head color crop
    HeadColor,
}

impl StreamCategory {
    /// All categories, in the order their markers appear within a cycle
    pub const ALL: [StreamCategory; 4] = [
        StreamCategory::ClosestBody,
        StreamCategory::HandColorLH,
        StreamCategory::HandColorRH,
        StreamCategory::HeadColor,
    ];

    /// Stream id a client sends to subscribe to this category
    pub fn stream_id(self) -> i32 {
        match self {
            StreamCategory::ClosestBody => STREAM_ID_CLOSEST_BODY,
            StreamCategory::HandColorLH => STREAM_ID_HAND_COLOR_LH,
            StreamCategory::HandColorRH => STREAM_ID_HAND_COLOR_RH,
            StreamCategory::HeadColor => STREAM_ID_HEAD_COLOR,
        }
    }

    /// Look up the category for a handshake stream id
    pub fn from_stream_id(id: i32) -> Option<Self> {
        match id {
            STREAM_ID_CLOSEST_BODY => Some(StreamCategory::ClosestBody),
            STREAM_ID_HAND_COLOR_LH => Some(StreamCategory::HandColorLH),
            STREAM_ID_HAND_COLOR_RH => Some(StreamCategory::HandColorRH),
            STREAM_ID_HEAD_COLOR => Some(StreamCategory::HeadColor),
            _ => None,
        }
    }

    /// Code written into the frame header after the timestamp
    ///
    /// Hand frames carry the side (0 = left, 1 = right); body and head
    /// frames carry their stream id. The field is 16 bits wide in body
    /// frames and 32 bits wide in image frames.
    pub fn frame_code(self) -> i32 {
        match self {
            StreamCategory::HandColorLH => SIDE_LEFT,
            StreamCategory::HandColorRH => SIDE_RIGHT,
            StreamCategory::ClosestBody | StreamCategory::HeadColor => self.stream_id(),
        }
    }

    /// Wire layout of this category's frames
    pub fn layout(self) -> &'static FrameLayout {
        match self {
            StreamCategory::ClosestBody => &BODY_LAYOUT,
            _ => &IMAGE_LAYOUT,
        }
    }

    /// Position in [`StreamCategory::ALL`]
    pub fn index(self) -> usize {
        match self {
            StreamCategory::ClosestBody => 0,
            StreamCategory::HandColorLH => 1,
            StreamCategory::HandColorRH => 2,
            StreamCategory::HeadColor => 3,
        }
    }

    /// Whether frames of this category carry an image
    pub fn is_image(self) -> bool {
        !matches!(self, StreamCategory::ClosestBody)
    }

    /// Category name as used in logs
    pub fn name(self) -> &'static str {
        match self {
            StreamCategory::ClosestBody => "ClosestBody",
            StreamCategory::HandColorLH => "HandColorLH",
            StreamCategory::HandColorRH => "HandColorRH",
            StreamCategory::HeadColor => "HeadColor",
        }
    }
}

impl fmt::Display for StreamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_roundtrip() {
        for category in StreamCategory::ALL {
            assert_eq!(
                StreamCategory::from_stream_id(category.stream_id()),
                Some(category)
            );
        }
    }

    #[test]
    fn test_known_stream_ids() {
        assert_eq!(StreamCategory::ClosestBody.stream_id(), 512);
        assert_eq!(StreamCategory::HandColorLH.stream_id(), 1024);
        assert_eq!(StreamCategory::HandColorRH.stream_id(), 2048);
        assert_eq!(StreamCategory::HeadColor.stream_id(), 4096);
    }

    #[test]
    fn test_unknown_stream_ids() {
        for id in [0, 1, -512, 511, 513, 3072, 8192, i32::MAX, i32::MIN] {
            assert_eq!(StreamCategory::from_stream_id(id), None);
        }
    }

    #[test]
    fn test_frame_codes() {
        assert_eq!(StreamCategory::ClosestBody.frame_code(), 512);
        assert_eq!(StreamCategory::HandColorLH.frame_code(), 0);
        assert_eq!(StreamCategory::HandColorRH.frame_code(), 1);
        assert_eq!(StreamCategory::HeadColor.frame_code(), 4096);
    }

    #[test]
    fn test_index_matches_all() {
        for (i, category) in StreamCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(StreamCategory::HandColorRH.to_string(), "HandColorRH");
    }
}
