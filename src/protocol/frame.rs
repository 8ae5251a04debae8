//! Frame types
//!
//! A [`PendingFrame`] is the per-category record the parser fills during a
//! cycle. Once complete it is turned into an [`EncodedFrame`], the immutable
//! byte buffer handed to the dispatcher.

use bytes::Bytes;

use super::category::StreamCategory;
use super::constants::{IMAGE_CHANNELS, JOINT_COUNT};

/// Image crop dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u16,
    pub height: u16,
}

impl Dimensions {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Number of u16 samples in an RGB image of these dimensions
    pub const fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * IMAGE_CHANNELS
    }
}

/// One skeleton joint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Joint {
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// Closest-body payload
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BodyPayload {
    pub engagement: f32,
    pub joints: [Joint; JOINT_COUNT],
}

impl BodyPayload {
    /// Build from engagement and a flat `x, y, confidence` array
    ///
    /// Missing trailing values are left at zero; extra values are ignored.
    pub fn from_flat(engagement: f32, values: &[f32]) -> Self {
        let mut joints = [Joint::default(); JOINT_COUNT];
        for (joint, chunk) in joints.iter_mut().zip(values.chunks_exact(3)) {
            *joint = Joint {
                x: chunk[0],
                y: chunk[1],
                confidence: chunk[2],
            };
        }
        Self { engagement, joints }
    }

    /// Whether this is the no-detection placeholder
    pub fn is_placeholder(&self) -> bool {
        *self == Self::default()
    }
}

/// Hand or head image payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub dimensions: Dimensions,
    /// Row-major RGB samples
    pub samples: Vec<u16>,
}

impl ImagePayload {
    /// Zero-filled image used when nothing was detected
    pub fn placeholder(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            samples: vec![0; dimensions.sample_count()],
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}

/// Category-specific payload of a pending frame
#[derive(Debug, Clone, PartialEq)]
pub enum FramePayload {
    Body(BodyPayload),
    Image(ImagePayload),
}

/// Frame under construction during one detection cycle
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFrame {
    pub category: StreamCategory,
    /// Cycle timestamp (seconds since the Unix epoch)
    pub timestamp: i64,
    pub payload: FramePayload,
    /// Set once the payload is final (parsed or declared undetected)
    pub complete: bool,
}

impl PendingFrame {
    /// Start a frame with a zero-filled payload
    ///
    /// Image categories use `dimensions`; it is ignored for the body.
    pub fn placeholder(category: StreamCategory, timestamp: i64, dimensions: Dimensions) -> Self {
        let payload = if category.is_image() {
            FramePayload::Image(ImagePayload::placeholder(dimensions))
        } else {
            FramePayload::Body(BodyPayload::default())
        };

        Self {
            category,
            timestamp,
            payload,
            complete: false,
        }
    }

    /// Replace the payload and mark the frame complete
    pub fn fill(&mut self, payload: FramePayload) {
        self.payload = payload;
        self.complete = true;
    }

    /// Mark complete with whatever payload it holds
    pub fn finish(&mut self) {
        self.complete = true;
    }

    /// Whether the payload is all zeros (no detection)
    pub fn is_placeholder(&self) -> bool {
        match &self.payload {
            FramePayload::Body(body) => body.is_placeholder(),
            FramePayload::Image(image) => image.is_placeholder(),
        }
    }
}

/// Serialized frame, length prefix included
///
/// Cheap to clone due to `Bytes` reference counting.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub category: StreamCategory,
    pub timestamp: i64,
    /// Length prefix followed by the payload
    pub data: Bytes,
}

impl EncodedFrame {
    /// Total size on the wire
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload without the length prefix
    pub fn payload(&self) -> Bytes {
        self.data.slice(super::constants::LENGTH_PREFIX_SIZE..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_from_flat() {
        let values: Vec<f32> = (0..54).map(|v| v as f32).collect();
        let body = BodyPayload::from_flat(0.5, &values);

        assert_eq!(body.engagement, 0.5);
        assert_eq!(
            body.joints[0],
            Joint {
                x: 0.0,
                y: 1.0,
                confidence: 2.0
            }
        );
        assert_eq!(body.joints[17].confidence, 53.0);
        assert!(!body.is_placeholder());
    }

    #[test]
    fn test_placeholder_frames() {
        let dims = Dimensions::new(4, 2);

        let hand = PendingFrame::placeholder(StreamCategory::HandColorLH, 7, dims);
        match &hand.payload {
            FramePayload::Image(image) => {
                assert_eq!(image.samples.len(), 24);
                assert!(image.is_placeholder());
            }
            other => panic!("unexpected payload: {:?}", other),
        }
        assert!(!hand.complete);

        let body = PendingFrame::placeholder(StreamCategory::ClosestBody, 7, dims);
        assert!(matches!(body.payload, FramePayload::Body(ref b) if b.is_placeholder()));
    }

    #[test]
    fn test_fill_marks_complete() {
        let mut frame = PendingFrame::placeholder(StreamCategory::ClosestBody, 1, Dimensions::new(1, 1));
        frame.fill(FramePayload::Body(BodyPayload::from_flat(1.0, &[])));
        assert!(frame.complete);
    }
}
