//! Frame encoder
//!
//! Serializes a completed [`PendingFrame`] into its category's layout (see
//! [`super::layout`]). Placeholder frames go through the same path and only
//! differ in their sample values.

use bytes::{BufMut, BytesMut};

use super::constants::{LENGTH_PREFIX_SIZE, MAX_PAYLOAD_SIZE, TRACKED_BODY_COUNT};
use super::frame::{BodyPayload, EncodedFrame, FramePayload, ImagePayload, PendingFrame};
use super::layout::{BODY_LAYOUT, IMAGE_LAYOUT};
use super::StreamCategory;

/// Stateless frame serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    /// Encode a frame, length prefix included
    pub fn encode(frame: &PendingFrame) -> EncodedFrame {
        let data = match &frame.payload {
            FramePayload::Body(body) => encode_body(frame.category, frame.timestamp, body),
            FramePayload::Image(image) => encode_image(frame.category, frame.timestamp, image),
        };

        EncodedFrame {
            category: frame.category,
            timestamp: frame.timestamp,
            data: data.freeze(),
        }
    }
}

fn encode_body(category: StreamCategory, timestamp: i64, body: &BodyPayload) -> BytesMut {
    let payload_size = BODY_LAYOUT.payload_size(body.joints.len() * 3);
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload_size);

    buf.put_i32_le(payload_size as i32);
    buf.put_i64_le(timestamp);
    buf.put_i16_le(category.frame_code() as i16);
    buf.put_u16_le(TRACKED_BODY_COUNT);
    buf.put_f32_le(body.engagement);
    for joint in &body.joints {
        buf.put_f32_le(joint.x);
        buf.put_f32_le(joint.y);
        buf.put_f32_le(joint.confidence);
    }

    debug_assert_eq!(buf.len(), LENGTH_PREFIX_SIZE + payload_size);
    buf
}

fn encode_image(category: StreamCategory, timestamp: i64, image: &ImagePayload) -> BytesMut {
    let payload_size = IMAGE_LAYOUT.payload_size(image.samples.len());
    debug_assert!(payload_size <= MAX_PAYLOAD_SIZE);
    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload_size);

    buf.put_i32_le(payload_size as i32);
    buf.put_i64_le(timestamp);
    buf.put_i32_le(category.frame_code());
    buf.put_u16_le(image.dimensions.width);
    buf.put_u16_le(image.dimensions.height);
    for &sample in &image.samples {
        buf.put_u16_le(sample);
    }

    debug_assert_eq!(buf.len(), LENGTH_PREFIX_SIZE + payload_size);
    buf
}
