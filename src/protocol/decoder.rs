//! Frame decoder
//!
//! Reads frames back using the same layouts the encoder writes. Used by the
//! subscriber client and by tests.

use bytes::Buf;

use super::constants::{JOINT_VALUE_COUNT, LENGTH_PREFIX_SIZE};
use super::frame::{BodyPayload, Dimensions, FramePayload, ImagePayload};
use super::StreamCategory;
use crate::error::DecodeError;

/// A frame as seen by a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub timestamp: i64,
    /// Category code (body/head) or side code (hands)
    pub code: i32,
    /// Body-count field; zero for image frames
    pub body_count: u16,
    pub payload: FramePayload,
}

impl DecodedFrame {
    /// Decode a payload (length prefix already stripped) of `category`
    pub fn decode(category: StreamCategory, mut payload: &[u8]) -> Result<Self, DecodeError> {
        let layout = category.layout();
        if payload.len() < layout.header_size() {
            return Err(DecodeError::Truncated {
                expected: layout.header_size(),
                actual: payload.len(),
            });
        }

        let total = payload.len();
        let timestamp = payload.get_i64_le();

        if category.is_image() {
            let code = payload.get_i32_le();
            let width = payload.get_u16_le();
            let height = payload.get_u16_le();
            let dimensions = Dimensions::new(width, height);

            let expected = layout.payload_size(dimensions.sample_count());
            if total != expected {
                return Err(DecodeError::SizeMismatch {
                    expected,
                    actual: total,
                });
            }

            let samples = (0..dimensions.sample_count())
                .map(|_| payload.get_u16_le())
                .collect();

            Ok(Self {
                timestamp,
                code,
                body_count: 0,
                payload: FramePayload::Image(ImagePayload {
                    dimensions,
                    samples,
                }),
            })
        } else {
            let code = payload.get_i16_le() as i32;
            let body_count = payload.get_u16_le();
            let engagement = payload.get_f32_le();

            let expected = layout.payload_size(JOINT_VALUE_COUNT);
            if total != expected {
                return Err(DecodeError::SizeMismatch {
                    expected,
                    actual: total,
                });
            }

            let values: Vec<f32> = (0..JOINT_VALUE_COUNT)
                .map(|_| payload.get_f32_le())
                .collect();

            Ok(Self {
                timestamp,
                code,
                body_count,
                payload: FramePayload::Body(BodyPayload::from_flat(engagement, &values)),
            })
        }
    }

    /// Split a length-prefixed buffer into its payload
    ///
    /// Returns `Ok(None)` if the buffer does not yet hold a whole frame.
    pub fn split_prefixed(data: &[u8]) -> Result<Option<&[u8]>, DecodeError> {
        if data.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let len = i32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        if len < 0 {
            return Err(DecodeError::InvalidLength(len));
        }

        let end = LENGTH_PREFIX_SIZE + len as usize;
        if data.len() < end {
            return Ok(None);
        }
        Ok(Some(&data[LENGTH_PREFIX_SIZE..end]))
    }

    /// Pixel dimensions, if this is an image frame
    pub fn dimensions(&self) -> Option<Dimensions> {
        match &self.payload {
            FramePayload::Image(image) => Some(image.dimensions),
            FramePayload::Body(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::encoder::FrameEncoder;
    use crate::protocol::frame::PendingFrame;

    #[test]
    fn test_body_roundtrip() {
        let values: Vec<f32> = (0..54).map(|v| v as f32 / 10.0).collect();
        let body = BodyPayload::from_flat(0.75, &values);

        let mut frame = PendingFrame::placeholder(StreamCategory::ClosestBody, 1234, Dimensions::new(0, 0));
        frame.fill(FramePayload::Body(body.clone()));

        let encoded = FrameEncoder::encode(&frame);
        let decoded = DecodedFrame::decode(StreamCategory::ClosestBody, &encoded.payload()).unwrap();

        assert_eq!(decoded.timestamp, 1234);
        assert_eq!(decoded.code, 512);
        assert_eq!(decoded.body_count, 100);
        assert_eq!(decoded.payload, FramePayload::Body(body));
    }

    #[test]
    fn test_image_roundtrip_per_category() {
        let dims = Dimensions::new(3, 2);
        let samples: Vec<u16> = (0..dims.sample_count() as u16).map(|v| v * 1000).collect();

        for (category, code) in [
            (StreamCategory::HandColorLH, 0),
            (StreamCategory::HandColorRH, 1),
            (StreamCategory::HeadColor, 4096),
        ] {
            let image = ImagePayload {
                dimensions: dims,
                samples: samples.clone(),
            };
            let mut frame = PendingFrame::placeholder(category, -5, dims);
            frame.fill(FramePayload::Image(image.clone()));

            let encoded = FrameEncoder::encode(&frame);
            let decoded = DecodedFrame::decode(category, &encoded.payload()).unwrap();

            assert_eq!(decoded.timestamp, -5);
            assert_eq!(decoded.code, code);
            assert_eq!(decoded.dimensions(), Some(dims));
            assert_eq!(decoded.payload, FramePayload::Image(image));
        }
    }

    #[test]
    fn test_truncated_header() {
        let result = DecodedFrame::decode(StreamCategory::HeadColor, &[0u8; 10]);
        assert_eq!(
            result,
            Err(DecodeError::Truncated {
                expected: 16,
                actual: 10
            })
        );
    }

    #[test]
    fn test_size_mismatch() {
        let frame = PendingFrame::placeholder(StreamCategory::HandColorLH, 0, Dimensions::new(2, 2));
        let encoded = FrameEncoder::encode(&frame);
        let payload = encoded.payload();

        let result = DecodedFrame::decode(StreamCategory::HandColorLH, &payload[..payload.len() - 2]);
        assert!(matches!(result, Err(DecodeError::SizeMismatch { .. })));
    }

    #[test]
    fn test_split_prefixed() {
        let frame = PendingFrame::placeholder(StreamCategory::ClosestBody, 0, Dimensions::new(0, 0));
        let encoded = FrameEncoder::encode(&frame);

        assert_eq!(DecodedFrame::split_prefixed(&encoded.data[..100]), Ok(None));
        let payload = DecodedFrame::split_prefixed(&encoded.data).unwrap().unwrap();
        assert_eq!(payload.len(), 232);

        let negative = (-1i32).to_le_bytes();
        assert_eq!(
            DecodedFrame::split_prefixed(&negative),
            Err(DecodeError::InvalidLength(-1))
        );
    }
}
