//! Per-category payload parsers
//!
//! Each payload line is either a no-detection notice or a whitespace
//! separated list of numbers whose count is fixed by the category.

use crate::error::ParseError;
use crate::protocol::constants::BODY_LINE_VALUE_COUNT;
use crate::protocol::{BodyPayload, Dimensions, FramePayload, ImagePayload, StreamCategory};

/// Text the engine prints instead of numbers when nothing was detected
pub fn undetected_marker(category: StreamCategory) -> &'static str {
    match category {
        StreamCategory::ClosestBody => "Undefined",
        StreamCategory::HandColorLH => "left hand unknown",
        StreamCategory::HandColorRH => "right hand unknown",
        StreamCategory::HeadColor => "head unknown",
    }
}

/// Parse a payload line for `category`
///
/// `dimensions` is the expected image size and is ignored for the body.
pub fn parse_payload(
    category: StreamCategory,
    line: &str,
    dimensions: Dimensions,
) -> Result<FramePayload, ParseError> {
    if category.is_image() {
        parse_image(category, line, dimensions).map(FramePayload::Image)
    } else {
        parse_body(line).map(FramePayload::Body)
    }
}

/// Parse an engagement value followed by 18 `x y confidence` triples
pub fn parse_body(line: &str) -> Result<BodyPayload, ParseError> {
    let category = StreamCategory::ClosestBody;
    if line.contains(undetected_marker(category)) {
        return Ok(BodyPayload::default());
    }

    let values: Vec<f32> = parse_values(category, line, BODY_LINE_VALUE_COUNT)?;
    Ok(BodyPayload::from_flat(values[0], &values[1..]))
}

/// Parse a row-major RGB image of `dimensions`
pub fn parse_image(
    category: StreamCategory,
    line: &str,
    dimensions: Dimensions,
) -> Result<ImagePayload, ParseError> {
    if line.contains(undetected_marker(category)) {
        return Ok(ImagePayload::placeholder(dimensions));
    }

    let samples = parse_values(category, line, dimensions.sample_count())?;
    Ok(ImagePayload {
        dimensions,
        samples,
    })
}

fn parse_values<T: std::str::FromStr>(
    category: StreamCategory,
    line: &str,
    expected: usize,
) -> Result<Vec<T>, ParseError> {
    let actual = line.split_whitespace().count();
    if actual != expected {
        return Err(ParseError::ArityMismatch {
            category,
            expected,
            actual,
        });
    }

    line.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| ParseError::InvalidToken {
                category,
                token: token.to_string(),
            })
        })
        .collect()
}
