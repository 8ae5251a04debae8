//! Protocol constants

/// Default TCP port subscribers connect to
pub const DEFAULT_PORT: u16 = 9009;

/// Size of the stream id sent by a client as its whole handshake
pub const STREAM_ID_SIZE: usize = 4;

/// Size of the `i32` length prefix in front of every frame
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Stream id for the closest-body skeleton stream
pub const STREAM_ID_CLOSEST_BODY: i32 = 512;
/// Stream id for the left-hand color stream
pub const STREAM_ID_HAND_COLOR_LH: i32 = 1024;
/// Stream id for the right-hand color stream
pub const STREAM_ID_HAND_COLOR_RH: i32 = 2048;
/// Stream id for the head color stream
pub const STREAM_ID_HEAD_COLOR: i32 = 4096;

/// Side code written into left-hand frames
pub const SIDE_LEFT: i32 = 0;
/// Side code written into right-hand frames
pub const SIDE_RIGHT: i32 = 1;

/// Number of skeleton joints (COCO body parts, background excluded)
pub const JOINT_COUNT: usize = 18;
/// x, y, confidence
pub const VALUES_PER_JOINT: usize = 3;
/// Floats in the joint array of a body frame
pub const JOINT_VALUE_COUNT: usize = JOINT_COUNT * VALUES_PER_JOINT;
/// Values on a body payload line: engagement followed by the joint array
pub const BODY_LINE_VALUE_COUNT: usize = 1 + JOINT_VALUE_COUNT;

/// Largest payload the i32 length prefix can describe
pub const MAX_PAYLOAD_SIZE: usize = i32::MAX as usize;

/// Body-count field value expected by existing skeleton clients
pub const TRACKED_BODY_COUNT: u16 = 100;

/// RGB
pub const IMAGE_CHANNELS: usize = 3;

/// Default hand crop width in pixels
pub const DEFAULT_HAND_WIDTH: u16 = 64;
/// Default hand crop height in pixels
pub const DEFAULT_HAND_HEIGHT: u16 = 64;
/// Default head crop width in pixels
pub const DEFAULT_HEAD_WIDTH: u16 = 64;
/// Default head crop height in pixels
pub const DEFAULT_HEAD_HEIGHT: u16 = 64;
