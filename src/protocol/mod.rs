//! Wire protocol
//!
//! Everything a subscriber sees on the socket: the 4-byte stream id
//! handshake and the length-prefixed, little-endian frame layouts.

pub mod category;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod frame;
pub mod handshake;
pub mod layout;

pub use category::StreamCategory;
pub use decoder::DecodedFrame;
pub use encoder::FrameEncoder;
pub use frame::{BodyPayload, Dimensions, EncodedFrame, FramePayload, ImagePayload, Joint, PendingFrame};
pub use layout::{FieldKind, FrameLayout};
