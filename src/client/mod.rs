//! Relay client
//!
//! Subscribes to one category and decodes the frames the relay sends.

pub mod subscriber;

pub use subscriber::FrameSubscriber;
