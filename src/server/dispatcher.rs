//! Frame dispatcher
//!
//! Routes each encoded frame to the subscriber of its category. A frame with
//! no subscriber is dropped. A subscriber that cannot take the frame right
//! away is evicted before the next frame is routed, so one slow reader never
//! holds up the other categories.

use crate::error::SendError;
use crate::protocol::EncodedFrame;
use crate::registry::StreamRegistry;

/// What happened to a dispatched frame
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Written in full to the subscriber
    Delivered,
    /// No subscriber for the category
    Dropped,
    /// The write failed and the subscriber was removed
    Evicted(SendError),
}

impl DispatchOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// Frame router
#[derive(Debug, Clone, Default)]
pub struct Dispatcher;

impl Dispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Deliver one frame to its category's subscriber
    pub async fn deliver(
        &self,
        frame: &EncodedFrame,
        registry: &mut StreamRegistry,
    ) -> DispatchOutcome {
        let Some(conn) = registry.get_mut(frame.category) else {
            tracing::trace!(category = %frame.category, "No subscriber, frame dropped");
            return DispatchOutcome::Dropped;
        };

        match conn.send(frame).await {
            Ok(()) => DispatchOutcome::Delivered,
            Err(e) => {
                let id = conn.id;
                tracing::warn!(
                    category = %frame.category,
                    conn_id = id,
                    error = %e,
                    "Send failed, evicting subscriber"
                );
                registry.remove(id);
                DispatchOutcome::Evicted(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::net::SocketAddr;
    use std::time::{Duration, Instant};

    use tokio_test::io::Builder;

    use super::*;
    use crate::protocol::{Dimensions, FrameEncoder, PendingFrame, StreamCategory};
    use crate::registry::ClientConnection;

    fn peer() -> SocketAddr {
        "127.0.0.1:50001".parse().unwrap()
    }

    fn frame(category: StreamCategory) -> EncodedFrame {
        FrameEncoder::encode(&PendingFrame::placeholder(category, 3, Dimensions::new(2, 2)))
    }

    #[tokio::test]
    async fn test_no_subscriber_drops() {
        let dispatcher = Dispatcher::new();
        let mut registry = StreamRegistry::new();

        let outcome = dispatcher
            .deliver(&frame(StreamCategory::HeadColor), &mut registry)
            .await;

        assert!(matches!(outcome, DispatchOutcome::Dropped));
    }

    #[tokio::test]
    async fn test_routes_to_matching_category() {
        let dispatcher = Dispatcher::new();
        let mut registry = StreamRegistry::new();
        let head = frame(StreamCategory::HeadColor);

        let mock = Builder::new().write(&head.data).build();
        let id = registry.allocate_id();
        registry
            .register(ClientConnection::new(id, peer(), StreamCategory::HeadColor, Box::new(mock)))
            .unwrap();

        // Nothing is written for other categories
        let other = dispatcher
            .deliver(&frame(StreamCategory::HandColorLH), &mut registry)
            .await;
        assert!(matches!(other, DispatchOutcome::Dropped));

        let outcome = dispatcher.deliver(&head, &mut registry).await;
        assert!(outcome.is_delivered());
        assert_eq!(
            registry
                .get_connection_stats(StreamCategory::HeadColor)
                .unwrap()
                .frames_sent,
            1
        );
    }

    #[tokio::test]
    async fn test_failed_send_evicts() {
        let dispatcher = Dispatcher::new();
        let mut registry = StreamRegistry::new();

        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let id = registry.allocate_id();
        registry
            .register(ClientConnection::new(id, peer(), StreamCategory::ClosestBody, Box::new(mock)))
            .unwrap();

        let body = frame(StreamCategory::ClosestBody);
        let outcome = dispatcher.deliver(&body, &mut registry).await;

        assert!(matches!(outcome, DispatchOutcome::Evicted(SendError::Io(_))));
        assert!(!registry.is_registered(StreamCategory::ClosestBody));

        // The next frame finds nobody
        let outcome = dispatcher.deliver(&body, &mut registry).await;
        assert!(matches!(outcome, DispatchOutcome::Dropped));
    }

    #[tokio::test]
    async fn test_stalled_subscriber_evicted_without_waiting() {
        let dispatcher = Dispatcher::new();
        let mut registry = StreamRegistry::new();

        let mock = Builder::new().wait(Duration::from_secs(5)).build();
        let id = registry.allocate_id();
        registry
            .register(ClientConnection::new(id, peer(), StreamCategory::HandColorRH, Box::new(mock)))
            .unwrap();

        let started = Instant::now();
        let outcome = dispatcher
            .deliver(&frame(StreamCategory::HandColorRH), &mut registry)
            .await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(matches!(outcome, DispatchOutcome::Evicted(SendError::Full)));
        assert!(registry.is_empty());
    }
}
