//! Relay server loop
//!
//! One task owns the listener, the upstream reader, the parser and the
//! registry. Each iteration waits on whichever is ready first:
//!
//! ```text
//!              ┌──────────── stop / shutdown ──────────┐
//!              │                                       ▼
//! upstream ──► next_line ──► EventParser ──► FrameEncoder ──► Dispatcher ──► subscriber
//!                                                             ▲
//! listener ──► accept ──► handshake set ──► Acceptor::admit ──► StreamRegistry
//! ```
//!
//! Handshakes run as tasks in a [`JoinSet`] so a client that connects and
//! stays silent never holds up the loop; their results are admitted back on
//! the loop, which stays the only writer of the registry. Frame writes never
//! wait: a subscriber that cannot take a frame immediately is evicted.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::{Error, HandshakeError, Result};
use crate::parser::{classify, EventParser, LineKind};
use crate::protocol::FrameEncoder;
use crate::registry::StreamRegistry;
use crate::server::acceptor::{Acceptor, Handshake};
use crate::server::config::ServerConfig;
use crate::server::dispatcher::{DispatchOutcome, Dispatcher};
use crate::stats::RelayStats;

/// Cloneable handle that stops a running server
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to exit after the current iteration
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    async fn notified(&self) {
        self.notify.notified().await
    }
}

/// Pose frame relay server
pub struct RelayServer {
    config: ServerConfig,
    listener: TcpListener,
    registry: StreamRegistry,
    parser: EventParser,
    acceptor: Acceptor,
    dispatcher: Dispatcher,
    stats: RelayStats,
    stop: StopHandle,
}

impl RelayServer {
    /// Bind the listening socket
    ///
    /// Fails with [`Error::FrameTooLarge`] if the configured crop sizes do
    /// not fit a frame.
    pub async fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(addr = %local_addr, "Relay server listening");

        Ok(Self {
            parser: EventParser::new(config.parser_config()),
            acceptor: Acceptor::new(config.handshake_timeout, config.tcp_nodelay),
            dispatcher: Dispatcher::new(),
            registry: StreamRegistry::new(),
            stats: RelayStats::new(),
            stop: StopHandle::new(),
            listener,
            config,
        })
    }

    /// Replace the parser, e.g. to inject a clock
    pub fn with_parser(mut self, parser: EventParser) -> Self {
        self.parser = parser;
        self
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get a reference to the stream registry
    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// Handle that stops [`run`](Self::run) from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Relay frames parsed from `upstream` until it closes or the server is
    /// stopped
    ///
    /// Returns [`Error::UpstreamClosed`] when the upstream stream ends.
    pub async fn run<R>(&mut self, upstream: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.run_until(upstream, std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<R, F>(&mut self, upstream: R, shutdown: F) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut lines = upstream.lines();
        let mut ticker = stats_ticker(&self.config);
        let mut handshakes: JoinSet<Handshake> = JoinSet::new();

        let result = loop {
            if self.stop.is_stopped() {
                tracing::info!("Stop requested");
                break Ok(());
            }

            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break Ok(());
                }
                _ = self.stop.notified() => {}
                accepted = self.listener.accept() => match accepted {
                    Ok((socket, peer_addr)) => {
                        tracing::debug!(peer = %peer_addr, "New connection");
                        handshakes.spawn(self.acceptor.handshake(socket, peer_addr));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to accept connection");
                    }
                },
                Some(joined) = handshakes.join_next(), if !handshakes.is_empty() => {
                    self.handle_handshake(joined);
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => self.handle_line(&line).await,
                    Ok(None) => {
                        tracing::warn!("Upstream closed");
                        break Err(Error::UpstreamClosed);
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                        tracing::warn!(error = %e, "Skipping undecodable upstream line");
                    }
                    Err(e) => break Err(Error::Io(e)),
                },
                _ = tick(&mut ticker) => {
                    self.stats.log_summary(self.registry.len());
                }
            }
        };

        self.stats.log_summary(self.registry.len());
        result
    }

    /// Feed one upstream line and dispatch whatever frames it completes
    async fn handle_line(&mut self, line: &str) {
        self.stats.lines_read += 1;
        if classify(line) == LineKind::CycleStart {
            self.stats.cycles += 1;
        }

        let frames = match self.parser.feed(line) {
            Ok(frames) => frames,
            Err(e) => {
                self.stats.parse_errors += 1;
                tracing::warn!(error = %e, "Discarding malformed payload");
                return;
            }
        };

        for frame in frames {
            let encoded = FrameEncoder::encode(&frame);
            let category = encoded.category;
            let size = encoded.len() as u64;

            {
                let counters = self.stats.category_mut(category);
                counters.frames_produced += 1;
                if frame.is_placeholder() {
                    counters.placeholder_frames += 1;
                }
            }

            let outcome = self.dispatcher.deliver(&encoded, &mut self.registry).await;

            let counters = self.stats.category_mut(category);
            match outcome {
                DispatchOutcome::Delivered => {
                    counters.frames_delivered += 1;
                    counters.bytes_sent += size;
                }
                DispatchOutcome::Dropped => counters.frames_dropped += 1,
                DispatchOutcome::Evicted(_) => counters.evictions += 1,
            }
        }
    }

    fn handle_handshake(&mut self, joined: std::result::Result<Handshake, JoinError>) {
        let handshake = match joined {
            Ok(handshake) => handshake,
            Err(e) => {
                self.stats.handshakes_rejected += 1;
                tracing::error!(error = %e, "Handshake task failed");
                return;
            }
        };

        let peer_addr = handshake.peer_addr;
        match self.acceptor.admit(handshake, &mut self.registry) {
            Ok(_) => self.stats.handshakes_accepted += 1,
            Err(e) => {
                self.stats.handshakes_rejected += 1;
                match e {
                    HandshakeError::Io(_) => {
                        tracing::debug!(peer = %peer_addr, error = %e, "Handshake failed")
                    }
                    _ => tracing::warn!(peer = %peer_addr, error = %e, "Connection rejected"),
                }
            }
        }
    }
}

fn stats_ticker(config: &ServerConfig) -> Option<Interval> {
    if config.stats_interval.is_zero() {
        return None;
    }

    let start = tokio::time::Instant::now() + config.stats_interval;
    let mut interval = tokio::time::interval_at(start, config.stats_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(interval)
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio_test::io::Builder;

    use super::*;
    use crate::parser::ParserConfig;
    use crate::protocol::handshake::encode_stream_id;
    use crate::protocol::{DecodedFrame, StreamCategory};

    fn test_config() -> ServerConfig {
        ServerConfig::default()
            .bind("127.0.0.1:0".parse().unwrap())
            .stats_interval(Duration::ZERO)
            .hand_dimensions(2, 2)
            .head_dimensions(2, 2)
    }

    fn fixed_clock() -> i64 {
        1_700_000_000
    }

    async fn server() -> RelayServer {
        let config = test_config();
        let parser = EventParser::with_clock(config.parser_config(), fixed_clock);
        RelayServer::bind(config).await.unwrap().with_parser(parser)
    }

    #[tokio::test]
    async fn test_upstream_eof_is_fatal() {
        let mut server = server().await;
        let upstream = Builder::new().read(b"new frame\n").build();

        let result = server.run(BufReader::new(upstream)).await;

        assert!(matches!(result, Err(Error::UpstreamClosed)));
        assert_eq!(server.stats().cycles, 1);
        assert_eq!(server.stats().lines_read, 1);
    }

    #[tokio::test]
    async fn test_frames_without_subscribers_are_dropped() {
        let mut server = server().await;
        let upstream = Builder::new()
            .read(b"new frame\nImageHead:\nhead unknown\n[End]\n")
            .build();

        let result = server.run(BufReader::new(upstream)).await;

        assert!(matches!(result, Err(Error::UpstreamClosed)));
        let head = server.stats().category(StreamCategory::HeadColor);
        assert_eq!(head.frames_produced, 1);
        assert_eq!(head.frames_dropped, 1);
        assert_eq!(head.placeholder_frames, 1);
    }

    #[tokio::test]
    async fn test_parse_error_is_counted_and_skipped() {
        let mut server = server().await;
        let upstream = Builder::new()
            .read(b"new frame\n(x, y, score):\n1.0 2.0\n[End]\n")
            .build();

        let result = server.run(BufReader::new(upstream)).await;

        assert!(matches!(result, Err(Error::UpstreamClosed)));
        assert_eq!(server.stats().parse_errors, 1);
        assert_eq!(server.stats().total_frames(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_future_stops_loop() {
        let mut server = server().await;
        let (_writer, reader) = tokio::io::duplex(64);

        let result = server
            .run_until(BufReader::new(reader), async {
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_stop_handle_stops_loop() {
        let mut server = server().await;
        let stop = server.stop_handle();
        let (_writer, reader) = tokio::io::duplex(64);

        stop.stop();
        let result = server.run(BufReader::new(reader)).await;

        assert!(result.is_ok());
        assert!(stop.is_stopped());
    }

    #[tokio::test]
    async fn test_subscriber_receives_head_frame() {
        let mut server = server().await;
        let addr = server.local_addr().unwrap();
        let (mut writer, reader) = tokio::io::duplex(1024);

        let mut client = TcpStream::connect(addr).await.unwrap();
        client
            .write_all(&encode_stream_id(StreamCategory::HeadColor))
            .await
            .unwrap();

        let stop = server.stop_handle();
        let relay = async move {
            let result = server.run(BufReader::new(reader)).await;
            (server, result)
        };

        let feed = async move {
            // Give the loop a chance to register the client first
            while !stop.is_stopped() {
                tokio::time::sleep(Duration::from_millis(20)).await;
                writer
                    .write_all(b"new frame\nImageHead:\n1 2 3 4 5 6 7 8 9 10 11 12\n[End]\n")
                    .await
                    .unwrap();

                let mut len = [0u8; 4];
                if tokio::time::timeout(Duration::from_millis(200), client.read_exact(&mut len))
                    .await
                    .is_ok()
                {
                    let len = i32::from_le_bytes(len) as usize;
                    let mut payload = vec![0u8; len];
                    client.read_exact(&mut payload).await.unwrap();
                    stop.stop();
                    return payload;
                }
            }
            Vec::new()
        };

        let ((server, result), payload) = tokio::join!(relay, feed);

        assert!(result.is_ok());
        let frame = DecodedFrame::decode(StreamCategory::HeadColor, &payload).unwrap();
        assert_eq!(frame.timestamp, fixed_clock());
        assert_eq!(frame.code, 4096);
        assert!(server.stats().handshakes_accepted >= 1);
        assert!(server.stats().category(StreamCategory::HeadColor).frames_delivered >= 1);
    }

    #[tokio::test]
    async fn test_bind_rejects_oversized_crops() {
        let config = test_config().head_dimensions(u16::MAX, u16::MAX);

        let result = RelayServer::bind(config).await;

        assert!(matches!(
            result,
            Err(Error::FrameTooLarge {
                category: StreamCategory::HeadColor,
                ..
            })
        ));
    }

    #[test]
    fn test_stop_handle_clones_share_state() {
        let stop = StopHandle::new();
        let other = stop.clone();
        other.stop();
        assert!(stop.is_stopped());
    }

    #[test]
    fn test_parser_config_is_derived() {
        let config = test_config();
        let parser: ParserConfig = config.parser_config();
        assert_eq!(parser.hand_dimensions, config.hand_dimensions);
    }
}
