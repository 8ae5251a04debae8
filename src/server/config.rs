//! Server configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::Result;
use crate::parser::ParserConfig;
use crate::protocol::constants::*;
use crate::protocol::Dimensions;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Time a new client has to send its stream id
    pub handshake_timeout: Duration,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Stats log interval (zero disables)
    pub stats_interval: Duration,

    /// Hand crop size the engine emits
    pub hand_dimensions: Dimensions,

    /// Head crop size the engine emits
    pub head_dimensions: Dimensions,

    /// Emit placeholder frames at cycle end for categories the engine skipped
    ///
    /// Off by default, which assumes the engine prints every category marker
    /// in every cycle so each subscriber still gets one frame per cycle.
    pub fill_missing_categories: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            handshake_timeout: Duration::from_secs(2),
            tcp_nodelay: true, // Frames are latency-bound
            stats_interval: Duration::from_secs(30),
            hand_dimensions: Dimensions::new(DEFAULT_HAND_WIDTH, DEFAULT_HAND_HEIGHT),
            head_dimensions: Dimensions::new(DEFAULT_HEAD_WIDTH, DEFAULT_HEAD_HEIGHT),
            fill_missing_categories: false,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set stats log interval
    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    /// Set TCP_NODELAY on accepted sockets
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Set hand crop size
    pub fn hand_dimensions(mut self, width: u16, height: u16) -> Self {
        self.hand_dimensions = Dimensions::new(width, height);
        self
    }

    /// Set head crop size
    pub fn head_dimensions(mut self, width: u16, height: u16) -> Self {
        self.head_dimensions = Dimensions::new(width, height);
        self
    }

    /// Emit placeholders for categories missing from a cycle
    pub fn fill_missing_categories(mut self, enabled: bool) -> Self {
        self.fill_missing_categories = enabled;
        self
    }

    /// Check that the configured crop sizes produce encodable frames
    pub fn validate(&self) -> Result<()> {
        self.parser_config().validate()
    }

    /// Parser settings derived from this config
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            hand_dimensions: self.hand_dimensions,
            head_dimensions: self.head_dimensions,
            fill_missing_categories: self.fill_missing_categories,
        }
    }
}
