//! Multiplexed relay for pose-estimation detection frames
//!
//! An external pose-estimation engine prints a line-oriented event stream
//! (one detection cycle per `new frame` ... `[End]` block). The relay parses
//! that stream, encodes one fixed-layout binary frame per category per
//! cycle, and pushes each frame to the single TCP subscriber registered for
//! that category.
//!
//! ```text
//!  engine stdout ──► EventParser ──► FrameEncoder ──► Dispatcher ──► TCP
//!                                                        ▲
//!  TcpListener ──► Acceptor (4-byte stream id) ──► StreamRegistry
//! ```
//!
//! # Example
//! ```no_run
//! use pose_relay::{RelayServer, ServerConfig};
//! use tokio::io::BufReader;
//!
//! # async fn example() -> pose_relay::error::Result<()> {
//! let mut server = RelayServer::bind(ServerConfig::default()).await?;
//! let upstream = BufReader::new(tokio::io::stdin());
//! server.run(upstream).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod parser;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod stats;
pub mod upstream;

pub use error::{Error, Result};
pub use protocol::StreamCategory;
pub use server::{RelayServer, ServerConfig, StopHandle};
