//! Relay server
//!
//! [`RelayServer`] ties the pieces together: it accepts subscribers through
//! the [`Acceptor`](acceptor::Acceptor), reads engine output line by line,
//! and hands finished frames to the [`Dispatcher`](dispatcher::Dispatcher).

pub mod acceptor;
pub mod config;
pub mod dispatcher;
pub mod listener;

pub use acceptor::{Acceptor, Handshake};
pub use config::ServerConfig;
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use listener::{RelayServer, StopHandle};
