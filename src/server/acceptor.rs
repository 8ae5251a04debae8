//! Connection acceptor
//!
//! Accepting a subscriber happens in two steps. [`Acceptor::handshake`]
//! reads the stream id and owns nothing but the socket, so the server can
//! run many of them alongside its loop. [`Acceptor::admit`] then runs on the
//! loop itself and is the only step that touches the registry: it turns the
//! socket into a write-only [`ClientConnection`] or drops it without a
//! response.

use std::future::Future;
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;

use crate::error::HandshakeError;
use crate::protocol::{handshake, StreamCategory};
use crate::registry::{ClientConnection, StreamRegistry};

/// A socket whose stream id exchange has finished
#[derive(Debug)]
pub struct Handshake {
    pub socket: TcpStream,
    pub peer_addr: SocketAddr,
    pub result: Result<StreamCategory, HandshakeError>,
}

/// Handshake driver
#[derive(Debug, Clone)]
pub struct Acceptor {
    handshake_timeout: Duration,
    tcp_nodelay: bool,
}

impl Acceptor {
    pub fn new(handshake_timeout: Duration, tcp_nodelay: bool) -> Self {
        Self {
            handshake_timeout,
            tcp_nodelay,
        }
    }

    /// Read the stream id from a new socket
    ///
    /// The returned future borrows nothing, so it can be spawned.
    pub fn handshake(
        &self,
        mut socket: TcpStream,
        peer_addr: SocketAddr,
    ) -> impl Future<Output = Handshake> + Send + 'static {
        let timeout = self.handshake_timeout;
        let tcp_nodelay = self.tcp_nodelay;

        async move {
            let result = match socket.set_nodelay(tcp_nodelay) {
                Ok(()) => handshake::perform(&mut socket, timeout).await,
                Err(e) => Err(HandshakeError::Io(e)),
            };

            Handshake {
                socket,
                peer_addr,
                result,
            }
        }
    }

    /// Register a handshaken socket
    ///
    /// Returns the category the client was bound to. A failed handshake or
    /// a taken category drops the socket.
    pub fn admit(
        &self,
        handshake: Handshake,
        registry: &mut StreamRegistry,
    ) -> Result<StreamCategory, HandshakeError> {
        let category = handshake.result?;

        if registry.is_registered(category) {
            return Err(HandshakeError::CategoryTaken(category));
        }

        let sink = into_write_only(handshake.socket).map_err(HandshakeError::Io)?;
        let conn = ClientConnection::new(
            registry.allocate_id(),
            handshake.peer_addr,
            category,
            Box::new(sink),
        );
        registry.register(conn)?;

        Ok(category)
    }

    /// Handshake and register in one go
    pub async fn accept(
        &self,
        socket: TcpStream,
        peer_addr: SocketAddr,
        registry: &mut StreamRegistry,
    ) -> Result<StreamCategory, HandshakeError> {
        let handshake = self.handshake(socket, peer_addr).await;
        self.admit(handshake, registry)
    }
}

/// Stop reading from the socket; the server only writes frames after the
/// handshake
fn into_write_only(socket: TcpStream) -> std::io::Result<TcpStream> {
    let socket = socket.into_std()?;
    socket.shutdown(Shutdown::Read)?;
    TcpStream::from_std(socket)
}
