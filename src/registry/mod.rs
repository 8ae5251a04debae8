//! Subscriber registry
//!
//! The registry holds at most one subscriber connection per stream
//! category. It is owned by the server loop and passed around by `&mut`;
//! nothing else holds a reference to a connection.
//!
//! # Architecture
//!
//! ```text
//!                          StreamRegistry
//!                  ┌─────────────────────────────┐
//!                  │ connections: HashMap<       │
//!                  │   StreamCategory,           │
//!                  │   ClientConnection {        │
//!                  │     sink (write-only),      │
//!                  │     active, counters        │
//!                  │   }                         │
//!                  │ >                           │
//!                  └──────────────┬──────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!     [Acceptor]             [Dispatcher]            [Dispatcher]
//!     register()             get_mut(category)       remove(id)
//!                            send() ──► TCP          on SendError
//! ```

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{ClientConnection, ConnectionStats, FrameSink};
pub use error::RegistryError;
pub use store::StreamRegistry;
