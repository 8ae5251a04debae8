//! Upstream event parsing
//!
//! The engine prints one block of text per detection cycle. The parser is
//! split into a line classifier ([`line`]), per-category payload parsers
//! ([`payload`]) and the state machine that ties them together
//! ([`state`]), so a change in the engine's text format stays local to the
//! first two.
//!
//! ```text
//!                   "new frame"
//!   Idle ─────────────────────────► CycleOpen
//!    ▲                                 │ "(x, y, score):"
//!    │                                 ▼
//!    │ "[End]"                    AwaitingBody
//!    │ (any state)                     │ "ImageLeftHand:"
//!    │                                 ▼
//!    │                          AwaitingLeftHand
//!    │                                 │ "ImageRightHand:"
//!    │                                 ▼
//!    │                          AwaitingRightHand
//!    │                                 │ "ImageHead:"
//!    │                                 ▼
//!    └──────────────────────────── AwaitingHead
//! ```
//!
//! An awaiting state consumes the next non-marker line as its payload and
//! falls back to `CycleOpen`.

pub mod line;
pub mod payload;
pub mod state;

pub use line::{classify, LineKind};
pub use state::{EventParser, ParserConfig, ParserState};
