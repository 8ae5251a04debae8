//! Event parser state machine
//!
//! Turns upstream lines into completed [`PendingFrame`]s. Every frame
//! produced within one cycle carries the timestamp taken when the cycle
//! opened, so subscribers of different categories can correlate records
//! by timestamp equality.

use std::time::{SystemTime, UNIX_EPOCH};

use super::line::{classify, LineKind};
use super::payload::parse_payload;
use crate::error::{Error, ParseError};
use crate::protocol::constants::{
    DEFAULT_HAND_HEIGHT, DEFAULT_HAND_WIDTH, DEFAULT_HEAD_HEIGHT, DEFAULT_HEAD_WIDTH,
    MAX_PAYLOAD_SIZE,
};
use crate::protocol::{Dimensions, PendingFrame, StreamCategory};

/// Parser state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Between cycles
    Idle,
    /// Cycle open, no category section active
    CycleOpen,
    /// Waiting for the skeleton line
    AwaitingBody,
    /// Waiting for the left-hand pixel line
    AwaitingLeftHand,
    /// Waiting for the right-hand pixel line
    AwaitingRightHand,
    /// Waiting for the head pixel line
    AwaitingHead,
}

impl ParserState {
    /// State entered by a category's start marker
    pub fn awaiting(category: StreamCategory) -> Self {
        match category {
            StreamCategory::ClosestBody => ParserState::AwaitingBody,
            StreamCategory::HandColorLH => ParserState::AwaitingLeftHand,
            StreamCategory::HandColorRH => ParserState::AwaitingRightHand,
            StreamCategory::HeadColor => ParserState::AwaitingHead,
        }
    }

    /// Category whose payload this state waits for
    pub fn category(self) -> Option<StreamCategory> {
        match self {
            ParserState::AwaitingBody => Some(StreamCategory::ClosestBody),
            ParserState::AwaitingLeftHand => Some(StreamCategory::HandColorLH),
            ParserState::AwaitingRightHand => Some(StreamCategory::HandColorRH),
            ParserState::AwaitingHead => Some(StreamCategory::HeadColor),
            ParserState::Idle | ParserState::CycleOpen => None,
        }
    }

    /// Whether a cycle is in progress
    pub fn in_cycle(self) -> bool {
        self != ParserState::Idle
    }
}

/// Parser configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Expected hand crop size
    pub hand_dimensions: Dimensions,
    /// Expected head crop size
    pub head_dimensions: Dimensions,
    /// Emit placeholders at `[End]` for categories the cycle never mentioned
    pub fill_missing_categories: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            hand_dimensions: Dimensions::new(DEFAULT_HAND_WIDTH, DEFAULT_HAND_HEIGHT),
            head_dimensions: Dimensions::new(DEFAULT_HEAD_WIDTH, DEFAULT_HEAD_HEIGHT),
            fill_missing_categories: false,
        }
    }
}

impl ParserConfig {
    /// Image size for `category` (unused for the body)
    pub fn dimensions(&self, category: StreamCategory) -> Dimensions {
        match category {
            StreamCategory::HeadColor => self.head_dimensions,
            _ => self.hand_dimensions,
        }
    }

    /// Check that every image frame fits a length prefix
    pub fn validate(&self) -> crate::error::Result<()> {
        for category in StreamCategory::ALL.into_iter().filter(|c| c.is_image()) {
            let samples = self.dimensions(category).sample_count();
            let size = category.layout().payload_size(samples);
            if size > MAX_PAYLOAD_SIZE {
                return Err(Error::FrameTooLarge { category, size });
            }
        }
        Ok(())
    }
}

/// Bookkeeping for the open cycle
#[derive(Debug, Clone, Copy)]
struct Cycle {
    timestamp: i64,
    /// Categories whose start marker has been seen
    entered: [bool; 4],
    /// Categories that produced a frame
    emitted: [bool; 4],
}

impl Cycle {
    fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            entered: [false; 4],
            emitted: [false; 4],
        }
    }
}

/// Upstream text state machine
pub struct EventParser {
    config: ParserConfig,
    state: ParserState,
    cycle: Option<Cycle>,
    pending: Option<PendingFrame>,
    clock: fn() -> i64,
}

impl EventParser {
    /// Create a parser stamping cycles with the wall clock
    pub fn new(config: ParserConfig) -> Self {
        Self::with_clock(config, unix_timestamp)
    }

    /// Create a parser with a custom cycle timestamp source
    pub fn with_clock(config: ParserConfig, clock: fn() -> i64) -> Self {
        Self {
            config,
            state: ParserState::Idle,
            cycle: None,
            pending: None,
            clock,
        }
    }

    /// Current state
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Timestamp of the open cycle
    pub fn cycle_timestamp(&self) -> Option<i64> {
        self.cycle.map(|c| c.timestamp)
    }

    /// Parser configuration
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Feed one upstream line
    ///
    /// Returns the frames completed by this line, in upstream order. On a
    /// payload error the in-progress frame and the rest of the cycle are
    /// discarded and the parser returns to `Idle`.
    pub fn feed(&mut self, line: &str) -> Result<Vec<PendingFrame>, ParseError> {
        let mut completed = Vec::new();

        match classify(line) {
            LineKind::CycleStart => {
                if self.state.in_cycle() {
                    tracing::debug!("Cycle reopened without end marker");
                    self.end_cycle(&mut completed);
                }
                self.cycle = Some(Cycle::new((self.clock)()));
                self.state = ParserState::CycleOpen;
            }
            LineKind::CategoryStart(category) => {
                self.enter(category, &mut completed);
            }
            LineKind::CycleEnd => {
                self.end_cycle(&mut completed);
            }
            LineKind::Payload(text) => {
                if let Some(frame) = self.consume_payload(text)? {
                    completed.push(frame);
                }
            }
        }

        Ok(completed)
    }

    /// Discard the open cycle and return to `Idle`
    pub fn reset(&mut self) {
        self.pending = None;
        self.cycle = None;
        self.state = ParserState::Idle;
    }

    fn enter(&mut self, category: StreamCategory, completed: &mut Vec<PendingFrame>) {
        if !self.state.in_cycle() {
            tracing::debug!(category = %category, "Category marker outside a cycle ignored");
            return;
        }

        self.close_open(completed);

        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };

        if cycle.entered[category.index()] {
            tracing::warn!(category = %category, "Category repeated within a cycle, ignored");
            self.state = ParserState::CycleOpen;
            return;
        }

        cycle.entered[category.index()] = true;
        self.pending = Some(PendingFrame::placeholder(
            category,
            cycle.timestamp,
            self.config.dimensions(category),
        ));
        self.state = ParserState::awaiting(category);
    }

    fn consume_payload(&mut self, text: &str) -> Result<Option<PendingFrame>, ParseError> {
        let Some(category) = self.state.category() else {
            tracing::trace!(state = ?self.state, "Unexpected upstream line ignored");
            return Ok(None);
        };

        match parse_payload(category, text, self.config.dimensions(category)) {
            Ok(payload) => {
                self.state = ParserState::CycleOpen;
                Ok(self.pending.take().map(|mut frame| {
                    frame.fill(payload);
                    self.mark_emitted(category);
                    frame
                }))
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Complete the open category section with its placeholder payload
    fn close_open(&mut self, completed: &mut Vec<PendingFrame>) {
        if let Some(mut frame) = self.pending.take() {
            tracing::debug!(category = %frame.category, "Section closed without payload");
            frame.finish();
            self.mark_emitted(frame.category);
            completed.push(frame);
        }
        if self.state.in_cycle() {
            self.state = ParserState::CycleOpen;
        }
    }

    fn end_cycle(&mut self, completed: &mut Vec<PendingFrame>) {
        self.close_open(completed);

        if let Some(cycle) = self.cycle.take() {
            if self.config.fill_missing_categories {
                for category in StreamCategory::ALL {
                    if !cycle.emitted[category.index()] {
                        let mut frame = PendingFrame::placeholder(
                            category,
                            cycle.timestamp,
                            self.config.dimensions(category),
                        );
                        frame.finish();
                        completed.push(frame);
                    }
                }
            }
        }

        self.state = ParserState::Idle;
    }

    fn mark_emitted(&mut self, category: StreamCategory) {
        if let Some(cycle) = self.cycle.as_mut() {
            cycle.emitted[category.index()] = true;
        }
    }
}

/// Seconds since the Unix epoch
pub fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
