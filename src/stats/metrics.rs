//! Statistics for the relay loop

use std::time::{Duration, Instant};

use crate::protocol::StreamCategory;

/// Per-category frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryStats {
    /// Frames produced by the parser
    pub frames_produced: u64,
    /// Frames written to a subscriber
    pub frames_delivered: u64,
    /// Frames discarded because no subscriber was registered
    pub frames_dropped: u64,
    /// Frames produced with a zero-filled payload
    pub placeholder_frames: u64,
    /// Subscribers evicted after a failed send
    pub evictions: u64,
    /// Bytes written to subscribers
    pub bytes_sent: u64,
}

/// Relay-wide statistics
#[derive(Debug, Clone)]
pub struct RelayStats {
    /// When the relay started
    pub started_at: Instant,
    /// Detection cycles opened upstream
    pub cycles: u64,
    /// Upstream lines read
    pub lines_read: u64,
    /// Payload lines rejected by the parser
    pub parse_errors: u64,
    /// Clients that completed the handshake
    pub handshakes_accepted: u64,
    /// Clients closed during the handshake
    pub handshakes_rejected: u64,
    categories: [CategoryStats; 4],
}

impl RelayStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            cycles: 0,
            lines_read: 0,
            parse_errors: 0,
            handshakes_accepted: 0,
            handshakes_rejected: 0,
            categories: [CategoryStats::default(); 4],
        }
    }

    /// Counters for one category
    pub fn category(&self, category: StreamCategory) -> &CategoryStats {
        &self.categories[category.index()]
    }

    pub(crate) fn category_mut(&mut self, category: StreamCategory) -> &mut CategoryStats {
        &mut self.categories[category.index()]
    }

    /// Time since the relay started
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Frames produced across all categories
    pub fn total_frames(&self) -> u64 {
        self.categories.iter().map(|c| c.frames_produced).sum()
    }

    /// Frames delivered across all categories
    pub fn total_delivered(&self) -> u64 {
        self.categories.iter().map(|c| c.frames_delivered).sum()
    }

    /// Total bytes written to subscribers
    pub fn total_bytes_sent(&self) -> u64 {
        self.categories.iter().map(|c| c.bytes_sent).sum()
    }

    /// Calculate cycle rate in cycles per second
    pub fn cycle_rate(&self) -> f64 {
        let secs = self.uptime().as_secs_f64();
        if secs > 0.0 {
            self.cycles as f64 / secs
        } else {
            0.0
        }
    }

    /// Log a summary line
    pub fn log_summary(&self, subscribers: usize) {
        tracing::info!(
            cycles = self.cycles,
            cycle_rate = self.cycle_rate(),
            frames = self.total_frames(),
            delivered = self.total_delivered(),
            bytes_sent = self.total_bytes_sent(),
            parse_errors = self.parse_errors,
            subscribers = subscribers,
            "Relay stats"
        );
    }
}

impl Default for RelayStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_stats_new() {
        let stats = RelayStats::new();
        assert_eq!(stats.cycles, 0);
        assert_eq!(stats.parse_errors, 0);
        assert_eq!(stats.total_frames(), 0);
        for category in StreamCategory::ALL {
            assert_eq!(*stats.category(category), CategoryStats::default());
        }
    }

    #[test]
    fn test_totals_sum_categories() {
        let mut stats = RelayStats::new();
        stats.category_mut(StreamCategory::ClosestBody).frames_produced = 3;
        stats.category_mut(StreamCategory::HeadColor).frames_produced = 2;
        stats.category_mut(StreamCategory::HeadColor).frames_delivered = 2;
        stats.category_mut(StreamCategory::HeadColor).bytes_sent = 100;

        assert_eq!(stats.total_frames(), 5);
        assert_eq!(stats.total_delivered(), 2);
        assert_eq!(stats.total_bytes_sent(), 100);
        assert_eq!(stats.category(StreamCategory::HandColorLH).frames_produced, 0);
    }

    #[test]
    fn test_cycle_rate_non_negative() {
        let stats = RelayStats::new();
        assert!(stats.cycle_rate() >= 0.0);
    }
}
