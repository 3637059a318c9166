//! # Event feed
//!
//! Everything the pipeline wants a collaborator to know flows through
//! [`MonitorEvent`]. Alerts and source loss are delivered over an unbounded
//! channel and are never dropped; high-frequency display frames go through a
//! separate latest-value slot on the monitor instead (see
//! [`crate::monitor::Monitor::latest_frame`]).

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::PathBuf;

/// One fired alert with its evidence.
#[derive(Clone, Debug)]
pub struct AlertEvent {
    pub time: DateTime<Local>,
    /// Debounce run length at the moment the gate fired.
    pub confirmed_frames: u32,
    /// Burst screenshots, in capture order. May be shorter than the
    /// configured burst count when individual captures failed.
    pub screenshot_paths: Vec<PathBuf>,
}

/// Periodic pipeline statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatsSnapshot {
    pub fps: f32,
    pub frames: u64,
    pub alerts: u32,
    /// Current debounce progress out of `continuous_frames`.
    pub debounce: (u32, u32),
}

/// Asynchronous notifications from the monitor worker.
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Alert(AlertEvent),
    /// Reconnect attempts exhausted; the monitor has stopped and will not
    /// restart on its own.
    SourceLost,
    Stats(StatsSnapshot),
}

/// Bounded, append-only alert log: oldest entries are evicted first.
///
/// Owned by the collaborator side; the monitor only emits events.
#[derive(Clone, Debug)]
pub struct AlertHistory {
    cap: usize,
    entries: VecDeque<AlertEvent>,
}

impl Default for AlertHistory {
    fn default() -> Self {
        Self::new(20)
    }
}

impl AlertHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap),
        }
    }

    pub fn push(&mut self, event: AlertEvent) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read-only snapshot, oldest first.
    pub fn snapshot(&self) -> Vec<AlertEvent> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(n: u32) -> AlertEvent {
        AlertEvent {
            time: Local::now(),
            confirmed_frames: n,
            screenshot_paths: vec![],
        }
    }

    #[test]
    fn history_evicts_oldest_beyond_cap() {
        let mut history = AlertHistory::new(3);
        for i in 0..5 {
            history.push(alert(i));
        }
        assert_eq!(history.len(), 3);
        let confirmed: Vec<_> = history
            .snapshot()
            .iter()
            .map(|a| a.confirmed_frames)
            .collect();
        assert_eq!(confirmed, vec![2, 3, 4]);
    }

    #[test]
    fn default_cap_is_twenty() {
        let mut history = AlertHistory::default();
        for i in 0..25 {
            history.push(alert(i));
        }
        assert_eq!(history.len(), 20);
        assert_eq!(history.snapshot()[0].confirmed_frames, 5);
    }
}
