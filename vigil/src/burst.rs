//! # Burst capture
//!
//! After an alert fires, a short sequence of additional frames is pulled
//! from the source and persisted as evidence. A failed individual capture is
//! logged and skipped, so the resulting path list may legitimately be shorter
//! than requested, including empty.

use crate::source::SharedSource;
use crate::storage::{ScreenshotStore, SnapshotKind};
use log::warn;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Capture up to `count` frames spaced `interval` apart.
///
/// `running` is checked before every shot; clearing it aborts gracefully and
/// returns the partial results collected so far.
pub fn capture_burst(
    source: &SharedSource,
    store: &ScreenshotStore,
    count: u32,
    interval: Duration,
    running: &AtomicBool,
) -> Vec<PathBuf> {
    let mut paths = Vec::with_capacity(count as usize);

    for seq in 1..=count {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        let frame = match source.lock() {
            Ok(mut src) => src.read(),
            Err(_) => break,
        };

        match frame {
            Ok(frame) => match store.save(&frame, SnapshotKind::Alert, Some(seq)) {
                Ok(path) => paths.push(path),
                Err(e) => warn!("burst shot {seq}/{count} not saved: {e}"),
            },
            Err(e) => warn!("burst shot {seq}/{count} not captured: {e}"),
        }

        if seq < count {
            std::thread::sleep(interval);
        }
    }

    paths
}
