//! # Vigil motion monitoring library
//!
//! This library implements an unattended capture-and-detect-and-alert pipeline:
//! frames are pulled from a [`source::FrameSource`], a rectangular region of
//! interest is diffed against the previous frame, consecutive positive
//! verdicts are debounced, and a cooldown gate decides whether the confirmed
//! motion becomes an alert with a burst of evidence screenshots.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use vigil::prelude::v1::*;
//! ```
//!
//! The whole pipeline is driven by a single [`monitor::Monitor`] worker;
//! collaborators (a UI, an automation layer) talk to it through commands and
//! consume its event feed.

pub mod burst;
pub mod config;
pub mod debounce;
pub mod detector;
pub mod events;
pub mod frame;
pub mod gate;
#[cfg(test)]
pub(crate) mod mock;
pub mod monitor;
pub mod region;
pub mod source;
pub mod storage;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            config::{MonitorConfig, Preset},
            debounce::Debouncer,
            detector::{MotionDetector, MotionVerdict},
            events::{AlertEvent, AlertHistory, MonitorEvent, StatsSnapshot},
            frame::{Frame, Rgba},
            gate::AlertGate,
            monitor::{Monitor, MonitorState},
            region::Rect,
            source::{open_source, FrameSource, SharedSource, SourceError},
            storage::{ScreenshotStore, SnapshotKind},
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
