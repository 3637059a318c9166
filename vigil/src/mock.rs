//! Scripted frame source for tests.

use crate::frame::Frame;
use crate::source::{FrameSource, SourceError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Plays back a fixed sequence of reads, then repeats the last good frame
/// (or keeps failing if there was none).
pub struct ScriptedSource {
    script: VecDeque<Result<Frame, ()>>,
    last: Option<Frame>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = Result<Frame, ()>>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            last: None,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared read counter, usable after the source moves into the pipeline.
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<Frame, SourceError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        match self.script.pop_front() {
            Some(Ok(frame)) => {
                self.last = Some(frame.clone());
                Ok(frame)
            }
            Some(Err(())) => Err(SourceError::ReadFailed),
            None => self.last.clone().ok_or(SourceError::ReadFailed),
        }
    }
}
