//! # Frame acquisition
//!
//! Sources are trait objects created from a string specification, so camera
//! backends with system dependencies can live in separate crates and plug in
//! behind the same seam. The library ships two pure sources: a synthetic
//! moving-pattern generator and a looping still-image directory reader.

use crate::frame::{Frame, Rgba};
use log::warn;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Acquisition failure taxonomy.
///
/// `Unavailable` is an open-time failure, `ReadFailed` a per-frame one. A
/// single `ReadFailed` is transient and retried by the caller; only a run of
/// them crossing the configured threshold escalates to reconnection.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("frame read failed")]
    ReadFailed,
}

/// A live producer of frames.
///
/// `read` must use short, bounded waits so the monitor loop stays responsive
/// to cancellation. Closing is dropping the source.
pub trait FrameSource: Send {
    /// Pull the next frame.
    fn read(&mut self) -> Result<Frame, SourceError>;

    /// Native frame dimensions, if known before the first read.
    fn frame_size(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Frame source shared between the monitor worker and spawned burst tasks.
///
/// Burst tasks only read frames through the lock; all other pipeline state
/// stays exclusive to the worker.
pub type SharedSource = Arc<Mutex<Box<dyn FrameSource>>>;

/// Create a frame source from a specification string.
///
/// `synthetic:` (optionally `synthetic:WxH`) creates a pattern generator.
/// Anything else is interpreted as a directory of still images that is read
/// in sorted order and looped.
pub fn open_source(spec: &str) -> Result<Box<dyn FrameSource>, SourceError> {
    if let Some(dims) = spec.strip_prefix("synthetic:") {
        let (w, h) = parse_dims(dims)
            .ok_or_else(|| SourceError::Unavailable(format!("bad dimensions `{dims}`")))?;
        Ok(Box::new(SyntheticSource::new(w, h)))
    } else {
        ImageDirSource::open(spec).map(|s| Box::new(s) as _)
    }
}

fn parse_dims(dims: &str) -> Option<(usize, usize)> {
    if dims.is_empty() {
        return Some((640, 480));
    }
    let (w, h) = dims.split_once('x')?;
    let (w, h) = (w.parse().ok()?, h.parse().ok()?);
    if w == 0 || h == 0 {
        None
    } else {
        Some((w, h))
    }
}

/// Synthetic source: a bright block drifting over a noisy grey floor.
///
/// Useful for demos and soak testing the pipeline without hardware. The block
/// moves a couple of pixels per frame, so a running monitor will keep
/// detecting motion in its path.
pub struct SyntheticSource {
    width: usize,
    height: usize,
    tick: usize,
    rng: StdRng,
}

impl SyntheticSource {
    const BLOCK: usize = 40;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tick: 0,
            rng: StdRng::from_entropy(),
        }
    }
}

impl FrameSource for SyntheticSource {
    fn read(&mut self) -> Result<Frame, SourceError> {
        let mut frame = Frame::filled(self.width, self.height, 0);
        let bx = (self.tick * 3) % self.width.max(1);
        let by = self.height / 2;

        for p in frame.pixels_mut().iter_mut() {
            // Low-amplitude sensor noise, below any sane threshold.
            *p = Rgba::grey(20 + self.rng.gen_range(0..8));
        }
        for y in by..(by + Self::BLOCK).min(self.height) {
            for x in bx..(bx + Self::BLOCK).min(self.width) {
                frame.pixels_mut()[y * self.width + x] = Rgba::grey(230);
            }
        }

        self.tick += 1;
        Ok(frame)
    }

    fn frame_size(&self) -> Option<(usize, usize)> {
        Some((self.width, self.height))
    }
}

/// Still-image directory source.
///
/// Files are sorted by name and looped; a file that fails to decode counts as
/// a read failure for that cycle and is skipped past on the next one.
pub struct ImageDirSource {
    files: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSource {
    pub fn open(dir: &str) -> Result<Self, SourceError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| SourceError::Unavailable(format!("{dir}: {e}")))?;

        let mut files: Vec<_> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("jpg" | "jpeg" | "png")
                )
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SourceError::Unavailable(format!("{dir}: no images")));
        }

        Ok(Self { files, next: 0 })
    }
}

impl FrameSource for ImageDirSource {
    fn read(&mut self) -> Result<Frame, SourceError> {
        let path = &self.files[self.next];
        self.next = (self.next + 1) % self.files.len();

        let img = image::open(path)
            .map_err(|e| {
                warn!("failed to decode {}: {e}", path.display());
                SourceError::ReadFailed
            })?
            .to_rgba8();

        let (w, h) = (img.width() as usize, img.height() as usize);
        let pixels = img
            .pixels()
            .map(|p| Rgba {
                r: p[0],
                g: p[1],
                b: p[2],
                a: p[3],
            })
            .collect();

        Ok(Frame::from_pixels(w, h, pixels))
    }
}
