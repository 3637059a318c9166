//! # Screenshot persistence
//!
//! Artifacts are JPEG files named `{prefix}_{YYYYMMDD_HHMMSS}[_{seq}].jpg`,
//! where the prefix says whether the shot was taken manually or by an alert
//! burst, and `seq` is the 1-based burst index.

use crate::frame::Frame;
use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Artifact name prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotKind {
    Manual,
    Alert,
}

impl SnapshotKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Alert => "alert",
        }
    }
}

/// Outcome of an age-based cleanup pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub reclaimed_bytes: u64,
}

/// Writes frames to a screenshot directory.
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    /// Create the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating screenshot dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a frame, returning the artifact path.
    pub fn save(&self, frame: &Frame, kind: SnapshotKind, seq: Option<u32>) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let suffix = seq.map(|s| format!("_{s}")).unwrap_or_default();
        let path = self
            .dir
            .join(format!("{}_{timestamp}{suffix}.jpg", kind.prefix()));

        let img = image::RgbaImage::from_raw(
            frame.width() as u32,
            frame.height() as u32,
            frame.as_bytes().to_vec(),
        )
        .context("frame buffer size mismatch")?;

        // JPEG has no alpha channel.
        image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;

        info!("screenshot saved: {}", path.display());
        Ok(path)
    }

    /// Delete `.jpg` artifacts whose modification time is older than
    /// `max_age`. Individual file errors are skipped; the pass never fails
    /// the pipeline.
    pub fn cleanup_older_than(&self, max_age: Duration) -> Result<CleanupReport> {
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let mut report = CleanupReport::default();

        for entry in std::fs::read_dir(&self.dir)? {
            let Ok(entry) = entry else { continue };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            if modified < cutoff && std::fs::remove_file(&path).is_ok() {
                report.deleted += 1;
                report.reclaimed_bytes += meta.len();
            }
        }

        if report.deleted > 0 {
            info!(
                "cleanup: removed {} screenshots, reclaimed {} bytes",
                report.deleted, report.reclaimed_bytes
            );
        }
        Ok(report)
    }
}
