//! # Monitor configuration
//!
//! A fixed, typed parameter record with documented defaults. The persisted
//! document is JSON; unknown keys are ignored on load, missing keys take the
//! defaults, and saving rewrites the document in full. The pipeline never
//! mutates the configuration; it reads a snapshot at the top of each cycle.

use crate::region::Rect;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inclusive bounds for every tunable numeric parameter, keyed by the field
/// name used in the persisted document. Live updates and preset application
/// are validated against the same table.
pub const PARAM_BOUNDS: &[(&str, f64, f64)] = &[
    ("min_area", 0.0, 1_000_000.0),
    ("threshold", 0.0, 255.0),
    ("blur_kernel", 1.0, 99.0),
    ("dilate_iterations", 0.0, 10.0),
    ("continuous_frames", 1.0, 120.0),
    ("alert_cooldown", 0.0, 3600.0),
    ("cycle_delay", 0.0, 10.0),
    ("max_consecutive_failures", 1.0, 1000.0),
    ("burst_count", 0.0, 20.0),
    ("burst_interval", 0.0, 10.0),
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Source specification: `synthetic:WxH` or a directory of stills.
    /// Hardware camera backends plug in behind [`crate::source::FrameSource`].
    pub camera_id: String,
    /// Minimum foreground component area (px²) that counts as motion.
    pub min_area: u32,
    /// Per-pixel intensity delta above which a pixel is foreground.
    pub threshold: u8,
    /// Side of the smoothing kernel; even values are normalized up by one.
    pub blur_kernel: usize,
    pub dilate_iterations: usize,
    /// Positive verdicts required in a row before motion is confirmed.
    pub continuous_frames: u32,
    /// Minimum seconds between two emitted alerts.
    pub alert_cooldown: f64,
    /// Target seconds per pipeline cycle.
    pub cycle_delay: f64,
    pub region: Option<Rect>,
    /// Read failures tolerated before the reconnect sequence starts.
    pub max_consecutive_failures: u32,
    /// Screenshots captured per alert burst.
    pub burst_count: u32,
    /// Seconds between burst captures.
    pub burst_interval: f64,
    pub screenshot_dir: PathBuf,
    /// Days screenshots are kept before automatic cleanup.
    pub cleanup_days: u32,
    pub presets: BTreeMap<String, Preset>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera_id: "synthetic:640x480".into(),
            min_area: 500,
            threshold: 25,
            blur_kernel: 21,
            dilate_iterations: 2,
            continuous_frames: 3,
            alert_cooldown: 3.0,
            cycle_delay: 0.2,
            region: None,
            max_consecutive_failures: 10,
            burst_count: 3,
            burst_interval: 0.5,
            screenshot_dir: "screenshots".into(),
            cleanup_days: 3,
            presets: BTreeMap::new(),
        }
    }
}

impl MonitorConfig {
    /// Load from a JSON document; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Self =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rewrite the document in full.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    /// Smoothing kernel with the odd-side invariant applied.
    pub fn blur_kernel_normalized(&self) -> usize {
        if self.blur_kernel % 2 == 0 {
            self.blur_kernel + 1
        } else {
            self.blur_kernel
        }
    }

    pub fn cooldown_duration(&self) -> Duration {
        Duration::from_secs_f64(self.alert_cooldown.max(0.0))
    }

    pub fn cycle_duration(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_delay.max(0.0))
    }

    pub fn burst_interval_duration(&self) -> Duration {
        Duration::from_secs_f64(self.burst_interval.max(0.0))
    }

    fn param(&self, key: &str) -> Option<f64> {
        Some(match key {
            "min_area" => self.min_area as f64,
            "threshold" => self.threshold as f64,
            "blur_kernel" => self.blur_kernel as f64,
            "dilate_iterations" => self.dilate_iterations as f64,
            "continuous_frames" => self.continuous_frames as f64,
            "alert_cooldown" => self.alert_cooldown,
            "cycle_delay" => self.cycle_delay,
            "max_consecutive_failures" => self.max_consecutive_failures as f64,
            "burst_count" => self.burst_count as f64,
            "burst_interval" => self.burst_interval,
            _ => return None,
        })
    }

    /// Update one tunable by key, validated against [`PARAM_BOUNDS`].
    ///
    /// On rejection the prior value is retained untouched.
    pub fn set_param(&mut self, key: &str, value: f64) -> Result<()> {
        validate_param(key, value)?;

        match key {
            "min_area" => self.min_area = value as u32,
            "threshold" => self.threshold = value as u8,
            "blur_kernel" => self.blur_kernel = value as usize,
            "dilate_iterations" => self.dilate_iterations = value as usize,
            "continuous_frames" => self.continuous_frames = value as u32,
            "alert_cooldown" => self.alert_cooldown = value,
            "cycle_delay" => self.cycle_delay = value,
            "max_consecutive_failures" => self.max_consecutive_failures = value as u32,
            "burst_count" => self.burst_count = value as u32,
            "burst_interval" => self.burst_interval = value,
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Check every tunable against its bounds.
    pub fn validate(&self) -> Result<()> {
        for (key, lo, hi) in PARAM_BOUNDS {
            let v = self.param(key).unwrap_or_default();
            if !(*lo..=*hi).contains(&v) {
                return Err(anyhow!("{key}={v} outside [{lo}, {hi}]"));
            }
        }
        Ok(())
    }

    /// Snapshot the current tunables as a named preset.
    pub fn save_preset(&mut self, name: &str) {
        let preset = Preset::capture(self);
        self.presets.insert(name.to_string(), preset);
    }

    /// Apply a named preset through the same per-key validation as live
    /// updates; an out-of-range field aborts without partial application.
    pub fn apply_preset(&mut self, name: &str) -> Result<()> {
        let preset = self
            .presets
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("no preset named `{name}`"))?;

        let mut updated = self.clone();
        preset.apply(&mut updated)?;
        *self = updated;
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<()> {
        self.presets
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| anyhow!("no preset named `{name}`"))
    }
}

/// Validate a prospective parameter update against [`PARAM_BOUNDS`] without
/// applying it. Command front-ends use this so an invalid update never
/// reaches the pipeline worker.
pub fn validate_param(key: &str, value: f64) -> Result<()> {
    let (_, lo, hi) = PARAM_BOUNDS
        .iter()
        .find(|(k, _, _)| *k == key)
        .ok_or_else(|| anyhow!("unknown parameter `{key}`"))?;
    if !(*lo..=*hi).contains(&value) {
        return Err(anyhow!("{key}={value} outside [{lo}, {hi}]"));
    }
    Ok(())
}

/// A named subset of the tunable numeric fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_area: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_frames: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_cooldown: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_delay: Option<f64>,
}

impl Preset {
    pub fn capture(cfg: &MonitorConfig) -> Self {
        Self {
            min_area: Some(cfg.min_area),
            continuous_frames: Some(cfg.continuous_frames),
            threshold: Some(cfg.threshold),
            alert_cooldown: Some(cfg.alert_cooldown),
            cycle_delay: Some(cfg.cycle_delay),
        }
    }

    pub fn apply(&self, cfg: &mut MonitorConfig) -> Result<()> {
        if let Some(v) = self.min_area {
            cfg.set_param("min_area", v as f64)?;
        }
        if let Some(v) = self.continuous_frames {
            cfg.set_param("continuous_frames", v as f64)?;
        }
        if let Some(v) = self.threshold {
            cfg.set_param("threshold", v as f64)?;
        }
        if let Some(v) = self.alert_cooldown {
            cfg.set_param("alert_cooldown", v)?;
        }
        if let Some(v) = self.cycle_delay {
            cfg.set_param("cycle_delay", v)?;
        }
        Ok(())
    }
}

/// Suggested `min_area` slider range and recommended value for a region of
/// the given area, scaled so small regions stay sensitive and large ones do
/// not alert on trivia.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensitivityRange {
    pub min: u32,
    pub max: u32,
    pub recommended: u32,
}

pub fn sensitivity_range(roi_area: i64) -> SensitivityRange {
    let (min, max, factor) = if roi_area < 1000 {
        (50, 500, 0.2)
    } else if roi_area < 5000 {
        (200, 1000, 0.15)
    } else {
        (500, 2000, 0.1)
    };
    SensitivityRange {
        min,
        max,
        recommended: (roi_area as f64 * factor) as u32,
    }
}
