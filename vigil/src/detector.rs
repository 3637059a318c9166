//! # Frame-differencing motion detector
//!
//! Single-previous-frame difference model: each cycle's processed (cropped,
//! grayscale, blurred) image is compared against the previous cycle's and
//! then replaces it as the baseline. The first frame after (re)initialization
//! only seeds the baseline and can never report motion, since there is
//! nothing to compare against.

use crate::config::MonitorConfig;
use crate::frame::Frame;
use crate::region::Rect;

/// Output of one detector invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct MotionVerdict {
    pub detected: bool,
    /// Area of the largest foreground component seen, for diagnostics.
    pub contour_area_max: i64,
}

struct GrayBuf {
    w: usize,
    h: usize,
    data: Vec<u8>,
}

/// Stateful frame-difference engine.
///
/// Holds the previous processed image and the region it was cropped to. A
/// region change clears the baseline, so two frames cropped to different
/// rectangles are never compared against each other.
#[derive(Default)]
pub struct MotionDetector {
    baseline: Option<GrayBuf>,
    region: Option<Rect>,
}

impl MotionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the baseline; the next frame reseeds it.
    pub fn reset(&mut self) {
        self.baseline = None;
        self.region = None;
    }

    pub fn is_seeded(&self) -> bool {
        self.baseline.is_some()
    }

    /// Evaluate one frame restricted to `region`.
    ///
    /// `region` must be valid for the frame (see [`crate::region::resolve`]).
    pub fn detect(&mut self, frame: &Frame, region: Rect, cfg: &MonitorConfig) -> MotionVerdict {
        if self.region != Some(region) {
            self.baseline = None;
            self.region = Some(region);
        }

        let (x, y) = (region.x as usize, region.y as usize);
        let (w, h) = (region.w as usize, region.h as usize);

        let gray = frame.luma_crop(x, y, w, h);
        let gray = box_blur(&gray, w, h, cfg.blur_kernel_normalized());
        let processed = GrayBuf { w, h, data: gray };

        let prev = match self.baseline.take() {
            Some(prev) if prev.w == w && prev.h == h => prev,
            // Empty or stale-shaped baseline: seed only.
            _ => {
                self.baseline = Some(processed);
                return MotionVerdict::default();
            }
        };

        let mut mask: Vec<bool> = prev
            .data
            .iter()
            .zip(&processed.data)
            .map(|(&a, &b)| a.abs_diff(b) > cfg.threshold)
            .collect();
        self.baseline = Some(processed);

        for _ in 0..cfg.dilate_iterations {
            dilate(&mut mask, w, h);
        }

        largest_component(&mut mask, w, h, cfg.min_area as i64)
    }
}

/// Square averaging blur with a clamped window, used to suppress sensor
/// noise before differencing. `kernel` is odd; 1 disables smoothing.
fn box_blur(src: &[u8], w: usize, h: usize, kernel: usize) -> Vec<u8> {
    if kernel <= 1 || src.is_empty() {
        return src.to_vec();
    }
    let r = kernel / 2;

    let pass = |src: &[u8], major: usize, minor: usize, stride: usize, step: usize| {
        let mut out = vec![0u8; src.len()];
        for j in 0..minor {
            for i in 0..major {
                let lo = i.saturating_sub(r);
                let hi = (i + r).min(major - 1);
                let sum: u32 = (lo..=hi).map(|k| src[j * stride + k * step] as u32).sum();
                out[j * stride + i * step] = (sum / (hi - lo + 1) as u32) as u8;
            }
        }
        out
    };

    // Separable: horizontal rows, then vertical columns.
    let tmp = pass(src, w, h, w, 1);
    pass(&tmp, h, w, 1, w)
}

/// Grow foreground by one pixel in all 8 directions.
fn dilate(mask: &mut [bool], w: usize, h: usize) {
    let src = mask.to_vec();
    for y in 0..h {
        for x in 0..w {
            if src[y * w + x] {
                continue;
            }
            let ys = y.saturating_sub(1)..=(y + 1).min(h - 1);
            'grow: for ny in ys {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if src[ny * w + nx] {
                        mask[y * w + x] = true;
                        break 'grow;
                    }
                }
            }
        }
    }
}

/// Flood-fill the foreground mask into 8-connected components.
///
/// Short-circuits as soon as one component's area strictly exceeds
/// `min_area`; only the boolean matters, not which component qualified.
/// Consumes the mask.
fn largest_component(mask: &mut [bool], w: usize, h: usize, min_area: i64) -> MotionVerdict {
    let mut verdict = MotionVerdict::default();

    for start in 0..mask.len() {
        if !mask[start] {
            continue;
        }

        let mut area = 0i64;
        mask[start] = false;
        let mut to_fill = vec![(start % w, start / w)];

        while let Some((x, y)) = to_fill.pop() {
            area += 1;

            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if mask[ny * w + nx] {
                        mask[ny * w + nx] = false;
                        to_fill.push((nx, ny));
                    }
                }
            }
        }

        verdict.contour_area_max = verdict.contour_area_max.max(area);
        if area > min_area {
            verdict.detected = true;
            break;
        }
    }

    verdict
}
