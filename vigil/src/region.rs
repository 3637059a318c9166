//! # Detection region handling
//!
//! A region of interest restricts motion evaluation to a sub-rectangle of the
//! frame. Bounds are re-validated every cycle against the current frame size;
//! an absent or invalid region falls back to the full frame.

use serde::{Deserialize, Serialize};

/// Rectangular detection region in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Full-frame rectangle for the given dimensions.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width as i32,
            h: height as i32,
        }
    }

    pub fn area(&self) -> i64 {
        self.w as i64 * self.h as i64
    }

    /// Check the region against frame bounds.
    ///
    /// Valid iff the origin is non-negative, both extents are positive, and
    /// the rectangle lies entirely within the frame.
    pub fn validate(&self, frame_width: usize, frame_height: usize) -> bool {
        if self.x < 0 || self.y < 0 || self.w <= 0 || self.h <= 0 {
            return false;
        }
        self.x as i64 + self.w as i64 <= frame_width as i64
            && self.y as i64 + self.h as i64 <= frame_height as i64
    }
}

/// Resolve the active region for one cycle.
///
/// Returns the configured region when it is valid for the current frame,
/// otherwise the full frame.
pub fn resolve(region: Option<Rect>, frame_width: usize, frame_height: usize) -> Rect {
    match region {
        Some(r) if r.validate(frame_width, frame_height) => r,
        _ => Rect::full(frame_width, frame_height),
    }
}
