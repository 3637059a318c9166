//! # Frame model

use bytemuck::{Pod, Zeroable};
use std::time::SystemTime;

/// RGBA colour structure.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Convert from a slice containing `[r, g, b]` elements.
    pub fn from_rgb_slice(rgb: &[u8]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: 255,
        }
    }

    /// Opaque grey pixel of the given intensity.
    pub fn grey(v: u8) -> Self {
        Self {
            r: v,
            g: v,
            b: v,
            a: 255,
        }
    }

    /// Perceptual intensity of the pixel (ITU-R BT.601 luma).
    pub fn luma(&self) -> u8 {
        let y = 0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}

/// An immutable captured frame.
///
/// The pixel buffer is row-major RGBA, `width * height` entries. Ownership of
/// a frame passes through the pipeline once per cycle; nothing keeps a frame
/// alive past the cycle it was read in, except for copies persisted to
/// storage.
#[derive(Clone, Debug)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<Rgba>,
    captured_at: SystemTime,
}

impl Frame {
    /// Create a frame from a pre-filled pixel buffer.
    ///
    /// The buffer length must be exactly `width * height`.
    pub fn from_pixels(width: usize, height: usize, data: Vec<Rgba>) -> Self {
        assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            data,
            captured_at: SystemTime::now(),
        }
    }

    /// Uniformly grey frame, handy for synthetic sources and tests.
    pub fn filled(width: usize, height: usize, v: u8) -> Self {
        Self::from_pixels(width, height, vec![Rgba::grey(v); width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn captured_at(&self) -> SystemTime {
        self.captured_at
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.data
    }

    /// Raw byte view of the pixel buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Mutable pixel access for frame producers.
    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.data
    }

    /// Single-channel intensity image of a sub-rectangle.
    ///
    /// The caller must pass a rectangle that was validated against this
    /// frame's bounds.
    pub fn luma_crop(&self, x: usize, y: usize, w: usize, h: usize) -> Vec<u8> {
        debug_assert!(x + w <= self.width && y + h <= self.height);
        let mut out = Vec::with_capacity(w * h);
        for row in y..y + h {
            let base = row * self.width + x;
            out.extend(self.data[base..base + w].iter().map(Rgba::luma));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_extremes() {
        assert_eq!(Rgba::grey(0).luma(), 0);
        assert_eq!(Rgba::grey(255).luma(), 255);
        assert_eq!(Rgba::grey(70).luma(), 70);
    }

    #[test]
    fn luma_crop_picks_subrect() {
        let mut frame = Frame::filled(4, 4, 0);
        frame.pixels_mut()[1 * 4 + 2] = Rgba::grey(200);

        let crop = frame.luma_crop(2, 1, 2, 2);
        assert_eq!(crop, vec![200, 0, 0, 0]);
    }

    #[test]
    fn byte_view_is_rgba_packed() {
        let frame = Frame::filled(2, 1, 10);
        assert_eq!(frame.as_bytes(), &[10, 10, 10, 255, 10, 10, 10, 255]);
    }
}
