use std::fmt;

use hardsub_types::{LumaFrame, OcrRegion};

/// Immutable view over an 8-bit luminance plane.
#[derive(Clone)]
pub struct LumaPlane<'a> {
    width: u32,
    height: u32,
    stride: usize,
    data: &'a [u8],
}

/// Tightly packed copy of a region read out of a [`LumaPlane`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionPixels {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl<'a> LumaPlane<'a> {
    pub fn from_frame(frame: &'a LumaFrame) -> Self {
        // LumaFrame guarantees the buffer is at least stride * height bytes long.
        Self {
            width: frame.width(),
            height: frame.height(),
            stride: frame.stride(),
            data: frame.data(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Copies `region` out of the plane after clamping it to the plane bounds.
    /// Returns `None` when nothing of the region is left.
    pub(crate) fn region_pixels(&self, region: &OcrRegion) -> Option<RegionPixels> {
        let (x, y, width, height) = clamp_region(region, self.width, self.height)?;
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            let start = (y + row) * self.stride + x;
            data.extend_from_slice(&self.data[start..start + width]);
        }
        Some(RegionPixels {
            width,
            height,
            data,
        })
    }
}

fn clamp_region(
    region: &OcrRegion,
    width: u32,
    height: u32,
) -> Option<(usize, usize, usize, usize)> {
    if region.width <= 0.0 || region.height <= 0.0 {
        return None;
    }
    let max_w = width as f32;
    let max_h = height as f32;
    let x_start = region.x.clamp(0.0, max_w).floor() as usize;
    let y_start = region.y.clamp(0.0, max_h).floor() as usize;
    let x_end = (region.x + region.width).clamp(0.0, max_w).ceil() as usize;
    let y_end = (region.y + region.height).clamp(0.0, max_h).ceil() as usize;
    let width = x_end.saturating_sub(x_start);
    let height = y_end.saturating_sub(y_start);
    if width == 0 || height == 0 {
        return None;
    }
    Some((x_start, y_start, width, height))
}

impl fmt::Debug for LumaPlane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LumaPlane")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.data.len())
            .finish()
    }
}
