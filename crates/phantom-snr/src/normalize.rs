//! Linear rescaling of raw samples to the 8-bit working range.

use image::{GrayImage, Luma};

use crate::grid::PixelGrid;

/// Upper bound of the normalized range.
pub const TARGET_MAX: u8 = u8::MAX;

/// Rescale `grid` to `[0, 255]` preserving relative intensities.
///
/// Each sample maps to `round(255 * raw / source_max)`; samples above
/// `source_max` saturate. A grid whose `source_max` is zero normalizes to
/// all zeros.
pub fn normalize(grid: &PixelGrid) -> GrayImage {
    let (w, h) = grid.dimensions();
    let source_max = grid.source_max();
    if source_max == 0 {
        tracing::warn!("source maximum is zero; normalized grid is blank");
        return GrayImage::new(w, h);
    }

    let scale = TARGET_MAX as f64 / source_max as f64;
    let mut lut = Vec::with_capacity(source_max as usize + 1);
    for raw in 0..=source_max {
        lut.push((raw as f64 * scale).round().min(TARGET_MAX as f64) as u8);
    }

    GrayImage::from_fn(w, h, |x, y| {
        let raw = grid.get(x, y);
        Luma([lut.get(raw as usize).copied().unwrap_or(TARGET_MAX)])
    })
}
