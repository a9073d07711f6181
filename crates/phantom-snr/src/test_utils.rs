//! Synthetic images shared by the unit tests.

use image::{GrayImage, Luma};
use rand::Rng;

use crate::grid::{BinaryMask, PixelGrid};

/// `w` x `h` image with a `side` x `side` square of `fg` at (`x0`, `y0`).
pub(crate) fn draw_square(w: u32, h: u32, x0: u32, y0: u32, side: u32, fg: u8, bg: u8) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let inside = x >= x0 && x < x0 + side && y >= y0 && y < y0 + side;
        Luma([if inside { fg } else { bg }])
    })
}

/// Filled disk of `fg` on `bg`.
pub(crate) fn draw_disk(w: u32, h: u32, center: [f32; 2], radius: f32, fg: u8, bg: u8) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        let dx = x as f32 - center[0];
        let dy = y as f32 - center[1];
        Luma([if dx * dx + dy * dy <= radius * radius {
            fg
        } else {
            bg
        }])
    })
}

/// 8-bit grid of size `size` with a square of `fg` at (`x0`, `x0`).
pub(crate) fn square_grid(size: u32, x0: u32, side: u32, fg: u8, bg: u8) -> PixelGrid {
    PixelGrid::from_gray8(&draw_square(size, size, x0, x0, side, fg, bg))
}

/// Union of `n` random rectangles.
pub(crate) fn random_blobs(rng: &mut impl Rng, w: u32, h: u32, n: usize) -> BinaryMask {
    let rects: Vec<[u32; 4]> = (0..n)
        .map(|_| {
            let x0 = rng.gen_range(0..w);
            let y0 = rng.gen_range(0..h);
            let x1 = (x0 + rng.gen_range(1..=w / 2)).min(w);
            let y1 = (y0 + rng.gen_range(1..=h / 2)).min(h);
            [x0, y0, x1, y1]
        })
        .collect();
    BinaryMask::from_fn(w, h, |x, y| {
        rects
            .iter()
            .any(|r| x >= r[0] && x < r[2] && y >= r[1] && y < r[3])
    })
}
