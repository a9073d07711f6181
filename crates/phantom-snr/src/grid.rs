//! Pixel grid and binary mask containers.
//!
//! [`PixelGrid`] holds the acquired samples together with their maximum
//! representable value. [`BinaryMask`] is a 0/255 byte image used for every
//! region mask the pipeline derives.

use image::{GrayImage, ImageBuffer, Luma};

use crate::error::AnalysisError;

/// 16-bit single-channel image used as the raw sample store.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Mask value for selected pixels.
pub const FOREGROUND: u8 = 255;
/// Mask value for unselected pixels.
pub const BACKGROUND: u8 = 0;

/// Raw acquired samples with a known maximum representable value.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    samples: Gray16Image,
    source_max: u16,
}

impl PixelGrid {
    /// Wrap samples whose native range is `[0, source_max]`.
    pub fn new(samples: Gray16Image, source_max: u16) -> Self {
        Self {
            samples,
            source_max,
        }
    }

    /// Wrap samples stored with `bit_depth` significant bits (1..=16).
    pub fn with_bit_depth(samples: Gray16Image, bit_depth: u8) -> Result<Self, AnalysisError> {
        Ok(Self::new(samples, max_for_bit_depth(bit_depth)?))
    }

    /// Build a grid from a row-major sample buffer.
    pub fn from_raw(
        width: u32,
        height: u32,
        data: Vec<u16>,
        bit_depth: u8,
    ) -> Result<Self, AnalysisError> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(AnalysisError::invalid_grid(format!(
                "buffer holds {} samples, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected
            )));
        }
        let samples = Gray16Image::from_raw(width, height, data)
            .ok_or_else(|| AnalysisError::invalid_grid("buffer does not match dimensions"))?;
        Self::with_bit_depth(samples, bit_depth)
    }

    /// Promote an 8-bit image to a grid with `source_max = 255`.
    pub fn from_gray8(img: &GrayImage) -> Self {
        let (w, h) = img.dimensions();
        let samples = Gray16Image::from_fn(w, h, |x, y| Luma([img.get_pixel(x, y)[0] as u16]));
        Self::new(samples, u8::MAX as u16)
    }

    pub fn width(&self) -> u32 {
        self.samples.width()
    }

    pub fn height(&self) -> u32 {
        self.samples.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.samples.dimensions()
    }

    /// True when the grid has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Maximum representable sample value.
    pub fn source_max(&self) -> u16 {
        self.source_max
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> u16 {
        self.samples.get_pixel(x, y)[0]
    }

    pub fn samples(&self) -> &Gray16Image {
        &self.samples
    }
}

fn max_for_bit_depth(bit_depth: u8) -> Result<u16, AnalysisError> {
    if !(1..=16).contains(&bit_depth) {
        return Err(AnalysisError::invalid_grid(format!(
            "bit depth {} outside 1..=16",
            bit_depth
        )));
    }
    Ok(((1u32 << bit_depth) - 1) as u16)
}

/// Boolean pixel selection stored as a 0/255 byte image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Mask with no pixel selected.
    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Build a mask from a per-pixel predicate.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { FOREGROUND } else { BACKGROUND }])
        }))
    }

    /// Any nonzero pixel becomes foreground.
    pub fn from_gray(mut img: GrayImage) -> Self {
        for p in img.iter_mut() {
            if *p != BACKGROUND {
                *p = FOREGROUND;
            }
        }
        Self(img)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.0.get_pixel(x, y)[0] != BACKGROUND
    }

    /// Number of selected pixels.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&v| v != BACKGROUND).count()
    }

    /// True when no pixel is selected.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&v| v == BACKGROUND)
    }

    /// Coordinates of selected pixels in row-major order.
    pub fn selected(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != BACKGROUND)
            .map(|(x, y, _)| (x, y))
    }

    /// Pixels selected here and not in `other`.
    pub fn difference(&self, other: &BinaryMask) -> Result<BinaryMask, AnalysisError> {
        self.check_same_size(other)?;
        let (w, h) = self.dimensions();
        Ok(Self::from_fn(w, h, |x, y| self.get(x, y) && !other.get(x, y)))
    }

    /// Number of pixels selected in both masks (zero when sizes differ).
    pub fn intersection_count(&self, other: &BinaryMask) -> usize {
        if self.dimensions() != other.dimensions() {
            return 0;
        }
        self.0
            .iter()
            .zip(other.0.iter())
            .filter(|(&a, &b)| a != BACKGROUND && b != BACKGROUND)
            .count()
    }

    /// Pixel-set inclusion. Masks of different sizes are never subsets.
    pub fn is_subset_of(&self, other: &BinaryMask) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(&a, &b)| a == BACKGROUND || b != BACKGROUND)
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    fn check_same_size(&self, other: &BinaryMask) -> Result<(), AnalysisError> {
        if self.dimensions() != other.dimensions() {
            let (gw, gh) = self.dimensions();
            let (mw, mh) = other.dimensions();
            return Err(AnalysisError::DimensionMismatch {
                grid: [gw, gh],
                mask: [mw, mh],
            });
        }
        Ok(())
    }
}
