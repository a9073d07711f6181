//! Concentric measurement masks derived from the phantom mask.
//!
//! A square structuring element of side `kernel_size` applied `iterations`
//! times is the same as one square of radius `iterations * (kernel_size / 2)`,
//! i.e. an L∞ ball. Erosion and dilation are therefore a single
//! distance-transform threshold in `imageproc::morphology`, and share the
//! 8-adjacency of the contour extractor.

use imageproc::distance_transform::Norm;

use crate::error::AnalysisError;
use crate::grid::BinaryMask;
use crate::segment::{external_contours, ContourSet};

/// Largest L∞ radius the distance transform resolves exactly.
const MAX_RADIUS: u32 = 254;

/// Structuring element and iteration count for the mask builder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MorphologyConfig {
    /// Side length of the square structuring element (odd, >= 1).
    pub kernel_size: u32,
    /// Number of times the element is applied.
    pub iterations: u32,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            kernel_size: 3,
            iterations: 5,
        }
    }
}

impl MorphologyConfig {
    /// Total L∞ radius after all iterations.
    pub fn radius(&self) -> Result<u8, AnalysisError> {
        if self.kernel_size == 0 || self.kernel_size % 2 == 0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "kernel size must be odd and positive, got {}",
                self.kernel_size
            )));
        }
        let radius = (self.kernel_size / 2).saturating_mul(self.iterations);
        if radius > MAX_RADIUS {
            return Err(AnalysisError::InvalidConfig(format!(
                "kernel size {} x {} iterations reaches radius {} (max {})",
                self.kernel_size, self.iterations, radius, MAX_RADIUS
            )));
        }
        Ok(radius as u8)
    }
}

/// Masks and contours derived from one phantom mask.
#[derive(Debug, Clone)]
pub struct RegionMasks {
    /// Eroded phantom: the signal region.
    pub inner: BinaryMask,
    /// Dilated phantom.
    pub outer: BinaryMask,
    /// `outer AND NOT phantom`: the noise region.
    pub noise: BinaryMask,
    /// External contours of `inner`.
    pub inner_contours: ContourSet,
    /// External contours of `outer`.
    pub outer_contours: ContourSet,
}

/// Shrink the mask by the configured element. Pixels outside the image do
/// not erode the region.
pub fn erode(mask: &BinaryMask, config: &MorphologyConfig) -> Result<BinaryMask, AnalysisError> {
    let radius = config.radius()?;
    if radius == 0 || mask.is_blank() {
        return Ok(mask.clone());
    }
    Ok(BinaryMask::from_gray(imageproc::morphology::erode(
        mask.as_image(),
        Norm::LInf,
        radius,
    )))
}

/// Grow the mask by the configured element.
pub fn dilate(mask: &BinaryMask, config: &MorphologyConfig) -> Result<BinaryMask, AnalysisError> {
    let radius = config.radius()?;
    if radius == 0 || mask.is_blank() {
        return Ok(mask.clone());
    }
    Ok(BinaryMask::from_gray(imageproc::morphology::dilate(
        mask.as_image(),
        Norm::LInf,
        radius,
    )))
}

/// Build the inner, outer and noise-ring masks plus the contours to draw.
pub fn build_masks(
    phantom: &BinaryMask,
    config: &MorphologyConfig,
) -> Result<RegionMasks, AnalysisError> {
    let inner = erode(phantom, config)?;
    let outer = dilate(phantom, config)?;
    let noise = outer.difference(phantom)?;
    let inner_contours = external_contours(&inner);
    let outer_contours = external_contours(&outer);

    tracing::debug!(
        "masks: inner={} px, outer={} px, noise={} px",
        inner.count(),
        outer.count(),
        noise.count()
    );

    Ok(RegionMasks {
        inner,
        outer,
        noise,
        inner_contours,
        outer_contours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::random_blobs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square_mask(size: u32, x0: u32, y0: u32, side: u32) -> BinaryMask {
        BinaryMask::from_fn(size, size, |x, y| {
            x >= x0 && x < x0 + side && y >= y0 && y < y0 + side
        })
    }

    #[test]
    fn default_radius_is_five() {
        assert_eq!(MorphologyConfig::default().radius().unwrap(), 5);
    }

    #[test]
    fn invalid_kernels_are_rejected() {
        for kernel_size in [0, 2, 4] {
            let cfg = MorphologyConfig {
                kernel_size,
                iterations: 1,
            };
            assert!(matches!(cfg.radius(), Err(AnalysisError::InvalidConfig(_))));
        }
        let cfg = MorphologyConfig {
            kernel_size: 3,
            iterations: 300,
        };
        assert!(cfg.radius().is_err());
    }

    #[test]
    fn erosion_of_ten_pixel_square_is_empty() {
        let mask = square_mask(40, 10, 10, 10);
        let inner = erode(&mask, &MorphologyConfig::default()).unwrap();
        assert!(inner.is_blank());
    }

    #[test]
    fn erosion_removes_one_layer_per_iteration() {
        let mask = square_mask(60, 10, 10, 30);
        for iterations in 0..6u32 {
            let cfg = MorphologyConfig {
                kernel_size: 3,
                iterations,
            };
            let side = 30 - 2 * iterations as usize;
            assert_eq!(erode(&mask, &cfg).unwrap().count(), side * side);
            let grown = 30 + 2 * iterations as usize;
            assert_eq!(dilate(&mask, &cfg).unwrap().count(), grown * grown);
        }
    }

    #[test]
    fn image_border_does_not_erode() {
        let mask = square_mask(20, 0, 0, 20);
        let inner = erode(&mask, &MorphologyConfig::default()).unwrap();
        assert_eq!(inner.count(), 400);
    }

    #[test]
    fn five_by_five_kernel_doubles_radius() {
        let cfg = MorphologyConfig {
            kernel_size: 5,
            iterations: 2,
        };
        assert_eq!(cfg.radius().unwrap(), 4);
        let mask = square_mask(40, 15, 15, 10);
        assert_eq!(dilate(&mask, &cfg).unwrap().count(), 18 * 18);
    }

    #[test]
    fn inclusion_chain_holds_for_random_masks() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            let mask = random_blobs(&mut rng, 48, 48, 4);
            for iterations in 0..4 {
                let cfg = MorphologyConfig {
                    kernel_size: 3,
                    iterations,
                };
                let inner = erode(&mask, &cfg).unwrap();
                let outer = dilate(&mask, &cfg).unwrap();
                assert!(inner.is_subset_of(&mask));
                assert!(mask.is_subset_of(&outer));
            }
        }
    }

    #[test]
    fn noise_ring_is_disjoint_from_phantom() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            let phantom = random_blobs(&mut rng, 64, 64, 3);
            let masks = build_masks(&phantom, &MorphologyConfig::default()).unwrap();
            assert_eq!(masks.noise.intersection_count(&phantom), 0);
            assert_eq!(masks.noise.count() + phantom.count(), masks.outer.count());
        }
    }

    #[test]
    fn contours_follow_the_masks() {
        let phantom = square_mask(80, 20, 20, 40);
        let masks = build_masks(&phantom, &MorphologyConfig::default()).unwrap();
        assert_eq!(masks.inner_contours.len(), 1);
        assert_eq!(masks.outer_contours.len(), 1);
        assert_eq!(masks.inner.count(), 30 * 30);
        assert_eq!(masks.outer.count(), 50 * 50);
        assert_eq!(masks.noise.count(), 50 * 50 - 40 * 40);
    }

    #[test]
    fn blank_phantom_gives_blank_masks() {
        let phantom = BinaryMask::empty(16, 16);
        let masks = build_masks(&phantom, &MorphologyConfig::default()).unwrap();
        assert!(masks.inner.is_blank());
        assert!(masks.outer.is_blank());
        assert!(masks.noise.is_blank());
        assert!(masks.inner_contours.is_empty());
    }
}
