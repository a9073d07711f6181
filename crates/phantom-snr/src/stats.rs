//! Descriptive statistics over masked samples of the raw grid.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, RegionKind};
use crate::grid::{BinaryMask, PixelGrid};

/// Mean, population standard deviation and extrema of a pixel subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionStatistics {
    pub mean: f64,
    /// Population standard deviation (divides by N).
    pub std_dev: f64,
    pub min: u16,
    pub max: u16,
    /// Number of pixels measured.
    pub count: usize,
}

/// Measure the samples of `grid` selected by `mask`.
///
/// Returns [`AnalysisError::EmptyRegion`] when the mask selects nothing.
pub fn region_statistics(
    grid: &PixelGrid,
    mask: &BinaryMask,
) -> Result<RegionStatistics, AnalysisError> {
    if grid.dimensions() != mask.dimensions() {
        let (gw, gh) = grid.dimensions();
        let (mw, mh) = mask.dimensions();
        return Err(AnalysisError::DimensionMismatch {
            grid: [gw, gh],
            mask: [mw, mh],
        });
    }

    let mut count = 0usize;
    let mut sum = 0f64;
    let mut min = u16::MAX;
    let mut max = u16::MIN;
    for (x, y) in mask.selected() {
        let v = grid.get(x, y);
        count += 1;
        sum += v as f64;
        min = min.min(v);
        max = max.max(v);
    }
    if count == 0 {
        return Err(AnalysisError::EmptyRegion {
            region: RegionKind::Unlabeled,
        });
    }

    let mean = sum / count as f64;
    let mut sq_sum = 0f64;
    for (x, y) in mask.selected() {
        let d = grid.get(x, y) as f64 - mean;
        sq_sum += d * d;
    }
    let std_dev = (sq_sum / count as f64).sqrt();

    Ok(RegionStatistics {
        mean,
        std_dev,
        min,
        max,
        count,
    })
}
