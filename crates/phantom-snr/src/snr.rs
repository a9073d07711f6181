//! Signal-to-noise ratio from the two region statistics.

use crate::error::AnalysisError;
use crate::stats::RegionStatistics;

/// `signal.mean / noise.mean`, defined only when the noise region varies.
///
/// A flat noise region (standard deviation zero) yields
/// [`AnalysisError::UndefinedRatio`] instead of an infinite or NaN ratio.
pub fn signal_to_noise(
    signal: &RegionStatistics,
    noise: &RegionStatistics,
) -> Result<f64, AnalysisError> {
    // Non-negative samples with a positive spread always have a positive mean.
    if noise.std_dev <= 0.0 || noise.mean <= 0.0 {
        return Err(AnalysisError::UndefinedRatio {
            noise_std: noise.std_dev,
        });
    }
    Ok(signal.mean / noise.mean)
}
