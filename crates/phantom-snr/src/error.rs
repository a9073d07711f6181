//! Error taxonomy for the analysis pipeline.

use serde::{Deserialize, Serialize};

/// Which measurement region an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    /// Eroded phantom interior.
    Signal,
    /// Ring between the phantom boundary and its dilation.
    Noise,
    /// Mask passed directly to the statistics calculator.
    Unlabeled,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signal => f.write_str("signal"),
            Self::Noise => f.write_str("noise"),
            Self::Unlabeled => f.write_str("mask"),
        }
    }
}

/// Errors raised while analyzing a phantom image.
///
/// `InvalidGrid` and `InvalidConfig` abort a run. `EmptyRegion` and
/// `UndefinedRatio` are recoverable: the pipeline records them and renders
/// placeholders instead of the missing values.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// The input grid is structurally unusable.
    InvalidGrid {
        /// What is wrong with the grid.
        reason: String,
    },
    /// A mask and the grid it is applied to disagree in size.
    DimensionMismatch {
        /// Grid dimensions [width, height].
        grid: [u32; 2],
        /// Mask dimensions [width, height].
        mask: [u32; 2],
    },
    /// Configuration values that cannot drive the pipeline.
    InvalidConfig(String),
    /// A mask selected zero pixels.
    EmptyRegion {
        /// Region whose mask was empty.
        region: RegionKind,
    },
    /// Noise standard deviation is zero, so the ratio carries no meaning.
    UndefinedRatio {
        /// Observed noise standard deviation.
        noise_std: f64,
    },
}

impl AnalysisError {
    /// Whether the pipeline can continue and render placeholders.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EmptyRegion { .. } | Self::UndefinedRatio { .. })
    }

    pub(crate) fn invalid_grid(reason: impl Into<String>) -> Self {
        Self::InvalidGrid {
            reason: reason.into(),
        }
    }

    /// Re-label an `EmptyRegion` error with the region it came from.
    pub(crate) fn in_region(self, region: RegionKind) -> Self {
        match self {
            Self::EmptyRegion { .. } => Self::EmptyRegion { region },
            other => other,
        }
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGrid { reason } => write!(f, "invalid pixel grid: {}", reason),
            Self::DimensionMismatch { grid, mask } => write!(
                f,
                "mask is {}x{} but grid is {}x{}",
                mask[0], mask[1], grid[0], grid[1]
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            Self::EmptyRegion { region } => write!(f, "{} region selects no pixels", region),
            Self::UndefinedRatio { noise_std } => write!(
                f,
                "SNR undefined: noise standard deviation is {}",
                noise_std
            ),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_are_the_measurement_ones() {
        assert!(AnalysisError::EmptyRegion {
            region: RegionKind::Signal
        }
        .is_recoverable());
        assert!(AnalysisError::UndefinedRatio { noise_std: 0.0 }.is_recoverable());
        assert!(!AnalysisError::invalid_grid("empty").is_recoverable());
        assert!(!AnalysisError::InvalidConfig("even kernel".into()).is_recoverable());
    }

    #[test]
    fn in_region_only_relabels_empty_region() {
        let e = AnalysisError::EmptyRegion {
            region: RegionKind::Unlabeled,
        }
        .in_region(RegionKind::Noise);
        assert_eq!(e.to_string(), "noise region selects no pixels");

        let other = AnalysisError::UndefinedRatio { noise_std: 0.0 }.in_region(RegionKind::Noise);
        assert_eq!(other, AnalysisError::UndefinedRatio { noise_std: 0.0 });
    }
}
