//! phantom-snr: signal-to-noise measurement of an imaging phantom.
//!
//! The pipeline stages are:
//!
//! 1. **Normalize** – linear rescale of raw samples to 8 bits.
//! 2. **Segment** – global threshold, external contours, solid fill.
//! 3. **Morphology** – eroded signal mask, dilated outer mask, noise ring.
//! 4. **Stats** – mean / population std / extrema over the raw samples.
//! 5. **SNR** – signal mean over noise mean, guarded against flat noise.
//! 6. **Render** – contours and annotations on an RGB copy of the image.
//!
//! # Public API
//! - [`analyze`] and [`Analyzer`] run the whole pipeline
//! - [`AnalysisConfig`] for thresholds, structuring element and layout
//! - stage functions are exposed per module for direct use and testing

mod config;
pub mod error;
pub mod grid;
pub mod metadata;
pub mod morphology;
pub mod normalize;
mod pipeline;
pub mod render;
pub mod segment;
pub mod snr;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, RegionKind};
pub use grid::{BinaryMask, Gray16Image, PixelGrid};
pub use metadata::{Metadata, MetadataValue};
pub use morphology::{MorphologyConfig, RegionMasks};
pub use pipeline::{analyze, run_stages, Analysis, AnalysisReport, Analyzer, Stages};
pub use render::{BitmapFont, GlyphRenderer, RenderConfig, SnrAnchor, TrueTypeFont};
pub use segment::{ContourSet, SegmentConfig, Segmentation};
pub use stats::RegionStatistics;
