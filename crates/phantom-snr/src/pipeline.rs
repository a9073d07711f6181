//! End-to-end analysis: normalize → segment → masks → statistics → SNR → render.
//!
//! Only a structurally invalid grid or configuration aborts a run. Empty
//! measurement regions and a flat noise region are recorded on the result
//! and rendered as placeholders.

use image::{GrayImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, RegionKind};
use crate::grid::PixelGrid;
use crate::metadata::Metadata;
use crate::morphology::{build_masks, RegionMasks};
use crate::normalize::normalize;
use crate::render::{render, BitmapFont, GlyphRenderer, RenderInput};
use crate::segment::{segment_phantom, Segmentation};
use crate::snr::signal_to_noise;
use crate::stats::{region_statistics, RegionStatistics};

/// Intermediate products of the segmentation and masking stages.
#[derive(Debug, Clone)]
pub struct Stages {
    pub normalized: GrayImage,
    pub segmentation: Segmentation,
    pub masks: RegionMasks,
}

/// Serializable summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Image dimensions [width, height].
    pub image_size: [u32; 2],
    /// Maximum representable raw sample value.
    pub source_max: u16,
    /// `sequence_name` and `flip_angle`, inlined.
    #[serde(flatten)]
    pub metadata: Metadata,
    /// Number of external contours of the thresholded image.
    pub contour_count: usize,
    /// Pixels in the filled phantom mask.
    pub phantom_area: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<RegionStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<RegionStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snr: Option<f64>,
    /// Recoverable problems encountered during the run.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<String>,
}

/// Result of [`analyze`]: the annotated image plus the measured values.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Annotated RGB image, same size as the input grid.
    pub image: RgbImage,
    pub report: AnalysisReport,
    /// Statistics of the eroded phantom over the raw grid.
    pub signal: Result<RegionStatistics, AnalysisError>,
    /// Statistics of the noise ring over the raw grid.
    pub noise: Result<RegionStatistics, AnalysisError>,
    pub snr: Result<f64, AnalysisError>,
}

impl Analysis {
    /// The SNR, or the reason it could not be computed.
    pub fn require_snr(&self) -> Result<f64, AnalysisError> {
        self.snr.clone()
    }

    /// True when every metric was computed.
    pub fn is_complete(&self) -> bool {
        self.signal.is_ok() && self.noise.is_ok() && self.snr.is_ok()
    }
}

/// Run the segmentation and masking stages only.
pub fn run_stages(grid: &PixelGrid, config: &AnalysisConfig) -> Result<Stages, AnalysisError> {
    let normalized = normalize(grid);
    let segmentation = segment_phantom(&normalized, &config.segment);
    let masks = build_masks(&segmentation.phantom, &config.morphology)?;
    Ok(Stages {
        normalized,
        segmentation,
        masks,
    })
}

fn measure(
    grid: &PixelGrid,
    stages: &Stages,
) -> (
    Result<RegionStatistics, AnalysisError>,
    Result<RegionStatistics, AnalysisError>,
    Result<f64, AnalysisError>,
) {
    let signal = region_statistics(grid, &stages.masks.inner)
        .map_err(|e| e.in_region(RegionKind::Signal));
    let noise = region_statistics(grid, &stages.masks.noise)
        .map_err(|e| e.in_region(RegionKind::Noise));
    let snr = match (&signal, &noise) {
        (Ok(s), Ok(n)) => signal_to_noise(s, n),
        (Err(e), _) | (_, Err(e)) => Err(e.clone()),
    };
    (signal, noise, snr)
}

fn log_summary(report: &AnalysisReport) {
    tracing::info!(
        "Sequence: {}, flip angle: {}, image {}x{}",
        report.metadata.sequence_label(),
        report.metadata.flip_angle_label(),
        report.image_size[0],
        report.image_size[1],
    );
    for (name, stats) in [("Signal", &report.signal), ("Noise", &report.noise)] {
        match stats {
            Some(s) => tracing::info!(
                "{}: std={:.2} mean={:.2} min={} max={} (n={})",
                name,
                s.std_dev,
                s.mean,
                s.min,
                s.max,
                s.count
            ),
            None => tracing::info!("{}: not measured", name),
        }
    }
    match report.snr {
        Some(snr) => tracing::info!("SNR: {:.2}", snr),
        None => tracing::info!("SNR: not computable"),
    }
}

fn run(
    grid: &PixelGrid,
    metadata: &Metadata,
    config: &AnalysisConfig,
    glyphs: &dyn GlyphRenderer,
) -> Result<Analysis, AnalysisError> {
    if grid.is_empty() {
        return Err(AnalysisError::invalid_grid("grid has zero area"));
    }
    config.validate()?;

    let missing = metadata.missing_fields();
    if !missing.is_empty() {
        tracing::warn!("metadata missing: {}", missing.join(", "));
    }

    let stages = run_stages(grid, config)?;
    let (signal, noise, snr) = measure(grid, &stages);

    let mut issues = Vec::new();
    for e in [signal.as_ref().err(), noise.as_ref().err()].into_iter().flatten() {
        tracing::warn!("{}", e);
        issues.push(e.to_string());
    }
    if let Err(e @ AnalysisError::UndefinedRatio { .. }) = &snr {
        tracing::warn!("{}", e);
        issues.push(e.to_string());
    }
    for field in missing {
        issues.push(format!("metadata field '{}' missing", field));
    }

    let (w, h) = grid.dimensions();
    let report = AnalysisReport {
        image_size: [w, h],
        source_max: grid.source_max(),
        metadata: metadata.clone(),
        contour_count: stages.segmentation.contours.len(),
        phantom_area: stages.segmentation.phantom.count(),
        signal: signal.as_ref().ok().copied(),
        noise: noise.as_ref().ok().copied(),
        snr: snr.as_ref().ok().copied(),
        issues,
    };
    log_summary(&report);

    let input = RenderInput {
        normalized: &stages.normalized,
        inner_contours: &stages.masks.inner_contours,
        outer_contours: &stages.masks.outer_contours,
        signal: report.signal.as_ref(),
        noise: report.noise.as_ref(),
        snr: report.snr,
        metadata,
    };
    let image = render(&input, &config.render, glyphs);

    Ok(Analysis {
        image,
        report,
        signal,
        noise,
        snr,
    })
}

/// Analyze one grid with the built-in bitmap font.
pub fn analyze(
    grid: &PixelGrid,
    metadata: &Metadata,
    config: &AnalysisConfig,
) -> Result<Analysis, AnalysisError> {
    run(grid, metadata, config, &BitmapFont::new(config.render.font_scale))
}

/// Reusable analysis entry point holding a configuration and a text backend.
///
/// # Examples
///
/// ```
/// use phantom_snr::{Analyzer, Metadata, PixelGrid};
///
/// let grid = PixelGrid::from_raw(64, 64, vec![0; 64 * 64], 12).unwrap();
/// let analysis = Analyzer::default()
///     .analyze(&grid, &Metadata::new("se", 90.0))
///     .unwrap();
/// assert!(analysis.signal.is_err());
/// assert_eq!(analysis.image.dimensions(), (64, 64));
/// ```
pub struct Analyzer {
    config: AnalysisConfig,
    glyphs: Box<dyn GlyphRenderer>,
}

impl Analyzer {
    /// Analyzer drawing text with the built-in bitmap font.
    pub fn new(config: AnalysisConfig) -> Self {
        let glyphs = Box::new(BitmapFont::new(config.render.font_scale));
        Self { config, glyphs }
    }

    /// Analyzer drawing text with a custom backend, e.g. a TrueType font.
    pub fn with_glyphs(config: AnalysisConfig, glyphs: Box<dyn GlyphRenderer>) -> Self {
        Self { config, glyphs }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, grid: &PixelGrid, metadata: &Metadata) -> Result<Analysis, AnalysisError> {
        run(grid, metadata, &self.config, self.glyphs.as_ref())
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}
