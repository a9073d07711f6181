//! Placement of the annotation text blocks.
//!
//! Layout is computed separately from drawing so the positions can be
//! checked without rasterizing anything.

use serde::{Deserialize, Serialize};

use super::font::GlyphRenderer;
use super::RenderConfig;
use crate::metadata::{Metadata, PLACEHOLDER};
use crate::stats::RegionStatistics;

/// How the x-position of the SNR footer label is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnrAnchor {
    /// Right-align the SNR label by its own rendered width.
    #[default]
    OwnWidth,
    /// Reuse the width of the last noise line (`Nmax: ...`), which places the
    /// label wherever that line happened to start.
    LastNoiseLine,
}

/// Which block a placed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Block {
    Signal,
    Noise,
    Footer,
}

/// One line of text positioned on the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPlacement {
    pub block: Block,
    pub text: String,
    /// Left edge in pixels.
    pub x: i32,
    /// Baseline in pixels.
    pub baseline: i32,
}

fn stat_lines(prefix: char, stats: Option<&RegionStatistics>) -> [String; 4] {
    match stats {
        Some(s) => [
            format!("{}std: {:.2}", prefix, s.std_dev),
            format!("{}mean: {:.2}", prefix, s.mean),
            format!("{}min: {}", prefix, s.min),
            format!("{}max: {}", prefix, s.max),
        ],
        None => [
            format!("{}std: {}", prefix, PLACEHOLDER),
            format!("{}mean: {}", prefix, PLACEHOLDER),
            format!("{}min: {}", prefix, PLACEHOLDER),
            format!("{}max: {}", prefix, PLACEHOLDER),
        ],
    }
}

/// Footer text for the SNR value.
pub fn snr_label(snr: Option<f64>) -> String {
    match snr {
        Some(v) if v.is_finite() => format!("SNR: {:.2}", v),
        _ => format!("SNR: {}", PLACEHOLDER),
    }
}

/// Position every annotation line for a `width` x `height` canvas.
///
/// Signal lines are left-anchored at the top, noise lines are each
/// right-aligned by their own width, the flip angle and sequence footer sit
/// bottom-left and the SNR label bottom-right according to
/// [`RenderConfig::snr_anchor`].
#[allow(clippy::too_many_arguments)]
pub fn layout_annotations(
    width: u32,
    height: u32,
    signal: Option<&RegionStatistics>,
    noise: Option<&RegionStatistics>,
    snr: Option<f64>,
    metadata: &Metadata,
    config: &RenderConfig,
    glyphs: &dyn GlyphRenderer,
) -> Vec<TextPlacement> {
    let w = width as i32;
    let h = height as i32;
    let mut out = Vec::with_capacity(11);

    let mut baseline = config.line_spacing;
    for text in stat_lines('S', signal) {
        out.push(TextPlacement {
            block: Block::Signal,
            text,
            x: config.margin,
            baseline,
        });
        baseline += config.line_spacing;
    }

    let mut last_noise_width = 0i32;
    let mut baseline = config.line_spacing;
    for text in stat_lines('N', noise) {
        last_noise_width = glyphs.text_size(&text).0 as i32;
        out.push(TextPlacement {
            block: Block::Noise,
            text,
            x: w - last_noise_width - config.margin,
            baseline,
        });
        baseline += config.line_spacing;
    }

    let bottom = h - config.footer_offset;
    out.push(TextPlacement {
        block: Block::Footer,
        text: format!("Flip Ang: {}", metadata.flip_angle_label()),
        x: config.margin,
        baseline: bottom,
    });
    out.push(TextPlacement {
        block: Block::Footer,
        text: format!("Seq: {}", metadata.sequence_label()),
        x: config.margin,
        baseline: bottom - config.line_spacing,
    });

    let text = snr_label(snr);
    let anchor_width = match config.snr_anchor {
        SnrAnchor::OwnWidth => glyphs.text_size(&text).0 as i32,
        SnrAnchor::LastNoiseLine => last_noise_width,
    };
    out.push(TextPlacement {
        block: Block::Footer,
        text,
        x: w - anchor_width - config.margin,
        baseline: bottom,
    });

    out
}
