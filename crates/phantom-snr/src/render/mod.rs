//! Annotated visualization of an analysis run.
//!
//! The normalized grid is expanded to RGB, the inner and outer contours are
//! outlined and the statistics, metadata and SNR are written on top. The
//! output is a fresh buffer; inputs are only borrowed.

pub mod font;
pub mod layout;

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use imageproc::point::Point;

use crate::metadata::Metadata;
use crate::segment::ContourSet;
use crate::stats::RegionStatistics;

pub use font::{BitmapFont, GlyphRenderer, TrueTypeFont};
pub use layout::{layout_annotations, SnrAnchor, TextPlacement};

/// Colors and text layout for the overlay.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Distance of text from the left/right image edges (pixels).
    pub margin: i32,
    /// Vertical distance between consecutive baselines (pixels).
    pub line_spacing: i32,
    /// Distance of the bottom footer baseline from the image bottom (pixels).
    pub footer_offset: i32,
    /// Horizontal placement rule for the SNR label.
    pub snr_anchor: SnrAnchor,
    /// RGB color of the eroded (signal) contour.
    pub inner_color: [u8; 3],
    /// RGB color of the dilated contour.
    pub outer_color: [u8; 3],
    /// RGB color of the annotation text.
    pub text_color: [u8; 3],
    /// Integer scale of the built-in bitmap font.
    pub font_scale: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            margin: 10,
            line_spacing: 20,
            footer_offset: 20,
            snr_anchor: SnrAnchor::OwnWidth,
            inner_color: [0, 0, 255],
            outer_color: [255, 0, 0],
            text_color: [255, 255, 255],
            font_scale: 1,
        }
    }
}

/// Everything the renderer draws.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub normalized: &'a GrayImage,
    pub inner_contours: &'a ContourSet,
    pub outer_contours: &'a ContourSet,
    pub signal: Option<&'a RegionStatistics>,
    pub noise: Option<&'a RegionStatistics>,
    pub snr: Option<f64>,
    pub metadata: &'a Metadata,
}

/// Expand a grayscale image to three equal channels.
pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    let (w, h) = gray.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Outline each contour as a closed 1-pixel polyline.
pub fn draw_contours(canvas: &mut RgbImage, contours: &ContourSet, color: Rgb<u8>) {
    for contour in contours {
        match contour.as_slice() {
            [] => {}
            [p] => put_clipped(canvas, *p, color),
            pts => {
                for (i, a) in pts.iter().enumerate() {
                    let b = pts[(i + 1) % pts.len()];
                    draw_line_segment_mut(
                        canvas,
                        (a.x as f32, a.y as f32),
                        (b.x as f32, b.y as f32),
                        color,
                    );
                }
            }
        }
    }
}

fn put_clipped(canvas: &mut RgbImage, p: Point<i32>, color: Rgb<u8>) {
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
        canvas.put_pixel(p.x as u32, p.y as u32, color);
    }
}

/// Compose the annotated RGB image.
pub fn render(input: &RenderInput<'_>, config: &RenderConfig, glyphs: &dyn GlyphRenderer) -> RgbImage {
    let mut canvas = gray_to_rgb(input.normalized);
    draw_contours(&mut canvas, input.inner_contours, Rgb(config.inner_color));
    draw_contours(&mut canvas, input.outer_contours, Rgb(config.outer_color));

    let (w, h) = canvas.dimensions();
    let placements = layout_annotations(
        w,
        h,
        input.signal,
        input.noise,
        input.snr,
        input.metadata,
        config,
        glyphs,
    );
    let text_color = Rgb(config.text_color);
    for line in &placements {
        glyphs.draw_text(&mut canvas, text_color, line.x, line.baseline, &line.text);
    }
    canvas
}
