//! Phantom segmentation: global threshold, external contours, solid fill.
//!
//! Contours come from border following over the 8-connected foreground
//! (`imageproc::contours`). Only outermost borders are kept; filling a contour
//! covers everything it encloses, holes included.

use std::collections::VecDeque;

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::grid::BinaryMask;

/// Configuration for phantom segmentation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Samples strictly above this normalized value are foreground.
    pub threshold: u8,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self { threshold: 80 }
    }
}

/// External boundaries of the foreground components of a mask.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContourSet {
    contours: Vec<Vec<Point<i32>>>,
}

impl ContourSet {
    pub fn new(contours: Vec<Vec<Point<i32>>>) -> Self {
        Self { contours }
    }

    /// Number of contours.
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

}

impl<'a> IntoIterator for &'a ContourSet {
    type Item = &'a Vec<Point<i32>>;
    type IntoIter = std::slice::Iter<'a, Vec<Point<i32>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.contours.iter()
    }
}

/// Output of [`segment_phantom`].
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Thresholded normalized grid.
    pub binary: BinaryMask,
    /// External contours of `binary`.
    pub contours: ContourSet,
    /// Filled contours: the phantom region.
    pub phantom: BinaryMask,
}

/// Foreground where the normalized sample is strictly above `threshold`.
pub fn binarize(normalized: &GrayImage, threshold: u8) -> BinaryMask {
    let (w, h) = normalized.dimensions();
    BinaryMask::from_fn(w, h, |x, y| normalized.get_pixel(x, y)[0] > threshold)
}

/// Outermost borders of the mask's 8-connected foreground components.
///
/// The mask is traced inside a one-pixel background frame, so components
/// touching the image border get a contour like any other.
pub fn external_contours(mask: &BinaryMask) -> ContourSet {
    let (w, h) = mask.dimensions();
    if w == 0 || h == 0 {
        return ContourSet::default();
    }
    let mut padded = GrayImage::new(w + 2, h + 2);
    image::imageops::replace(&mut padded, mask.as_image(), 1, 1);

    let contours = find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            c.points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect::<Vec<_>>()
        })
        .filter(|pts| !pts.is_empty())
        .collect();
    ContourSet::new(contours)
}

/// Solid fill of every contour into a `width` x `height` mask.
///
/// Contour pixels act as walls; everything 4-connected to the outside of the
/// image without crossing a wall stays background. An 8-connected closed
/// border blocks a 4-connected flood, so each contour's interior is filled.
pub fn fill_contours(contours: &ContourSet, width: u32, height: u32) -> BinaryMask {
    if contours.is_empty() || width == 0 || height == 0 {
        return BinaryMask::empty(width, height);
    }

    // One pixel of padding on every side so the flood can wrap around
    // regions touching the image border.
    let pw = width as usize + 2;
    let ph = height as usize + 2;
    let mut wall = vec![false; pw * ph];
    for contour in contours {
        for p in contour {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                wall[(p.y as usize + 1) * pw + p.x as usize + 1] = true;
            }
        }
    }

    let mut outside = vec![false; pw * ph];
    let mut queue = VecDeque::new();
    outside[0] = true;
    queue.push_back(0usize);
    while let Some(idx) = queue.pop_front() {
        let x = idx % pw;
        let y = idx / pw;
        let mut visit = |n: usize| {
            if !wall[n] && !outside[n] {
                outside[n] = true;
                queue.push_back(n);
            }
        };
        if x > 0 {
            visit(idx - 1);
        }
        if x + 1 < pw {
            visit(idx + 1);
        }
        if y > 0 {
            visit(idx - pw);
        }
        if y + 1 < ph {
            visit(idx + pw);
        }
    }

    BinaryMask::from_fn(width, height, |x, y| {
        !outside[(y as usize + 1) * pw + x as usize + 1]
    })
}

/// Threshold, trace and fill the phantom region of a normalized grid.
pub fn segment_phantom(normalized: &GrayImage, config: &SegmentConfig) -> Segmentation {
    let (w, h) = normalized.dimensions();
    let binary = binarize(normalized, config.threshold);
    let contours = external_contours(&binary);
    let phantom = fill_contours(&contours, w, h);

    if contours.is_empty() {
        tracing::warn!(
            "no foreground above threshold {}; phantom mask is empty",
            config.threshold
        );
    } else {
        tracing::debug!(
            "{} external contours, phantom area {} px",
            contours.len(),
            phantom.count()
        );
    }

    Segmentation {
        binary,
        contours,
        phantom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{draw_disk, draw_square};

    #[test]
    fn threshold_is_strict() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, image::Luma([80]));
        img.put_pixel(1, 0, image::Luma([81]));
        img.put_pixel(2, 0, image::Luma([255]));
        let m = binarize(&img, 80);
        assert!(!m.get(0, 0));
        assert!(m.get(1, 0));
        assert!(m.get(2, 0));
    }

    #[test]
    fn blank_image_has_no_contours_and_empty_phantom() {
        let img = GrayImage::new(32, 32);
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert!(seg.contours.is_empty());
        assert!(seg.phantom.is_blank());
        assert_eq!(seg.phantom.dimensions(), (32, 32));
    }

    #[test]
    fn square_yields_one_contour_and_full_area() {
        let img = draw_square(40, 40, 10, 10, 10, 200, 0);
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 100);
        assert_eq!(seg.phantom, seg.binary);
    }

    #[test]
    fn hole_is_filled() {
        let mut img = draw_square(30, 30, 5, 5, 20, 200, 0);
        for y in 10..20 {
            for x in 10..20 {
                img.put_pixel(x, y, image::Luma([0]));
            }
        }
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1, "hole border must not be reported");
        assert_eq!(seg.binary.count(), 400 - 100);
        assert_eq!(seg.phantom.count(), 400);
    }

    #[test]
    fn disjoint_regions_are_unioned() {
        let mut img = draw_square(60, 30, 5, 5, 10, 200, 0);
        for y in 5..15 {
            for x in 40..52 {
                img.put_pixel(x, y, image::Luma([220]));
            }
        }
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 2);
        assert_eq!(seg.phantom.count(), 100 + 120);
    }

    #[test]
    fn region_touching_border_is_filled() {
        let img = draw_square(20, 20, 0, 0, 8, 255, 0);
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 64);
    }

    #[test]
    fn block_on_left_edge_is_traced_and_filled() {
        let img = GrayImage::from_fn(20, 20, |x, y| {
            image::Luma([if x < 8 && (5..15).contains(&y) { 200 } else { 0 }])
        });
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 80);
        assert!((&seg.contours)
            .into_iter()
            .flatten()
            .all(|p| p.x >= 0 && p.y >= 0 && p.x < 20 && p.y < 20));
    }

    #[test]
    fn full_width_band_is_one_region() {
        let img = GrayImage::from_fn(30, 20, |_, y| {
            image::Luma([if (6..14).contains(&y) { 255 } else { 0 }])
        });
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 30 * 8);
        assert_eq!(seg.phantom, seg.binary);
    }

    #[test]
    fn all_foreground_image_is_bounded_by_the_frame() {
        let img = GrayImage::from_pixel(12, 9, image::Luma([255]));
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 12 * 9);
        let pts = &seg.contours.contours[0];
        assert!(pts.contains(&Point::new(0, 0)));
        assert!(pts.contains(&Point::new(11, 8)));
    }

    #[test]
    fn filled_disk_matches_threshold_mask() {
        let img = draw_disk(64, 64, [32.0, 32.0], 20.0, 180, 10);
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom, seg.binary);
    }

    #[test]
    fn single_pixel_component() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, image::Luma([255]));
        let seg = segment_phantom(&img, &SegmentConfig::default());
        assert_eq!(seg.contours.len(), 1);
        assert_eq!(seg.phantom.count(), 1);
        assert!(seg.phantom.get(4, 4));
    }
}
