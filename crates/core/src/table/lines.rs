//! Ruling-line extraction from page rasters.
//!
//! Turns a (sub-region of a) page into two binary masks, one holding long
//! horizontal strokes and one holding long vertical strokes. Pixels are 255
//! for foreground and 0 for background throughout.

use image::{GrayImage, Luma};
use imageproc::filter::{self, gaussian_blur_f32};

use crate::params::LineParams;
use crate::raster::PageRaster;

use super::types::PixelRect;

pub(crate) const FOREGROUND: u8 = 255;

/// Horizontal and vertical ruling-line masks of one region.
#[derive(Clone, Debug)]
pub struct LineMasks {
    pub horizontal: GrayImage,
    pub vertical: GrayImage,
}

impl LineMasks {
    pub fn width(&self) -> u32 {
        self.horizontal.width()
    }

    pub fn height(&self) -> u32 {
        self.horizontal.height()
    }

    /// Equal-weight blend of both masks: 128 on single-direction lines,
    /// 255 where lines cross.
    pub fn structure(&self) -> GrayImage {
        zip_masks(&self.horizontal, &self.vertical, |h, v| {
            let sum = u16::from(h) + u16::from(v);
            // Half of each, rounded half up.
            sum.div_ceil(2) as u8
        })
    }

    /// Pixels on either kind of line.
    pub fn union(&self) -> GrayImage {
        zip_masks(&self.horizontal, &self.vertical, |h, v| h.max(v))
    }

    /// Pixels on both kinds of line.
    pub fn crossings(&self) -> GrayImage {
        zip_masks(&self.horizontal, &self.vertical, |h, v| h.min(v))
    }
}

fn zip_masks(a: &GrayImage, b: &GrayImage, f: impl Fn(u8, u8) -> u8) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for ((o, pa), pb) in out.iter_mut().zip(a.iter()).zip(b.iter()) {
        *o = f(*pa, *pb);
    }
    out
}

/// Extract ruling-line masks from `region` of the raster.
///
/// The region is clipped to the raster first; an empty region yields empty
/// masks.
pub fn extract_lines(raster: &PageRaster, region: PixelRect, params: &LineParams) -> LineMasks {
    let gray = raster.gray_region(region);
    extract_lines_from_gray(&gray, params)
}

pub(crate) fn extract_lines_from_gray(gray: &GrayImage, params: &LineParams) -> LineMasks {
    if gray.width() == 0 || gray.height() == 0 {
        return LineMasks {
            horizontal: GrayImage::new(gray.width(), gray.height()),
            vertical: GrayImage::new(gray.width(), gray.height()),
        };
    }
    let smoothed = bilateral_filter(
        gray,
        params.smoothing_diameter,
        params.smoothing_sigma_color,
        params.smoothing_sigma_space,
    );
    let binary = adaptive_threshold_inv(&smoothed, params.threshold_block, params.threshold_offset);
    let min_run = params.effective_run();
    LineMasks {
        horizontal: keep_long_runs(&binary, min_run, Axis::Horizontal),
        vertical: keep_long_runs(&binary, min_run, Axis::Vertical),
    }
}

/// Edge-preserving smoothing over a `diameter` pixel window.
///
/// An all-black region is returned as is, since the filter scales color
/// distances by the brightest pixel.
pub(crate) fn bilateral_filter(
    gray: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let flat_black = gray.iter().all(|&v| v == 0);
    if gray.is_empty() || flat_black || diameter < 2 || sigma_color <= 0.0 || sigma_space <= 0.0 {
        return gray.clone();
    }
    filter::bilateral_filter(gray, diameter, sigma_color, sigma_space)
}

/// Locally adaptive inverse threshold.
///
/// A pixel becomes foreground when it is at least `offset` darker than the
/// Gaussian-weighted mean of its `block × block` neighbourhood, so dark
/// strokes on a light background survive uneven illumination.
pub(crate) fn adaptive_threshold_inv(gray: &GrayImage, block: u32, offset: f32) -> GrayImage {
    let block = block.max(3) | 1;
    let sigma = 0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let mean = gaussian_blur_f32(gray, sigma);
    let mut out = GrayImage::new(gray.width(), gray.height());
    for ((o, src), m) in out.iter_mut().zip(gray.iter()).zip(mean.iter()) {
        if f32::from(*src) <= f32::from(*m) - offset {
            *o = FOREGROUND;
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Horizontal,
    Vertical,
}

/// Morphological opening with a one-pixel-thick line element.
///
/// Opening with a line keeps exactly the foreground runs at least as long as
/// the element. Runs touching the region border are measured as if they
/// continued past it: they need only half the length, and a run spanning the
/// whole region always survives.
pub(crate) fn keep_long_runs(binary: &GrayImage, min_run: u32, axis: Axis) -> GrayImage {
    let (w, h) = binary.dimensions();
    let mut out = GrayImage::new(w, h);
    let (outer, inner) = match axis {
        Axis::Horizontal => (h, w),
        Axis::Vertical => (w, h),
    };
    let at = |o: u32, i: u32| match axis {
        Axis::Horizontal => (i, o),
        Axis::Vertical => (o, i),
    };
    let half = min_run.div_ceil(2);

    for o in 0..outer {
        let mut i = 0;
        while i < inner {
            let (x, y) = at(o, i);
            if binary.get_pixel(x, y).0[0] == 0 {
                i += 1;
                continue;
            }
            let start = i;
            while i < inner {
                let (x, y) = at(o, i);
                if binary.get_pixel(x, y).0[0] == 0 {
                    break;
                }
                i += 1;
            }
            let len = i - start;
            let touches_start = start == 0;
            let touches_end = i == inner;
            let keep = len >= min_run
                || (touches_start && touches_end)
                || ((touches_start || touches_end) && len >= half);
            if keep {
                for j in start..i {
                    let (x, y) = at(o, j);
                    out.put_pixel(x, y, Luma([FOREGROUND]));
                }
            }
        }
    }
    out
}

/// Count of foreground pixels in a mask.
pub(crate) fn count_foreground(mask: &GrayImage) -> usize {
    mask.iter().filter(|&&v| v != 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn blank(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgb([0, 0, 0]));
            }
        }
    }

    #[test]
    fn runs_shorter_than_element_are_removed() {
        let mut bin = GrayImage::new(50, 3);
        for x in 5..25 {
            bin.put_pixel(x, 1, Luma([FOREGROUND]));
        }
        for x in 30..40 {
            bin.put_pixel(x, 1, Luma([FOREGROUND]));
        }
        let out = keep_long_runs(&bin, 15, Axis::Horizontal);
        assert_eq!(out.get_pixel(10, 1).0[0], FOREGROUND);
        assert_eq!(out.get_pixel(35, 1).0[0], 0);
    }

    #[test]
    fn full_span_run_survives() {
        let mut bin = GrayImage::new(3, 20);
        for y in 0..20 {
            bin.put_pixel(1, y, Luma([FOREGROUND]));
        }
        let out = keep_long_runs(&bin, 100, Axis::Vertical);
        assert_eq!(count_foreground(&out), 20);
    }

    #[test]
    fn blank_page_has_no_lines() {
        let raster = PageRaster::new(0, blank(300, 200), 300.0, 200.0);
        let masks = extract_lines(&raster, raster.bounds(), &LineParams::default());
        assert_eq!(count_foreground(&masks.horizontal), 0);
        assert_eq!(count_foreground(&masks.vertical), 0);
    }

    #[test]
    fn separates_horizontal_and_vertical_strokes() {
        let mut img = blank(400, 400);
        fill(&mut img, 20, 100, 360, 2);
        fill(&mut img, 200, 20, 2, 360);
        // Text-like blob that must not survive either opening.
        fill(&mut img, 50, 50, 12, 8);
        let raster = PageRaster::new(0, img, 400.0, 400.0);
        let masks = extract_lines(&raster, raster.bounds(), &LineParams::default());

        assert_eq!(masks.horizontal.get_pixel(100, 100).0[0], FOREGROUND);
        assert_eq!(masks.horizontal.get_pixel(200, 300).0[0], 0);
        assert_eq!(masks.vertical.get_pixel(200, 300).0[0], FOREGROUND);
        assert_eq!(masks.vertical.get_pixel(100, 100).0[0], 0);
        assert_eq!(masks.union().get_pixel(55, 54).0[0], 0);
        assert_eq!(masks.crossings().get_pixel(200, 100).0[0], FOREGROUND);
        assert_eq!(masks.structure().get_pixel(100, 100).0[0], 128);
        assert_eq!(masks.structure().get_pixel(200, 100).0[0], 255);
    }

    #[test]
    fn smoothing_keeps_stroke_edges() {
        let mut gray = GrayImage::from_pixel(30, 30, Luma([255]));
        for y in 0..30 {
            for x in 14..16 {
                gray.put_pixel(x, y, Luma([0]));
            }
        }
        let smoothed = bilateral_filter(&gray, 9, 75.0, 75.0);
        assert_eq!(smoothed.dimensions(), (30, 30));
        assert!(smoothed.get_pixel(14, 15).0[0] < 128);
        assert!(smoothed.get_pixel(3, 15).0[0] > 240);

        let black = GrayImage::new(8, 8);
        assert_eq!(bilateral_filter(&black, 9, 75.0, 75.0), black);
    }

    #[test]
    fn adaptive_threshold_ignores_uniform_background() {
        let gray = GrayImage::from_pixel(40, 40, Luma([180]));
        let bin = adaptive_threshold_inv(&gray, 11, 2.0);
        assert_eq!(count_foreground(&bin), 0);
    }
}
