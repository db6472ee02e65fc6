//! Ruling-line crossings inside a detected table.
//!
//! Each blob of `horizontal AND vertical` is one cell corner; its centroid
//! is reported in page pixels, sorted top to bottom then left to right.

use itertools::Itertools;

use crate::params::LineParams;
use crate::raster::PageRaster;

use super::lines::extract_lines;
use super::regions::outer_regions;
use super::types::PixelRect;

/// Centroids of the line crossings inside `bbox`.
pub fn line_intersections(raster: &PageRaster, bbox: PixelRect, lines: &LineParams) -> Vec<(u32, u32)> {
    let bbox = bbox.clip_to(raster.width(), raster.height());
    if bbox.is_empty() {
        return Vec::new();
    }
    let crossings = extract_lines(raster, bbox, lines).crossings();
    outer_regions(&crossings)
        .iter()
        .map(|region| {
            let (cx, cy) = region.centroid();
            (cx + bbox.x, cy + bbox.y)
        })
        .sorted_by_key(|&(x, y)| (y, x))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn finds_every_grid_corner() {
        let mut img = RgbImage::from_pixel(600, 500, Rgb([255, 255, 255]));
        for i in 0..3u32 {
            for x in 100..500 {
                for t in 0..2 {
                    img.put_pixel(x, 100 + i * 100 + t, Rgb([0, 0, 0]));
                }
            }
        }
        for i in 0..3u32 {
            for y in 100..302 {
                for t in 0..2 {
                    img.put_pixel(100 + i * 199 + t, y, Rgb([0, 0, 0]));
                }
            }
        }
        let raster = PageRaster::new(0, img, 600.0, 500.0);
        let points = line_intersections(&raster, PixelRect::new(90, 90, 420, 222), &LineParams::default());
        assert_eq!(points.len(), 9);
        assert!(points.windows(2).all(|w| (w[0].1, w[0].0) <= (w[1].1, w[1].0)));
        let (x, y) = points[0];
        assert!(x.abs_diff(100) <= 1 && y.abs_diff(100) <= 1);
    }

    #[test]
    fn empty_box_has_no_points() {
        let raster = PageRaster::new(0, RgbImage::new(10, 10), 10.0, 10.0);
        assert!(line_intersections(&raster, PixelRect::new(20, 20, 5, 5), &LineParams::default()).is_empty());
    }
}
