//! Bounding-box refinement.
//!
//! Contour-derived candidates tend to be loose (captions and nearby text get
//! swallowed by the dilation). The refiner re-extracts ruling lines around
//! the candidate and snaps the box to the dominant line structure.

use tracing::trace;

use crate::params::{LineParams, RefineParams};
use crate::raster::PageRaster;

use super::lines::extract_lines;
use super::regions::outer_regions;
use super::types::PixelRect;

/// Tighten `bbox` to the line structure in and around it.
///
/// The result is clipped to the raster. It is either a padded snap to the
/// largest line component, or the original box when refinement would keep
/// too little of it.
pub fn refine_bbox(
    raster: &PageRaster,
    bbox: PixelRect,
    lines: &LineParams,
    params: &RefineParams,
) -> PixelRect {
    let (page_w, page_h) = (raster.width(), raster.height());
    let initial = bbox.clip_to(page_w, page_h);
    if initial.is_empty() || initial.w < params.min_width || initial.h < params.min_height {
        return initial;
    }

    let search = initial.expand(params.search_margin, page_w, page_h);
    let union = extract_lines(raster, search, lines).union();
    let Some(main) = outer_regions(&union)
        .into_iter()
        .max_by(|a, b| a.area.total_cmp(&b.area))
    else {
        return initial;
    };

    let refined = main
        .bbox
        .offset(search.x, search.y)
        .expand(params.padding, page_w, page_h);
    if refined.w <= params.min_refined_width || refined.h <= params.min_refined_height {
        trace!(?initial, ?refined, "refined box too small, keeping candidate");
        return initial;
    }

    let retained = refined.area() / initial.area();
    if retained < params.min_area_retained {
        trace!(?initial, ?refined, retained, "refinement too aggressive");
        return initial.expand(params.fallback_padding, page_w, page_h);
    }
    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn draw(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgb([0, 0, 0]));
            }
        }
    }

    fn grid_page() -> PageRaster {
        let mut img = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
        for i in 0..4 {
            draw(&mut img, 150, 150 + i * 80, 400, 2);
        }
        for i in 0..3 {
            draw(&mut img, 150 + i * 199, 150, 2, 242);
        }
        PageRaster::new(0, img, 800.0, 600.0)
    }

    #[test]
    fn snaps_loose_box_to_grid() {
        let raster = grid_page();
        let refined = refine_bbox(
            &raster,
            PixelRect::new(120, 120, 460, 300),
            &LineParams::default(),
            &RefineParams::default(),
        );
        assert_eq!(refined, PixelRect::new(142, 142, 416, 258));
    }

    #[test]
    fn small_candidates_are_left_alone() {
        let raster = grid_page();
        let bbox = PixelRect::new(10, 10, 150, 90);
        let refined = refine_bbox(
            &raster,
            bbox,
            &LineParams::default(),
            &RefineParams::default(),
        );
        assert_eq!(refined, bbox);
    }

    #[test]
    fn box_without_lines_is_kept() {
        let img = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
        let raster = PageRaster::new(0, img, 800.0, 600.0);
        let bbox = PixelRect::new(100, 100, 300, 200);
        let refined = refine_bbox(
            &raster,
            bbox,
            &LineParams::default(),
            &RefineParams::default(),
        );
        assert_eq!(refined, bbox);
    }

    #[test]
    fn aggressive_refinement_falls_back_to_padded_candidate() {
        // A lone corner inside a big box: the snap would keep a small patch.
        let mut img = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
        draw(&mut img, 100, 300, 170, 2);
        draw(&mut img, 100, 300, 2, 170);
        let raster = PageRaster::new(0, img, 800.0, 600.0);
        let refined = refine_bbox(
            &raster,
            PixelRect::new(100, 100, 600, 400),
            &LineParams::default(),
            &RefineParams::default(),
        );
        // 186 x 186 keeps under a third of the area: back to the padded box.
        assert_eq!(refined, PixelRect::new(95, 95, 610, 410));
    }

    #[test]
    fn straddling_box_is_clipped() {
        let raster = grid_page();
        let refined = refine_bbox(
            &raster,
            PixelRect::new(700, 100, 300, 100),
            &LineParams::default(),
            &RefineParams::default(),
        );
        assert!(refined.right() <= raster.width());
        assert!(refined.bottom() <= raster.height());
        assert!(!refined.is_empty());
    }
}
