//! Text-density scoring of candidate regions.

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use crate::params::{ContentParams, DetectorParams};
use crate::raster::PageRaster;

use super::lines::adaptive_threshold_inv;
use super::refine::refine_bbox;
use super::types::{ContentScore, PixelRect};

/// Refine `bbox`, then score it by the number of glyph-sized blobs inside.
pub fn analyze_content(raster: &PageRaster, bbox: PixelRect, params: &DetectorParams) -> ContentScore {
    let refined = refine_bbox(raster, bbox, &params.lines, &params.refine);
    score_content(raster, refined, &params.content)
}

/// Score an already-refined box.
///
/// Components are labelled with 8-connectivity on the adaptively
/// thresholded region; the ruling grid forms one oversized component and
/// drops out of the size bands, while glyphs inside cells are counted.
pub fn score_content(raster: &PageRaster, bbox: PixelRect, params: &ContentParams) -> ContentScore {
    let bbox = bbox.clip_to(raster.width(), raster.height());
    if bbox.is_empty() {
        return ContentScore {
            has_content: false,
            score: 0.0,
            text_regions: 0,
            bbox,
        };
    }

    let gray = raster.gray_region(bbox);
    let binary = adaptive_threshold_inv(&gray, params.threshold_block, params.threshold_offset);
    let text_regions = component_boxes(&binary)
        .iter()
        .filter(|b| is_glyph_sized(b, params))
        .count();

    let score = params
        .tiers
        .iter()
        .find(|tier| text_regions >= tier.min_regions)
        .map_or(0.0, |tier| tier.score);
    let has_content = score > 0.0;
    debug!(?bbox, text_regions, score, "content");

    ContentScore {
        has_content,
        score,
        text_regions,
        bbox,
    }
}

fn is_glyph_sized(b: &PixelRect, params: &ContentParams) -> bool {
    let area = b.area();
    area >= f64::from(params.min_area)
        && area <= f64::from(params.max_area)
        && (params.min_width..=params.max_width).contains(&b.w)
        && (params.min_height..=params.max_height).contains(&b.h)
}

/// Bounding boxes of the 8-connected foreground components of a mask.
fn component_boxes(binary: &GrayImage) -> Vec<PixelRect> {
    let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));
    // (x0, y0, x1, y1) per label, inclusive; label 0 is background.
    let mut extents: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, px) in labels.enumerate_pixels() {
        let label = px.0[0] as usize;
        if label == 0 {
            continue;
        }
        if extents.len() < label {
            extents.resize(label, None);
        }
        let slot = &mut extents[label - 1];
        *slot = Some(match *slot {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    extents
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1)| PixelRect::from_corners(x0, y0, x1 + 1, y1 + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn page() -> RgbImage {
        RgbImage::from_pixel(600, 400, Rgb([255, 255, 255]))
    }

    fn fill(img: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, v: u8) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Rgb([v, v, v]));
            }
        }
    }

    #[test]
    fn counts_glyph_blobs_into_tiers() {
        let mut img = page();
        // 5 x 4 blobs of 6 x 10 px.
        for row in 0..4 {
            for col in 0..5 {
                fill(&mut img, 60 + col * 30, 60 + row * 30, 6, 10, 0);
            }
        }
        let raster = PageRaster::new(0, img, 600.0, 400.0);
        let s = score_content(&raster, PixelRect::new(40, 40, 200, 150), &ContentParams::default());
        assert_eq!(s.text_regions, 20);
        assert!(s.has_content);
        assert_eq!(s.score, 0.7);
    }

    #[test]
    fn empty_region_has_no_content() {
        let raster = PageRaster::new(0, page(), 600.0, 400.0);
        let s = score_content(&raster, PixelRect::new(40, 40, 200, 150), &ContentParams::default());
        assert!(!s.has_content);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.text_regions, 0);
    }

    #[test]
    fn oversized_blobs_are_not_text() {
        let mut img = page();
        // A flat photo-like patch wider than any word.
        fill(&mut img, 50, 50, 520, 200, 120);
        let raster = PageRaster::new(0, img, 600.0, 400.0);
        let s = score_content(&raster, PixelRect::new(30, 30, 560, 240), &ContentParams::default());
        assert_eq!(s.text_regions, 0);
        assert!(!s.has_content);
    }

    #[test]
    fn component_boxes_are_exclusive_extents() {
        let mut bin = GrayImage::new(20, 20);
        for y in 2..5 {
            for x in 3..9 {
                bin.put_pixel(x, y, Luma([255]));
            }
        }
        bin.put_pixel(15, 15, Luma([255]));
        let boxes = component_boxes(&bin);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.contains(&PixelRect::new(3, 2, 6, 3)));
        assert!(boxes.contains(&PixelRect::new(15, 15, 1, 1)));
    }
}
