//! Structural validation of candidates from ruling-line evidence.

use tracing::debug;

use crate::params::{LineParams, StructureParams};
use crate::raster::PageRaster;

use super::lines::{LineMasks, count_foreground, extract_lines};
use super::regions::outer_regions;
use super::types::{PixelRect, StructureScore};

/// Score how much the candidate looks like a ruled table.
///
/// Line masks are recomputed inside the candidate so that strokes from the
/// rest of the page do not count. The bar is deliberately low: line
/// extraction on scans is noisy, and content analysis filters independently.
pub fn validate_structure(
    raster: &PageRaster,
    bbox: PixelRect,
    lines: &LineParams,
    params: &StructureParams,
) -> StructureScore {
    let bbox = bbox.clip_to(raster.width(), raster.height());
    if bbox.is_empty() || raster.is_empty() {
        return StructureScore::default();
    }
    let masks = extract_lines(raster, bbox, lines);
    score_masks(&masks, bbox, raster.area(), params)
}

pub(crate) fn score_masks(
    masks: &LineMasks,
    bbox: PixelRect,
    page_area: f64,
    params: &StructureParams,
) -> StructureScore {
    let min_h_len = f64::from(bbox.w) * params.min_line_fraction;
    let min_v_len = f64::from(bbox.h) * params.min_line_fraction;

    let horizontal_lines = outer_regions(&masks.horizontal)
        .iter()
        .filter(|r| f64::from(r.bbox.w) >= min_h_len && r.bbox.h <= params.max_line_thickness)
        .count();
    let vertical_lines = outer_regions(&masks.vertical)
        .iter()
        .filter(|r| f64::from(r.bbox.h) >= min_v_len && r.bbox.w <= params.max_line_thickness)
        .count();
    let intersection_pixels = count_foreground(&masks.crossings());

    let area_ratio = if page_area > 0.0 {
        bbox.area() / page_area
    } else {
        0.0
    };
    let aspect = bbox.aspect_ratio();

    let mut score = 0.0;
    if horizontal_lines >= 1 || vertical_lines >= 1 {
        score += params.line_weight;
    }
    if intersection_pixels > 0 {
        score += params.intersection_weight;
    }
    if (params.min_area_ratio..=params.max_area_ratio).contains(&area_ratio) {
        score += params.area_weight;
    }
    if (params.min_aspect..=params.max_aspect).contains(&aspect) {
        score += params.aspect_weight;
    }
    if horizontal_lines >= params.grid_min_horizontal && vertical_lines >= params.grid_min_vertical
    {
        score += params.grid_bonus;
    }
    let score: f64 = score.clamp(0.0, 1.0);
    let is_valid = score >= params.min_score;

    debug!(
        ?bbox,
        horizontal_lines, vertical_lines, intersection_pixels, score, is_valid, "structure"
    );

    StructureScore {
        is_valid,
        score,
        horizontal_lines,
        vertical_lines,
        intersection_pixels,
    }
}
