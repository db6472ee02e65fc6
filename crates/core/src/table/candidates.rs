//! Candidate region finding on the table-structure mask.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::morphology::dilate;
use tracing::trace;

use crate::params::CandidateParams;

use super::regions::outer_regions;
use super::types::TableCandidate;

/// Rank rectangle-like regions of the structure mask that could be tables.
///
/// Returns at most `params.max_candidates` candidates, largest first.
pub fn find_candidates(
    structure: &GrayImage,
    min_area: f64,
    params: &CandidateParams,
) -> Vec<TableCandidate> {
    let (w, h) = structure.dimensions();
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let image_area = f64::from(w) * f64::from(h);
    let dilated = if params.dilate_radius > 0 {
        dilate(structure, Norm::LInf, params.dilate_radius)
    } else {
        structure.clone()
    };

    let mut candidates: Vec<TableCandidate> = Vec::new();
    for region in outer_regions(&dilated) {
        if region.area < min_area {
            continue;
        }
        let epsilon = params.approx_epsilon * arc_length(&region.points, true);
        if epsilon <= 0.0 {
            continue;
        }
        let approx = approximate_polygon_dp(&region.points, epsilon, true);
        if approx.len() < params.min_vertices {
            trace!(bbox = ?region.bbox, vertices = approx.len(), "not rectangle-like");
            continue;
        }
        let bbox = region.bbox;
        if bbox.w < params.min_width || bbox.h < params.min_height {
            continue;
        }
        let aspect_ratio = bbox.aspect_ratio();
        if aspect_ratio < params.min_aspect || aspect_ratio > params.max_aspect {
            trace!(bbox = ?bbox, aspect_ratio, "aspect ratio out of band");
            continue;
        }
        if region.area / image_area > params.max_page_fraction {
            trace!(bbox = ?bbox, "covers most of the page");
            continue;
        }
        candidates.push(TableCandidate {
            bbox,
            area: region.area,
            aspect_ratio,
            preliminary_score: (region.area / params.preliminary_full_area).min(1.0),
        });
    }

    candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
    candidates.truncate(params.max_candidates);
    candidates
}
