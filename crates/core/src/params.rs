//! Detection parameters.
//!
//! Every threshold used by the detectors lives here. The defaults were tuned
//! by hand on a small set of scanned pages and are meant to be recalibrated,
//! not treated as domain constants.

use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_MIN_TABLE_AREA: f64 = 5000.0;
pub(crate) const DEFAULT_MULTI_PASS_MIN_AREA: f64 = 500.0;
pub(crate) const DEFAULT_MAX_PASSES: u32 = 5;
pub(crate) const DEFAULT_RENDER_DPI: f64 = 150.0;

/// All tunables of the line-based and text-layout detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    pub lines: LineParams,
    pub candidates: CandidateParams,
    pub structure: StructureParams,
    pub refine: RefineParams,
    pub content: ContentParams,
    pub scoring: ScoringParams,
    pub text_layout: TextLayoutParams,
    pub multi_pass: MultiPassParams,
}

/// Parameters of the ruling-line extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineParams {
    /// Diameter of the bilateral smoothing window, in pixels.
    pub smoothing_diameter: u32,
    /// Intensity sigma of the bilateral filter.
    pub smoothing_sigma_color: f32,
    /// Spatial sigma of the bilateral filter.
    pub smoothing_sigma_space: f32,
    /// Side of the square neighbourhood used by the adaptive threshold. Odd.
    pub threshold_block: u32,
    /// Constant subtracted from the local weighted mean.
    pub threshold_offset: f32,
    /// Length of the line structuring element.
    pub kernel_length: u32,
    /// How many times erosion and dilation are applied during the opening.
    pub open_iterations: u32,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            smoothing_diameter: 9,
            smoothing_sigma_color: 75.0,
            smoothing_sigma_space: 75.0,
            threshold_block: 11,
            threshold_offset: 2.0,
            kernel_length: 80,
            open_iterations: 2,
        }
    }
}

impl LineParams {
    /// Shortest run that survives the repeated opening.
    ///
    /// Eroding `n` times with a line of length `k` and dilating back equals
    /// one opening with a line of length `n * (k - 1) + 1`.
    pub fn effective_run(&self) -> u32 {
        let k = self.kernel_length.max(1);
        let n = self.open_iterations.max(1);
        n * (k - 1) + 1
    }
}

/// Filters applied to contours of the table-structure mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateParams {
    /// Chebyshev radius of the gap-bridging dilation.
    pub dilate_radius: u8,
    /// Polygon approximation tolerance, relative to the contour perimeter.
    pub approx_epsilon: f64,
    /// Minimum number of vertices of the approximated polygon.
    pub min_vertices: usize,
    pub min_width: u32,
    pub min_height: u32,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Candidates covering more than this share of the page are discarded.
    pub max_page_fraction: f64,
    /// Number of candidates kept for validation.
    pub max_candidates: usize,
    /// Area at which the preliminary score saturates.
    pub preliminary_full_area: f64,
}

impl Default for CandidateParams {
    fn default() -> Self {
        Self {
            dilate_radius: 1,
            approx_epsilon: 0.02,
            min_vertices: 4,
            min_width: 100,
            min_height: 60,
            min_aspect: 0.8,
            max_aspect: 15.0,
            max_page_fraction: 0.8,
            max_candidates: 10,
            preliminary_full_area: 50_000.0,
        }
    }
}

/// Additive evidence weights of the structural validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructureParams {
    /// A line must span at least this share of the candidate's side.
    pub min_line_fraction: f64,
    /// Lines thicker than this are not ruling lines.
    pub max_line_thickness: u32,
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub line_weight: f64,
    pub intersection_weight: f64,
    pub area_weight: f64,
    pub aspect_weight: f64,
    pub grid_bonus: f64,
    /// Minimum horizontal and vertical line counts for the grid bonus.
    pub grid_min_horizontal: usize,
    pub grid_min_vertical: usize,
    /// Evidence total needed to call the candidate structurally valid.
    pub min_score: f64,
}

impl Default for StructureParams {
    fn default() -> Self {
        Self {
            min_line_fraction: 0.2,
            max_line_thickness: 15,
            min_area_ratio: 0.001,
            max_area_ratio: 0.95,
            min_aspect: 0.5,
            max_aspect: 50.0,
            line_weight: 0.5,
            intersection_weight: 0.2,
            area_weight: 0.2,
            aspect_weight: 0.1,
            grid_bonus: 0.2,
            grid_min_horizontal: 2,
            grid_min_vertical: 1,
            min_score: 0.2,
        }
    }
}

/// Bounding-box refinement margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineParams {
    /// Candidates narrower than this are returned unchanged.
    pub min_width: u32,
    /// Candidates shorter than this are returned unchanged.
    pub min_height: u32,
    /// Margin added around the candidate before re-extracting lines.
    pub search_margin: u32,
    /// Padding added around the refined structure.
    pub padding: u32,
    /// Refined boxes smaller than this are rejected outright.
    pub min_refined_width: u32,
    pub min_refined_height: u32,
    /// Refinements keeping less than this share of the area fall back.
    pub min_area_retained: f64,
    /// Padding applied to the original box on fallback.
    pub fallback_padding: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            min_width: 200,
            min_height: 100,
            search_margin: 10,
            padding: 8,
            min_refined_width: 50,
            min_refined_height: 30,
            min_area_retained: 0.3,
            fallback_padding: 5,
        }
    }
}

/// One step of the text-density confidence ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentTier {
    pub min_regions: usize,
    pub score: f64,
}

/// Glyph size bands and density tiers of the content analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentParams {
    pub threshold_block: u32,
    pub threshold_offset: f32,
    pub min_area: u32,
    pub max_area: u32,
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    /// Ordered from the densest tier down; the first match wins.
    pub tiers: Vec<ContentTier>,
}

impl Default for ContentParams {
    fn default() -> Self {
        let tier = |min_regions, score| ContentTier { min_regions, score };
        Self {
            threshold_block: 11,
            threshold_offset: 2.0,
            min_area: 10,
            max_area: 15_000,
            min_width: 2,
            max_width: 500,
            min_height: 2,
            max_height: 100,
            tiers: vec![
                tier(50, 0.9),
                tier(30, 0.8),
                tier(15, 0.7),
                tier(8, 0.6),
                tier(3, 0.4),
                tier(1, 0.3),
            ],
        }
    }
}

/// How the two sub-scores are combined into the final confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringParams {
    pub structure_weight: f64,
    pub content_weight: f64,
    /// Combined confidence needed to accept a line-based table.
    pub min_confidence: f64,
    /// Two tables on one page overlapping by more than this share of the
    /// smaller one are duplicates.
    pub duplicate_overlap: f64,
    /// Multipliers of the row/column estimates.
    pub rows_per_structure: f64,
    pub cols_per_content: f64,
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            structure_weight: 0.6,
            content_weight: 0.4,
            min_confidence: 0.25,
            duplicate_overlap: 0.5,
            rows_per_structure: 10.0,
            cols_per_content: 8.0,
        }
    }
}

/// Parameters of the OCR word-alignment detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayoutParams {
    /// Words recognized with lower confidence (0-100) are ignored.
    pub min_word_confidence: f64,
    /// Pages with fewer usable words are skipped.
    pub min_words: usize,
    /// Words whose tops differ by at most this belong to one line.
    pub line_tolerance: f64,
    pub min_words_per_line: usize,
    pub min_lines: usize,
    /// Longest run of lines examined from one starting line.
    pub max_run_lines: usize,
    /// Two word positions closer than this are the same column.
    pub column_tolerance: f64,
    pub min_column_consistency: f64,
    pub padding_x: f64,
    pub padding_bottom: f64,
    pub min_padding_top: f64,
    /// Extra top padding relative to the mean word height (header rows).
    pub top_padding_ratio: f64,
    pub min_width: f64,
    pub min_height: f64,
    pub max_page_fraction: f64,
    pub target_rows: f64,
    pub target_columns: f64,
    pub target_words_per_line: f64,
    pub consistency_weight: f64,
    pub rows_weight: f64,
    pub columns_weight: f64,
    pub density_weight: f64,
    /// Score needed to accept a text-layout table.
    pub min_score: f64,
    /// Runs overlapping a better run by more than this share of the
    /// smaller box are dropped.
    pub duplicate_overlap: f64,
}

impl Default for TextLayoutParams {
    fn default() -> Self {
        Self {
            min_word_confidence: 30.0,
            min_words: 6,
            line_tolerance: 15.0,
            min_words_per_line: 2,
            min_lines: 3,
            max_run_lines: 10,
            column_tolerance: 20.0,
            min_column_consistency: 0.4,
            padding_x: 8.0,
            padding_bottom: 5.0,
            min_padding_top: 5.0,
            top_padding_ratio: 0.2,
            min_width: 100.0,
            min_height: 60.0,
            max_page_fraction: 0.8,
            target_rows: 8.0,
            target_columns: 4.0,
            target_words_per_line: 3.0,
            consistency_weight: 0.4,
            rows_weight: 0.2,
            columns_weight: 0.2,
            density_weight: 0.2,
            min_score: 0.5,
            duplicate_overlap: 0.5,
        }
    }
}

/// Pass budget and per-pass minimum areas of the multi-pass orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiPassParams {
    pub max_passes: u32,
    /// Pass `n` uses entry `min(n - 1, len - 1)`; empty means the
    /// single-pass default.
    pub min_area_schedule: Vec<f64>,
    /// Resolution pages are rendered at.
    pub dpi: f64,
    /// New records overlapping an already accepted record on the same page
    /// by more than this share of the smaller box are dropped.
    pub duplicate_overlap: f64,
}

impl Default for MultiPassParams {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
            min_area_schedule: vec![DEFAULT_MULTI_PASS_MIN_AREA],
            dpi: DEFAULT_RENDER_DPI,
            duplicate_overlap: 0.5,
        }
    }
}

impl MultiPassParams {
    /// Minimum candidate area used during pass `pass` (1-based).
    pub fn min_area_for_pass(&self, pass: u32) -> f64 {
        if self.min_area_schedule.is_empty() {
            return DEFAULT_MIN_TABLE_AREA;
        }
        let idx = (pass.max(1) as usize - 1).min(self.min_area_schedule.len() - 1);
        self.min_area_schedule[idx]
    }
}

impl DetectorParams {
    /// Minimum candidate area used by single-pass detection.
    pub fn default_min_area() -> f64 {
        DEFAULT_MIN_TABLE_AREA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_run_matches_repeated_opening() {
        let p = LineParams::default();
        assert_eq!(p.effective_run(), 159);

        let single = LineParams {
            open_iterations: 1,
            ..LineParams::default()
        };
        assert_eq!(single.effective_run(), 80);
    }

    #[test]
    fn min_area_schedule_saturates() {
        let p = MultiPassParams {
            min_area_schedule: vec![5000.0, 2000.0, 500.0],
            ..MultiPassParams::default()
        };
        assert_eq!(p.min_area_for_pass(1), 5000.0);
        assert_eq!(p.min_area_for_pass(3), 500.0);
        assert_eq!(p.min_area_for_pass(7), 500.0);

        let empty = MultiPassParams {
            min_area_schedule: Vec::new(),
            ..MultiPassParams::default()
        };
        assert_eq!(empty.min_area_for_pass(2), DEFAULT_MIN_TABLE_AREA);
    }

    #[test]
    fn content_tiers_are_descending() {
        let p = ContentParams::default();
        assert!(
            p.tiers
                .windows(2)
                .all(|w| w[0].min_regions > w[1].min_regions && w[0].score > w[1].score)
        );
    }
}
