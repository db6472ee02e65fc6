//! Table detection from OCR word positions.
//!
//! Works on pages whose tables have no ruling lines at all: consecutive text
//! lines whose words start at the same x positions are taken to be rows of
//! one table.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::params::TextLayoutParams;
use crate::raster::PageRaster;

use super::clustering::cluster_by_anchor;
use super::overlap::remove_overlapping;
use super::types::PixelRect;

/// One recognized word, in raster pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    /// Recognition confidence, 0-100.
    pub confidence: f64,
}

/// Supplies recognized words for a page raster.
pub trait WordSource {
    fn recognize(&self, raster: &PageRaster) -> Result<Vec<OcrWord>>;
}

impl<W: WordSource + ?Sized> WordSource for &W {
    fn recognize(&self, raster: &PageRaster) -> Result<Vec<OcrWord>> {
        (**self).recognize(raster)
    }
}

/// A run of aligned text lines accepted as a table.
#[derive(Clone, Debug, PartialEq)]
pub struct TextTable {
    pub bbox: PixelRect,
    /// Number of text lines in the run.
    pub rows: usize,
    /// Words on the run's first line.
    pub columns: usize,
    /// Mean share of column positions matching the first line.
    pub consistency: f64,
    /// Words per line relative to the target density, capped at 1.
    pub density: f64,
    pub word_count: usize,
    pub score: f64,
}

/// Find aligned word runs on a `page_w × page_h` raster.
///
/// Returns non-overlapping tables scoring at least `params.min_score`,
/// best first.
pub fn analyze_text_layout(
    words: &[OcrWord],
    page_w: u32,
    page_h: u32,
    params: &TextLayoutParams,
) -> Vec<TextTable> {
    let words: Vec<&OcrWord> = words
        .iter()
        .filter(|w| !w.text.trim().is_empty() && w.confidence > params.min_word_confidence)
        .collect();
    if words.len() < params.min_words {
        trace!(words = words.len(), "too few words");
        return Vec::new();
    }

    let lines: Vec<Vec<&OcrWord>> = cluster_by_anchor(&words, |w| w.y, params.line_tolerance)
        .into_iter()
        .filter(|line| line.len() >= params.min_words_per_line)
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            line
        })
        .collect();
    if lines.is_empty() || lines.len() < params.min_lines {
        trace!(lines = lines.len(), "too few text lines");
        return Vec::new();
    }

    let mut found = Vec::new();
    for start in 0..=lines.len().saturating_sub(params.min_lines.max(1)) {
        let end = (start + params.max_run_lines.max(1)).min(lines.len());
        let run = &lines[start..end];
        if run.len() < params.min_lines {
            continue;
        }
        if let Some(table) = validate_run(run, page_w, page_h, params) {
            found.push(table);
        }
    }

    let kept = remove_overlapping(found, |t| t.score, |t| t.bbox, params.duplicate_overlap);
    let accepted: Vec<TextTable> = kept
        .into_iter()
        .filter(|t| t.score >= params.min_score)
        .collect();
    debug!(tables = accepted.len(), "text layout");
    accepted
}

fn validate_run(
    run: &[Vec<&OcrWord>],
    page_w: u32,
    page_h: u32,
    params: &TextLayoutParams,
) -> Option<TextTable> {
    let first: Vec<f64> = run[0].iter().map(|w| w.x).collect();
    let others = &run[1..];
    if others.is_empty() {
        return None;
    }
    let consistency = others
        .iter()
        .map(|line| {
            let xs: Vec<f64> = line.iter().map(|w| w.x).collect();
            position_similarity(&first, &xs, params.column_tolerance)
        })
        .sum::<f64>()
        / others.len() as f64;
    if consistency < params.min_column_consistency {
        return None;
    }

    let bbox = run_bbox(run, page_w, page_h, params)?;
    if f64::from(bbox.w) < params.min_width || f64::from(bbox.h) < params.min_height {
        return None;
    }
    let page_area = f64::from(page_w) * f64::from(page_h);
    if page_area <= 0.0 || bbox.area() / page_area > params.max_page_fraction {
        return None;
    }

    let rows = run.len();
    let word_count: usize = run.iter().map(Vec::len).sum();
    let avg_columns = word_count as f64 / rows as f64;
    let row_score = (rows as f64 / params.target_rows).min(1.0);
    let column_score = (avg_columns / params.target_columns).min(1.0);
    let density = (word_count as f64 / (rows as f64 * params.target_words_per_line)).min(1.0);
    let score = (consistency * params.consistency_weight
        + row_score * params.rows_weight
        + column_score * params.columns_weight
        + density * params.density_weight)
        .clamp(0.0, 1.0);

    Some(TextTable {
        bbox,
        rows,
        columns: first.len(),
        consistency,
        density,
        word_count,
        score,
    })
}

/// Share of positions matching index by index; 0 when the counts differ.
pub(crate) fn position_similarity(a: &[f64], b: &[f64], tolerance: f64) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let matches = a
        .iter()
        .zip(b)
        .filter(|(p, q)| (*p - *q).abs() <= tolerance)
        .count();
    matches as f64 / a.len() as f64
}

/// Union of the run's word boxes with header-friendly padding, clipped.
fn run_bbox(
    run: &[Vec<&OcrWord>],
    page_w: u32,
    page_h: u32,
    params: &TextLayoutParams,
) -> Option<PixelRect> {
    let words = run.iter().flatten();
    let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
    let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut height_sum = 0.0;
    let mut count = 0usize;
    for w in words {
        x0 = x0.min(w.x);
        y0 = y0.min(w.y);
        x1 = x1.max(w.x + w.w);
        y1 = y1.max(w.y + w.h);
        height_sum += w.h;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let mean_height = height_sum / count as f64;
    let top = params
        .min_padding_top
        .max((mean_height * params.top_padding_ratio).floor());

    let x0 = (x0 - params.padding_x).max(0.0).floor();
    let y0 = (y0 - top).max(0.0).floor();
    let x1 = (x1 + params.padding_x).min(f64::from(page_w)).ceil();
    let y1 = (y1 + params.padding_bottom).min(f64::from(page_h)).ceil();
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(PixelRect::from_corners(
        x0 as u32, y0 as u32, x1 as u32, y1 as u32,
    ))
}
