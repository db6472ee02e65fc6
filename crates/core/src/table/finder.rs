//! Detector variants and the composed line-based pipeline.
//!
//! Both detectors share one contract: a page raster and a minimum candidate
//! area in, document-space records out. The orchestrator only ever sees the
//! [`Detector`] trait.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{DetectError, Result};
use crate::params::DetectorParams;
use crate::raster::PageRaster;

use super::candidates::find_candidates;
use super::content::analyze_content;
use super::geometry::{point_to_document, to_document};
use super::intersections::line_intersections;
use super::lines::extract_lines;
use super::overlap::{Overlap, remove_overlapping};
use super::structure::validate_structure;
use super::text_layout::{TextTable, WordSource, analyze_text_layout};
use super::types::{DetectedTable, DetectionMethod, TableCandidate, TableRecord, ValidationScore};

/// A table detector for single page rasters.
pub trait Detector {
    fn method(&self) -> DetectionMethod;

    /// Detect tables on one page.
    ///
    /// Records are tagged with pass 1; the multi-pass orchestrator retags
    /// them. Errors are reserved for collaborator failures.
    fn detect_page(&self, raster: &PageRaster, min_area: f64) -> Result<Vec<TableRecord>>;
}

impl<D: Detector + ?Sized> Detector for &D {
    fn method(&self) -> DetectionMethod {
        (**self).method()
    }

    fn detect_page(&self, raster: &PageRaster, min_area: f64) -> Result<Vec<TableRecord>> {
        (**self).detect_page(raster, min_area)
    }
}

/// Run the line-based pipeline on one raster.
///
/// Candidates are scored in parallel and accepted in rank order; a
/// candidate overlapping an already accepted table by more than the
/// duplicate fraction is dropped.
pub fn detect(raster: &PageRaster, min_area: f64, params: &DetectorParams) -> Vec<DetectedTable> {
    if raster.is_empty() {
        return Vec::new();
    }
    let structure = extract_lines(raster, raster.bounds(), &params.lines).structure();
    let candidates = find_candidates(&structure, min_area, &params.candidates);
    debug!(page = raster.page, candidates = candidates.len(), "candidates");

    let scored: Vec<Option<DetectedTable>> = candidates
        .into_par_iter()
        .map(|candidate| evaluate(raster, candidate, params))
        .collect();

    let mut accepted: Vec<DetectedTable> = Vec::new();
    for table in scored.into_iter().flatten() {
        let duplicate = accepted
            .iter()
            .any(|a| a.bbox.overlap_fraction(&table.bbox) > params.scoring.duplicate_overlap);
        if duplicate {
            debug!(bbox = ?table.bbox, "duplicate of an accepted table");
            continue;
        }
        accepted.push(table);
    }
    accepted
}

fn evaluate(raster: &PageRaster, candidate: TableCandidate, params: &DetectorParams) -> Option<DetectedTable> {
    let structure = validate_structure(raster, candidate.bbox, &params.lines, &params.structure);
    if !structure.is_valid {
        debug!(bbox = ?candidate.bbox, score = structure.score, "rejected: structure");
        return None;
    }
    let content = analyze_content(raster, candidate.bbox, params);
    if !content.has_content || content.bbox.is_empty() {
        debug!(bbox = ?candidate.bbox, regions = content.text_regions, "rejected: content");
        return None;
    }

    let scoring = &params.scoring;
    let scores = ValidationScore::combine(
        structure.score,
        content.score,
        scoring.structure_weight,
        scoring.content_weight,
    );
    if scores.confidence < scoring.min_confidence {
        debug!(bbox = ?candidate.bbox, confidence = scores.confidence, "rejected: confidence");
        return None;
    }

    let estimated_rows = ((scores.structure * scoring.rows_per_structure).floor() as usize).max(2);
    let estimated_cols = ((scores.content * scoring.cols_per_content).floor() as usize).max(2);
    let intersections = line_intersections(raster, content.bbox, &params.lines);
    debug!(bbox = ?content.bbox, confidence = scores.confidence, "accepted");

    Some(DetectedTable {
        candidate,
        bbox: content.bbox,
        scores,
        estimated_rows,
        estimated_cols,
        intersections,
    })
}

impl DetectedTable {
    /// Map into document space as a record of `raster`'s page.
    pub fn to_record(&self, raster: &PageRaster) -> TableRecord {
        let (w, h) = (raster.width(), raster.height());
        TableRecord {
            page: raster.page,
            bbox: to_document(self.bbox, w, h, raster.doc_width, raster.doc_height),
            confidence: self.scores.confidence,
            structure_score: self.scores.structure,
            content_score: self.scores.content,
            estimated_rows: self.estimated_rows,
            estimated_cols: self.estimated_cols,
            method: DetectionMethod::LineStructure,
            pass: 1,
            intersection_points: self
                .intersections
                .iter()
                .map(|&p| point_to_document(p, w, h, raster.doc_width, raster.doc_height))
                .collect(),
        }
    }
}

/// Ruling lines plus text density.
#[derive(Debug, Clone, Default)]
pub struct LineDetector {
    params: DetectorParams,
}

impl LineDetector {
    pub fn new(params: DetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }
}

impl Detector for LineDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::LineStructure
    }

    fn detect_page(&self, raster: &PageRaster, min_area: f64) -> Result<Vec<TableRecord>> {
        Ok(detect(raster, min_area, &self.params)
            .iter()
            .map(|t| t.to_record(raster))
            .filter(|r| r.bbox.width > 0.0 && r.bbox.height > 0.0)
            .collect())
    }
}

/// Column alignment of recognized words.
///
/// `min_area` does not apply; runs are filtered by their own size limits.
#[derive(Debug, Clone)]
pub struct TextLayoutDetector<W> {
    words: W,
    params: DetectorParams,
}

impl<W: WordSource> TextLayoutDetector<W> {
    pub fn new(words: W, params: DetectorParams) -> Self {
        Self { words, params }
    }

    fn to_record(&self, table: &TextTable, raster: &PageRaster) -> TableRecord {
        TableRecord {
            page: raster.page,
            bbox: to_document(
                table.bbox,
                raster.width(),
                raster.height(),
                raster.doc_width,
                raster.doc_height,
            ),
            confidence: table.score,
            structure_score: table.consistency.clamp(0.0, 1.0),
            content_score: table.density,
            estimated_rows: table.rows,
            estimated_cols: table.columns,
            method: DetectionMethod::TextLayout,
            pass: 1,
            intersection_points: Vec::new(),
        }
    }
}

impl<W: WordSource> Detector for TextLayoutDetector<W> {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::TextLayout
    }

    fn detect_page(&self, raster: &PageRaster, _min_area: f64) -> Result<Vec<TableRecord>> {
        if raster.is_empty() {
            return Ok(Vec::new());
        }
        let words = self.words.recognize(raster)?;
        let tables = analyze_text_layout(&words, raster.width(), raster.height(), &self.params.text_layout);
        Ok(tables
            .iter()
            .map(|t| self.to_record(t, raster))
            .filter(|r| r.bbox.width > 0.0 && r.bbox.height > 0.0)
            .collect())
    }
}

/// Runs several detectors on each page and merges their records.
///
/// Records overlapping a more confident one by more than `duplicate_overlap`
/// of the smaller box are dropped. Each surviving record keeps the method
/// of the detector that found it. A page fails only when every detector
/// fails on it.
pub struct HybridDetector {
    detectors: Vec<Box<dyn Detector>>,
    duplicate_overlap: f64,
}

impl HybridDetector {
    pub fn new(detectors: Vec<Box<dyn Detector>>, duplicate_overlap: f64) -> Self {
        Self {
            detectors,
            duplicate_overlap,
        }
    }

    /// Ruling lines plus text layout, with one shared parameter set.
    pub fn lines_and_text<W: WordSource + 'static>(words: W, params: DetectorParams) -> Self {
        let duplicate_overlap = params.scoring.duplicate_overlap;
        Self::new(
            vec![
                Box::new(LineDetector::new(params.clone())),
                Box::new(TextLayoutDetector::new(words, params)),
            ],
            duplicate_overlap,
        )
    }
}

impl Detector for HybridDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Hybrid
    }

    fn detect_page(&self, raster: &PageRaster, min_area: f64) -> Result<Vec<TableRecord>> {
        let mut records = Vec::new();
        let mut first_error: Option<DetectError> = None;
        let mut succeeded = 0usize;
        for detector in &self.detectors {
            match detector.detect_page(raster, min_area) {
                Ok(found) => {
                    succeeded += 1;
                    records.extend(found);
                }
                Err(err) => {
                    warn!(page = raster.page, method = %detector.method(), error = %err, "detector failed");
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) if succeeded == 0 => return Err(err),
            _ => {}
        }
        Ok(remove_overlapping(
            records,
            |r| r.confidence,
            |r| r.bbox,
            self.duplicate_overlap,
        ))
    }
}
