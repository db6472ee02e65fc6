//! Table detection types.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel space, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning `[x0, x1) × [y0, y1)`; empty if inverted.
    pub fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self {
            x: x0,
            y: y0,
            w: x1.saturating_sub(x0),
            h: y1.saturating_sub(y0),
        }
    }

    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    pub fn area(&self) -> f64 {
        f64::from(self.w) * f64::from(self.h)
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    /// Width over height; 0 for degenerate rectangles.
    pub fn aspect_ratio(&self) -> f64 {
        if self.h == 0 {
            0.0
        } else {
            f64::from(self.w) / f64::from(self.h)
        }
    }

    /// Clip to `[0, width) × [0, height)`.
    pub fn clip_to(&self, width: u32, height: u32) -> PixelRect {
        let x0 = self.x.min(width);
        let y0 = self.y.min(height);
        let x1 = self.right().min(width);
        let y1 = self.bottom().min(height);
        PixelRect::from_corners(x0, y0, x1, y1)
    }

    /// Grow by `margin` on every side, clipped to the raster.
    pub fn expand(&self, margin: u32, width: u32, height: u32) -> PixelRect {
        let x0 = self.x.saturating_sub(margin);
        let y0 = self.y.saturating_sub(margin);
        let x1 = self.right().saturating_add(margin).min(width);
        let y1 = self.bottom().saturating_add(margin).min(height);
        PixelRect::from_corners(x0, y0, x1, y1)
    }

    /// Shift by an offset (used to move ROI-local boxes back to the page).
    pub fn offset(&self, dx: u32, dy: u32) -> PixelRect {
        PixelRect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    pub fn intersection_area(&self, other: &PixelRect) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            f64::from(right - left) * f64::from(bottom - top)
        } else {
            0.0
        }
    }
}

/// Axis-aligned rectangle in document space (points), top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DocRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn intersection_area(&self, other: &DocRect) -> f64 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if left < right && top < bottom {
            (right - left) * (bottom - top)
        } else {
            0.0
        }
    }
}

/// A rectangle that might contain a table, before any validation.
#[derive(Clone, Debug, PartialEq)]
pub struct TableCandidate {
    pub bbox: PixelRect,
    /// Area enclosed by the region's outer contour.
    pub area: f64,
    pub aspect_ratio: f64,
    /// Provisional score derived from the area alone.
    pub preliminary_score: f64,
}

/// Evidence from ruling-line geometry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructureScore {
    pub is_valid: bool,
    /// Summed evidence, clamped to `[0, 1]`.
    pub score: f64,
    pub horizontal_lines: usize,
    pub vertical_lines: usize,
    /// Number of pixels where horizontal and vertical lines cross.
    pub intersection_pixels: usize,
}

/// Evidence from text-like blobs inside the (refined) box.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentScore {
    pub has_content: bool,
    pub score: f64,
    pub text_regions: usize,
    /// The refined box the score was computed on.
    pub bbox: PixelRect,
}

/// Structure and content confidences and their weighted combination.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationScore {
    pub structure: f64,
    pub content: f64,
    pub confidence: f64,
}

impl ValidationScore {
    pub fn combine(structure: f64, content: f64, structure_weight: f64, content_weight: f64) -> Self {
        let structure = structure.clamp(0.0, 1.0);
        let content = content.clamp(0.0, 1.0);
        let confidence = (structure * structure_weight + content * content_weight).clamp(0.0, 1.0);
        Self {
            structure,
            content,
            confidence,
        }
    }
}

/// A candidate that passed every filter, still in pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedTable {
    pub candidate: TableCandidate,
    /// Refined box, clipped to the raster.
    pub bbox: PixelRect,
    pub scores: ValidationScore,
    pub estimated_rows: usize,
    pub estimated_cols: usize,
    /// Line crossings inside `bbox`, in page pixels.
    pub intersections: Vec<(u32, u32)>,
}

/// Which detector produced a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Ruling lines plus text density.
    LineStructure,
    /// Column alignment of OCR words.
    TextLayout,
    /// Several detectors merged; records keep their own method.
    Hybrid,
}

impl DetectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DetectionMethod::LineStructure => "line_structure",
            DetectionMethod::TextLayout => "text_layout",
            DetectionMethod::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DetectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "line_structure" | "lines" => Ok(DetectionMethod::LineStructure),
            "text_layout" | "text-layout" => Ok(DetectionMethod::TextLayout),
            "hybrid" | "both" => Ok(DetectionMethod::Hybrid),
            other => Err(format!("unknown detection method: {other}")),
        }
    }
}

/// An accepted table, in document space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Zero-based page index.
    pub page: usize,
    pub bbox: DocRect,
    pub confidence: f64,
    pub structure_score: f64,
    pub content_score: f64,
    pub estimated_rows: usize,
    pub estimated_cols: usize,
    pub method: DetectionMethod,
    /// Pass that found the table (1-based; 1 for single-pass runs).
    pub pass: u32,
    pub intersection_points: Vec<(f64, f64)>,
}

/// Records discovered by one pass of the multi-pass loop.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionPass {
    pub number: u32,
    pub method: DetectionMethod,
    pub min_area: f64,
    pub records: Vec<TableRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_and_expand_stay_inside() {
        let r = PixelRect::new(90, 40, 30, 30);
        assert_eq!(r.clip_to(100, 50), PixelRect::new(90, 40, 10, 10));
        assert_eq!(r.expand(10, 100, 50), PixelRect::new(80, 30, 20, 20));
        assert!(PixelRect::new(120, 0, 5, 5).clip_to(100, 50).is_empty());
    }

    #[test]
    fn intersection_area_disjoint_is_zero() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        assert_eq!(a.intersection_area(&b), 0.0);
        assert_eq!(a.intersection_area(&PixelRect::new(5, 5, 10, 10)), 25.0);
    }

    #[test]
    fn combine_weights_and_clamps() {
        let s = ValidationScore::combine(1.2, 0.9, 0.6, 0.4);
        assert_eq!(s.structure, 1.0);
        assert!((s.confidence - 0.96).abs() < 1e-9);
    }
}
