//! Visual table detection on rendered pages.
//!
//! The line-based pipeline runs line extraction, candidate finding,
//! structural validation, refinement, content analysis and coordinate
//! mapping in that order. A text-layout detector built on OCR word positions
//! is available as an alternative, and both plug into the multi-pass
//! orchestrator through the [`Detector`] trait.

mod candidates;
mod clustering;
mod content;
mod finder;
mod geometry;
mod intersections;
mod lines;
mod multipass;
mod overlap;
mod refine;
mod regions;
mod structure;
mod text_layout;
mod types;

// Re-export public types
pub use types::{
    ContentScore, DetectedTable, DetectionMethod, DetectionPass, DocRect, PixelRect,
    StructureScore, TableCandidate, TableRecord, ValidationScore,
};

// Re-export public API functions
pub use candidates::find_candidates;
pub use clustering::cluster_by_anchor;
pub use content::{analyze_content, score_content};
pub use finder::{Detector, HybridDetector, LineDetector, TextLayoutDetector, detect};
pub use geometry::{point_to_document, to_document};
pub use intersections::line_intersections;
pub use lines::{LineMasks, extract_lines};
pub use multipass::{
    CancelFlag, NoProgress, PageSource, PassContext, Progress, ProgressSpan, RunReport, Session,
    SessionState, Termination, detect_document, detect_multi_pass,
};
pub use overlap::{Overlap, remove_overlapping};
pub use refine::refine_bbox;
pub use structure::validate_structure;
pub use text_layout::{OcrWord, TextTable, WordSource, analyze_text_layout};
