//! Error types for tabscan table detection.
//!
//! Detection algorithms themselves are total: a page with nothing that looks
//! like a table yields an empty result, never an error. Errors come from the
//! collaborators around them (rasterizer, OCR) and from malformed caller
//! input.

use thiserror::Error;

/// Primary error type for detection runs.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("invalid page range {expr:?}: {msg}")]
    InvalidPageRange { expr: String, msg: String },

    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },

    #[error("raster for page {0} has zero area")]
    EmptyRaster(usize),

    #[error("failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("text recognition failed on page {page}: {message}")]
    Ocr { page: usize, message: String },

    #[error("{} page(s) failed during detection", failures.len())]
    PagesFailed { failures: Vec<PageFailure> },
}

impl DetectError {
    /// The page this error is attached to, if any.
    pub fn page(&self) -> Option<usize> {
        match self {
            DetectError::PageOutOfRange { page, .. }
            | DetectError::Render { page, .. }
            | DetectError::Ocr { page, .. } => Some(*page),
            DetectError::EmptyRaster(page) => Some(*page),
            _ => None,
        }
    }
}

/// A page that was skipped because a collaborator failed on it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PageFailure {
    /// Zero-based page index.
    pub page: usize,
    /// Pass during which the failure happened (1-based).
    pub pass: u32,
    pub message: String,
}

/// Convenience Result type alias for DetectError.
pub type Result<T> = std::result::Result<T, DetectError>;
