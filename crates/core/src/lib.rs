//! tabscan - visual table detection for rendered document pages.
//!
//! Pages are rasterized by the caller (or a [`PageSource`]) and scanned for
//! ruling-line grids that hold text-like content. Accepted tables come back
//! as [`TableRecord`]s in document coordinates. An OCR-driven detector finds
//! borderless tables from word alignment, and the multi-pass orchestrator
//! repeats detection on masked pages until nothing new turns up.

pub mod error;
pub mod pages;
pub mod params;
pub mod raster;
pub mod table;

pub use error::{DetectError, PageFailure, Result};
pub use pages::PageRange;
pub use params::DetectorParams;
pub use raster::PageRaster;
pub use table::{
    CancelFlag, DetectionMethod, DetectionPass, Detector, DocRect, HybridDetector, LineDetector,
    PageSource, PixelRect, Progress, RunReport, TableRecord, Termination, TextLayoutDetector,
    WordSource, detect, detect_document, detect_multi_pass,
};
