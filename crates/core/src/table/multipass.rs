//! Multi-pass detection over a document.
//!
//! Each pass runs a detector over every selected page, then paints the
//! accepted regions white so the next pass can only find new tables. The
//! loop state lives in a [`Session`] that is consumed and replaced by every
//! pass.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{DetectError, PageFailure, Result};
use crate::pages::PageRange;
use crate::params::MultiPassParams;
use crate::raster::PageRaster;

use super::finder::Detector;
use super::overlap::Overlap;
use super::types::{DetectionPass, DocRect, TableRecord};

/// Renders document pages to rasters.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Render zero-based `page` at `dpi`.
    fn render(&self, page: usize, dpi: f64) -> Result<PageRaster>;

    /// Render `page` with `regions` painted over in background color.
    ///
    /// The default paints the rendered raster; sources that can rewrite
    /// the document itself may override this.
    fn render_masked(&self, page: usize, dpi: f64, regions: &[DocRect]) -> Result<PageRaster> {
        let raster = self.render(page, dpi)?;
        if regions.is_empty() {
            return Ok(raster);
        }
        Ok(raster.masked(regions))
    }
}

impl<S: PageSource + ?Sized> PageSource for &S {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }

    fn render(&self, page: usize, dpi: f64) -> Result<PageRaster> {
        (**self).render(page, dpi)
    }

    fn render_masked(&self, page: usize, dpi: f64, regions: &[DocRect]) -> Result<PageRaster> {
        (**self).render_masked(page, dpi, regions)
    }
}

/// Pre-rendered pages; the resolution argument is ignored.
impl PageSource for [PageRaster] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn render(&self, page: usize, _dpi: f64) -> Result<PageRaster> {
        self.get(page).cloned().ok_or(DetectError::PageOutOfRange {
            page,
            count: self.len(),
        })
    }
}

impl PageSource for Vec<PageRaster> {
    fn page_count(&self) -> usize {
        self.as_slice().page_count()
    }

    fn render(&self, page: usize, dpi: f64) -> Result<PageRaster> {
        self.as_slice().render(page, dpi)
    }
}

/// Receives `(percent, message)` at page and pass boundaries.
///
/// Percentages only grow within one run.
pub trait Progress {
    fn report(&mut self, percent: u32, message: &str);
}

impl<F: FnMut(u32, &str)> Progress for F {
    fn report(&mut self, percent: u32, message: &str) {
        self(percent, message)
    }
}

/// Discards progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&mut self, _percent: u32, _message: &str) {}
}

/// Cooperative stop request, checked between pages and between passes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// A pass found nothing new.
    Converged,
    /// The pass budget ran out.
    PassBudget,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Accepted regions are masked; the next pass may run.
    Masked { after_pass: u32 },
    Done(Termination),
}

/// Collaborators and limits shared by every pass of a run.
pub struct PassContext<'a> {
    pub source: &'a dyn PageSource,
    pub detector: &'a dyn Detector,
    pub dpi: f64,
    pub max_passes: u32,
    pub duplicate_overlap: f64,
    pub cancel: &'a CancelFlag,
}

/// Share of the overall percentage owned by one pass.
#[derive(Debug, Clone, Copy)]
pub struct ProgressSpan {
    pub start: f64,
    pub end: f64,
}

impl ProgressSpan {
    fn at(&self, done: usize, total: usize) -> u32 {
        let frac = if total == 0 { 0.0 } else { done as f64 / total as f64 };
        (self.start + (self.end - self.start) * frac).floor() as u32
    }
}

/// State of a multi-pass run between passes.
#[derive(Debug, Clone)]
pub struct Session {
    pages: Vec<usize>,
    passes: Vec<DetectionPass>,
    accepted: BTreeMap<usize, Vec<DocRect>>,
    failures: Vec<PageFailure>,
    state: SessionState,
}

impl Session {
    /// Start a session over zero-based `pages`.
    pub fn new(pages: Vec<usize>) -> Self {
        Self {
            pages,
            passes: Vec::new(),
            accepted: BTreeMap::new(),
            failures: Vec::new(),
            state: SessionState::Idle,
        }
    }

    pub fn pages(&self) -> &[usize] {
        &self.pages
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, SessionState::Done(_))
    }

    pub fn passes(&self) -> &[DetectionPass] {
        &self.passes
    }

    /// Every record so far, earlier passes first.
    pub fn records(&self) -> impl Iterator<Item = &TableRecord> {
        self.passes.iter().flat_map(|p| p.records.iter())
    }

    pub fn failures(&self) -> &[PageFailure] {
        &self.failures
    }

    /// Document-space regions already accepted on `page`.
    pub fn accepted_regions(&self, page: usize) -> &[DocRect] {
        self.accepted.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of the pass that would run next (1-based).
    pub fn next_pass(&self) -> u32 {
        self.passes.len() as u32 + 1
    }

    /// Stop the session without running another pass.
    pub fn cancel(mut self) -> Session {
        self.state = SessionState::Done(Termination::Cancelled);
        self
    }

    fn is_duplicate(&self, record: &TableRecord, pending: &[TableRecord], max_overlap: f64) -> bool {
        self.accepted_regions(record.page)
            .iter()
            .chain(pending.iter().filter(|r| r.page == record.page).map(|r| &r.bbox))
            .any(|bbox| bbox.overlap_fraction(&record.bbox) > max_overlap)
    }

    /// Run one pass and return the session that replaces this one, along
    /// with the records the pass added.
    pub fn run_pass(
        self,
        ctx: &PassContext<'_>,
        min_area: f64,
        progress: &mut dyn Progress,
        span: ProgressSpan,
    ) -> (Session, Vec<TableRecord>) {
        let number = self.next_pass();
        let failed: Vec<usize> = self.failures.iter().map(|f| f.page).collect();
        let pages: Vec<usize> = self
            .pages
            .iter()
            .copied()
            .filter(|p| !failed.contains(p))
            .collect();

        let mut records: Vec<TableRecord> = Vec::new();
        let mut failures: Vec<PageFailure> = Vec::new();
        let mut cancelled = false;
        for (i, &page) in pages.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            progress.report(
                span.at(i, pages.len()),
                &format!("Pass {number}: analyzing page {}...", page + 1),
            );
            match self.detect_on_page(ctx, page, min_area) {
                Ok(found) => {
                    for mut record in found {
                        record.page = page;
                        record.pass = number;
                        if self.is_duplicate(&record, &records, ctx.duplicate_overlap) {
                            debug!(page, pass = number, bbox = ?record.bbox, "dropped duplicate record");
                            continue;
                        }
                        records.push(record);
                    }
                }
                Err(err) => {
                    warn!(page, pass = number, error = %err, "page skipped");
                    failures.push(PageFailure {
                        page,
                        pass: number,
                        message: err.to_string(),
                    });
                }
            }
        }

        let state = if cancelled {
            SessionState::Done(Termination::Cancelled)
        } else if records.is_empty() {
            SessionState::Done(Termination::Converged)
        } else if number >= ctx.max_passes {
            SessionState::Done(Termination::PassBudget)
        } else {
            SessionState::Masked { after_pass: number }
        };
        debug!(pass = number, found = records.len(), ?state, "pass finished");

        let mut next = self;
        for record in &records {
            next.accepted.entry(record.page).or_default().push(record.bbox);
        }
        next.passes.push(DetectionPass {
            number,
            method: ctx.detector.method(),
            min_area,
            records: records.clone(),
        });
        next.failures.extend(failures);
        next.state = state;
        (next, records)
    }

    fn detect_on_page(&self, ctx: &PassContext<'_>, page: usize, min_area: f64) -> Result<Vec<TableRecord>> {
        let raster = ctx
            .source
            .render_masked(page, ctx.dpi, self.accepted_regions(page))?;
        if raster.is_empty() {
            return Err(DetectError::EmptyRaster(page));
        }
        ctx.detector.detect_page(&raster, min_area)
    }
}

/// Final outcome of a detection run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: Vec<TableRecord>,
    pub passes: Vec<DetectionPass>,
    pub failures: Vec<PageFailure>,
    pub termination: Termination,
    /// Human-readable summary.
    pub status: String,
}

impl RunReport {
    fn from_session(session: Session) -> Self {
        let termination = match session.state {
            SessionState::Done(t) => t,
            _ => Termination::PassBudget,
        };
        let records: Vec<TableRecord> = session.records().cloned().collect();
        let passes = session.passes.len();
        let mut status = if records.is_empty() {
            format!("No tables found ({passes} pass(es))")
        } else {
            format!("{} table(s) found in {passes} pass(es)", records.len())
        };
        if termination == Termination::Cancelled {
            status = format!("Cancelled: {status}");
        }
        if !session.failures.is_empty() {
            status.push_str(&format!("; {} page(s) skipped", session.failures.len()));
        }
        Self {
            records,
            passes: session.passes,
            failures: session.failures,
            termination,
            status,
        }
    }

    /// The run's single aggregated error, if any page failed.
    pub fn aggregated_error(&self) -> Option<DetectError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(DetectError::PagesFailed {
                failures: self.failures.clone(),
            })
        }
    }
}

/// Detect tables with repeated detect-then-mask passes.
///
/// Stops when a pass adds nothing, when the pass budget is spent, or when
/// `cancel` is set. Records of earlier passes precede later ones.
pub fn detect_multi_pass(
    source: &dyn PageSource,
    detector: &dyn Detector,
    pages: &PageRange,
    params: &MultiPassParams,
    cancel: &CancelFlag,
    progress: &mut dyn Progress,
) -> RunReport {
    let max_passes = params.max_passes.max(1);
    let ctx = PassContext {
        source,
        detector,
        dpi: params.dpi,
        max_passes,
        duplicate_overlap: params.duplicate_overlap,
        cancel,
    };
    progress.report(5, "Starting multi-pass detection...");
    let mut session = Session::new(pages.resolve(source.page_count()));
    let width = 90.0 / f64::from(max_passes);

    while !session.is_done() {
        if cancel.is_cancelled() {
            session = session.cancel();
            break;
        }
        let number = session.next_pass();
        let start = 5.0 + width * f64::from(number - 1);
        let min_area = params.min_area_for_pass(number);
        debug!(pass = number, min_area, method = %detector.method(), "pass start");
        let span = ProgressSpan {
            start,
            end: start + width,
        };
        let (next, found) = session.run_pass(&ctx, min_area, progress, span);
        progress.report(
            span.end.floor() as u32,
            &format!("Pass {number}: {} new table(s)", found.len()),
        );
        session = next;
    }

    let report = RunReport::from_session(session);
    info!(
        tables = report.records.len(),
        passes = report.passes.len(),
        failures = report.failures.len(),
        "multi-pass detection finished"
    );
    progress.report(100, &report.status);
    report
}

/// Detect tables in one pass over the selected pages.
pub fn detect_document(
    source: &dyn PageSource,
    detector: &dyn Detector,
    pages: &PageRange,
    min_area: f64,
    params: &MultiPassParams,
    cancel: &CancelFlag,
    progress: &mut dyn Progress,
) -> RunReport {
    let ctx = PassContext {
        source,
        detector,
        dpi: params.dpi,
        max_passes: 1,
        duplicate_overlap: params.duplicate_overlap,
        cancel,
    };
    progress.report(10, "Opening document...");
    let session = Session::new(pages.resolve(source.page_count()));
    let session = if cancel.is_cancelled() {
        session.cancel()
    } else {
        let span = ProgressSpan {
            start: 10.0,
            end: 90.0,
        };
        session.run_pass(&ctx, min_area, progress, span).0
    };

    let report = RunReport::from_session(session);
    info!(
        tables = report.records.len(),
        failures = report.failures.len(),
        "detection finished"
    );
    progress.report(100, &report.status);
    report
}
