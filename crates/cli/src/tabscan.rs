//! tabscan - Find table regions in page images
//!
//! Every input image is one page. Tables are reported as JSON in document
//! points, derived from the image size and the given resolution.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use tabscan_core::error::DetectError;
use tabscan_core::params::DetectorParams;
use tabscan_core::table::OcrWord;
use tabscan_core::{
    CancelFlag, Detector, HybridDetector, LineDetector, PageRange, PageRaster, PageSource,
    RunReport, TextLayoutDetector, WordSource, detect_document, detect_multi_pass,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Detection strategy.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Method {
    /// Ruling lines plus text density (default)
    #[default]
    Lines,
    /// Column alignment of recognized words
    TextLayout,
    /// Both of the above, overlapping results merged
    Both,
}

/// Find table regions in page images and print them as JSON.
#[derive(Parser, Debug)]
#[command(name = "tabscan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page images, one per page, in document order
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Resolution the images were rendered at
    #[arg(long, default_value = "150")]
    dpi: f64,

    /// Detection method
    #[arg(short = 'm', long, value_enum, default_value = "lines")]
    method: Method,

    /// Number of detect-then-mask passes (1 = single pass)
    #[arg(short = 'n', long, default_value = "1")]
    passes: u32,

    /// Pages to scan, e.g. "all" or "1-3,7"
    #[arg(short = 'p', long, default_value = "all")]
    pages: PageRange,

    /// Minimum candidate area in pixels (default 5000, or 500 per pass
    /// when running several passes)
    #[arg(long = "min-area")]
    min_area: Option<f64>,

    /// JSON file overriding detector parameters
    #[arg(long = "params")]
    params: Option<PathBuf>,

    /// Suffix of the word sidecar files used by the text-layout and both
    /// methods;
    /// page `scan.png` reads its words from `scan<suffix>`
    #[arg(long = "words-suffix", default_value = ".words.json")]
    words_suffix: String,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short = 'o', long, default_value = "-")]
    outfile: String,
}

/// Image files on disk, one page each.
struct ImagePages {
    paths: Vec<PathBuf>,
}

impl PageSource for ImagePages {
    fn page_count(&self) -> usize {
        self.paths.len()
    }

    fn render(&self, page: usize, dpi: f64) -> tabscan_core::Result<PageRaster> {
        let path = self.paths.get(page).ok_or(DetectError::PageOutOfRange {
            page,
            count: self.paths.len(),
        })?;
        let image = image::open(path).map_err(|e| DetectError::Render {
            page,
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(PageRaster::from_dpi(page, image.to_rgb8(), dpi))
    }
}

/// Words recognized ahead of time, stored next to each page image.
struct SidecarWords {
    paths: Vec<PathBuf>,
}

impl SidecarWords {
    fn new(images: &[PathBuf], suffix: &str) -> Self {
        let paths = images
            .iter()
            .map(|image| {
                let stem = image.file_stem().unwrap_or_default().to_string_lossy();
                image.with_file_name(format!("{stem}{suffix}"))
            })
            .collect();
        Self { paths }
    }
}

impl WordSource for SidecarWords {
    fn recognize(&self, raster: &PageRaster) -> tabscan_core::Result<Vec<OcrWord>> {
        let page = raster.page;
        let ocr_error = |message: String| DetectError::Ocr { page, message };
        let path = self
            .paths
            .get(page)
            .ok_or_else(|| ocr_error("no word file for page".into()))?;
        let file = File::open(path).map_err(|e| ocr_error(format!("{}: {e}", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ocr_error(format!("{}: {e}", path.display())))
    }
}

fn load_params(path: Option<&Path>) -> Result<DetectorParams> {
    let Some(path) = path else {
        return Ok(DetectorParams::default());
    };
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("invalid parameter file {}", path.display()))
}

fn run(args: &Args, params: DetectorParams) -> RunReport {
    let source = ImagePages {
        paths: args.images.clone(),
    };
    let mut multi_pass = params.multi_pass.clone();
    multi_pass.dpi = args.dpi;
    multi_pass.max_passes = args.passes.max(1);
    if let Some(min_area) = args.min_area {
        multi_pass.min_area_schedule = vec![min_area];
    }

    let detector: Box<dyn Detector> = match args.method {
        Method::Lines => Box::new(LineDetector::new(params)),
        Method::TextLayout => Box::new(TextLayoutDetector::new(
            SidecarWords::new(&args.images, &args.words_suffix),
            params,
        )),
        Method::Both => Box::new(HybridDetector::lines_and_text(
            SidecarWords::new(&args.images, &args.words_suffix),
            params,
        )),
    };
    let cancel = CancelFlag::new();
    let mut progress = |percent: u32, message: &str| info!(percent, "{message}");

    if args.passes > 1 {
        detect_multi_pass(
            &source,
            detector.as_ref(),
            &args.pages,
            &multi_pass,
            &cancel,
            &mut progress,
        )
    } else {
        let min_area = args.min_area.unwrap_or_else(DetectorParams::default_min_area);
        detect_document(
            &source,
            detector.as_ref(),
            &args.pages,
            min_area,
            &multi_pass,
            &cancel,
            &mut progress,
        )
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .without_time()
        .init();

    if args.dpi.is_nan() || args.dpi <= 0.0 {
        bail!("--dpi must be positive, got {}", args.dpi);
    }
    for path in &args.images {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
    }
    let params = load_params(args.params.as_deref())?;
    debug!(?params, "detector parameters");

    let report = run(&args, params);

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };
    serde_json::to_writer_pretty(&mut output, &report)?;
    writeln!(output)?;
    output.flush()?;

    eprintln!("{}", report.status);
    if let Some(err) = report.aggregated_error() {
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_paths_follow_image_stems() {
        let words = SidecarWords::new(&[PathBuf::from("scans/p1.png")], ".words.json");
        assert_eq!(words.paths, vec![PathBuf::from("scans/p1.words.json")]);
    }

    #[test]
    fn args_parse_page_ranges() {
        let args = Args::try_parse_from(["tabscan", "-p", "1-2,5", "-n", "3", "a.png"]).unwrap();
        assert_eq!(args.pages, PageRange::Spans(vec![(1, 2), (5, 5)]));
        assert_eq!(args.passes, 3);
        assert!(Args::try_parse_from(["tabscan", "-p", "0", "a.png"]).is_err());

        let args = Args::try_parse_from(["tabscan", "--method", "both", "a.png"]).unwrap();
        assert!(matches!(args.method, Method::Both));
    }
}
