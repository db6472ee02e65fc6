//! Page selection expressions.

use std::fmt;
use std::str::FromStr;

use crate::error::{DetectError, Result};

/// Pages a detection run covers.
///
/// Parsed from `"all"` or a comma-separated list of 1-based page numbers
/// and inclusive ranges such as `"1-3,7"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageRange {
    #[default]
    All,
    /// Inclusive 1-based spans.
    Spans(Vec<(usize, usize)>),
}

impl PageRange {
    /// Zero-based page indices present in a document of `count` pages,
    /// sorted and without duplicates.
    pub fn resolve(&self, count: usize) -> Vec<usize> {
        match self {
            PageRange::All => (0..count).collect(),
            PageRange::Spans(spans) => {
                let mut pages: Vec<usize> = spans
                    .iter()
                    .flat_map(|&(start, end)| start.saturating_sub(1)..end.min(count))
                    .collect();
                pages.sort_unstable();
                pages.dedup();
                pages
            }
        }
    }
}

impl FromStr for PageRange {
    type Err = DetectError;

    fn from_str(s: &str) -> Result<Self> {
        let expr = s.trim();
        if expr.eq_ignore_ascii_case("all") {
            return Ok(PageRange::All);
        }
        let invalid = |msg: &str| DetectError::InvalidPageRange {
            expr: s.to_string(),
            msg: msg.to_string(),
        };
        let number = |part: &str| -> Result<usize> {
            match part.trim().parse::<usize>() {
                Ok(0) => Err(invalid("page numbers start at 1")),
                Ok(n) => Ok(n),
                Err(_) => Err(invalid(&format!("not a page number: {:?}", part.trim()))),
            }
        };

        let mut spans = Vec::new();
        for part in expr.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty entry"));
            }
            let span = match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (number(start)?, number(end)?);
                    if start > end {
                        return Err(invalid(&format!("descending range {start}-{end}")));
                    }
                    (start, end)
                }
                None => {
                    let n = number(part)?;
                    (n, n)
                }
            };
            spans.push(span);
        }
        Ok(PageRange::Spans(spans))
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRange::All => f.write_str("all"),
            PageRange::Spans(spans) => {
                for (i, &(start, end)) in spans.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    if start == end {
                        write!(f, "{start}")?;
                    } else {
                        write!(f, "{start}-{end}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lists_and_ranges() {
        let range: PageRange = "1-3, 5,2".parse().unwrap();
        assert_eq!(range, PageRange::Spans(vec![(1, 3), (5, 5), (2, 2)]));
        assert_eq!(range.resolve(10), vec![0, 1, 2, 4]);
        assert_eq!(range.to_string(), "1-3,5,2");
    }

    #[test]
    fn all_covers_document() {
        let range: PageRange = "ALL".parse().unwrap();
        assert_eq!(range.resolve(3), vec![0, 1, 2]);
        assert!(PageRange::All.resolve(0).is_empty());
    }

    #[test]
    fn pages_past_the_end_are_dropped() {
        let range: PageRange = "2-9,12".parse().unwrap();
        assert_eq!(range.resolve(4), vec![1, 2, 3]);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for bad in ["", "0", "3-1", "a", "1,,2", "1-x"] {
            let err = bad.parse::<PageRange>().unwrap_err();
            assert!(matches!(err, DetectError::InvalidPageRange { .. }), "{bad}");
        }
    }
}
