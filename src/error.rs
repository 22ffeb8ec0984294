//! Error kinds raised by the scraping pipeline.
//!
//! The pipeline is partial-success: [`ScrapeError::ExtractionFailed`] and
//! [`ScrapeError::SegmentParseError`] are logged and skipped by their callers,
//! while the remaining variants end a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// An index page exposed no anchor carrying both link markers.
    #[error("no qualifying links found on {url}")]
    NoQualifyingLinks { url: String },

    /// Every index source was tried and none listed the requested date.
    #[error("no broadcast found for {date} after trying {sources_tried} index pages")]
    DateNotFound { date: String, sources_tried: usize },

    /// A detail page had no recognizable content container (or no text in it).
    #[error("extraction failed for {url}: {reason}")]
    ExtractionFailed { url: String, reason: String },

    /// A single bold-tag candidate could not be walked.
    #[error("could not segment bold candidate {candidate:?}: {reason}")]
    SegmentParseError { candidate: String, reason: String },

    /// Links were found but not a single segment yielded text.
    #[error("none of the {attempted} segment pages yielded usable content")]
    NoUsableContent { attempted: usize },

    /// Transport failure while fetching a page.
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Configuration could not be read or is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn extraction(url: &str, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}
