//! Content extraction for a single segment detail page.
//!
//! The extractor resolves the main content container by trying the configured
//! selectors in priority order, then branches on the page title:
//!
//! - **Roundup pages** (title contains the roundup keyword) are split into
//!   sub-items with [`bold::BoldTagSegmenter`]; when that yields fewer than two
//!   items, [`pattern::PatternSegmenter`] splits the flattened paragraph text.
//! - **Ordinary pages** keep their paragraphs as one flat block.
//!
//! All text passes through the [`TextNormalizer`] before it is returned.

pub mod bold;
pub mod pattern;

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::{ExtractedSegment, RawDocument, StructuredItem};
use crate::normalize::TextNormalizer;
use bold::BoldTagSegmenter;
use itertools::Itertools;
use once_cell::sync::Lazy;
use pattern::{EntryBoundary, KeywordBoundary, PatternSegmenter};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

/// Title used when a page has none.
pub const DEFAULT_TITLE: &str = "新闻";

/// Text of `element` with every text node trimmed and concatenated.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(stripped_text)
        .filter(|t| !t.is_empty())
}

#[derive(Debug)]
pub struct ContentExtractor {
    containers: Vec<(String, Selector)>,
    normalizer: TextNormalizer,
    segmenter: PatternSegmenter,
    roundup_keyword: String,
    min_paragraph_chars: usize,
    lead_marker: String,
    title_blocklist: Vec<String>,
}

impl ContentExtractor {
    /// Build an extractor whose roundup entries start at the configured
    /// temporal and region markers.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] if a container selector does not parse
    /// or the marker vocabulary does not compile.
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::with_boundary(config, KeywordBoundary::from_config(config)?)
    }

    /// Build an extractor with a custom entry-start rule for roundup pages
    /// that have no bold sub-titles.
    ///
    /// # Arguments
    ///
    /// * `config` - Container selectors, vocabulary and thresholds
    /// * `boundary` - Decides which sentences open a new roundup entry
    ///
    /// # Example
    ///
    /// ```ignore
    /// let extractor = ContentExtractor::with_boundary(&config, |w: &str| w.starts_with("另据"))?;
    /// ```
    pub fn with_boundary(
        config: &ScraperConfig,
        boundary: impl EntryBoundary + 'static,
    ) -> Result<Self, ScrapeError> {
        let containers = config
            .container_selectors
            .iter()
            .map(|s| {
                Selector::parse(s)
                    .map(|sel| (s.clone(), sel))
                    .map_err(|e| ScrapeError::Config(format!("container selector {s:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            containers,
            normalizer: TextNormalizer::new(config),
            segmenter: PatternSegmenter::new(boundary),
            roundup_keyword: config.roundup_keyword.clone(),
            min_paragraph_chars: config.min_paragraph_chars,
            lead_marker: config.lead_marker.clone(),
            title_blocklist: config.title_blocklist.clone(),
        })
    }

    /// Extract one detail page.
    ///
    /// # Arguments
    ///
    /// * `page` - The fetched HTML and the URL it came from
    ///
    /// # Returns
    ///
    /// The page title, normalized flat content and, for roundup pages with at
    /// least two bold sub-titles, the structured items.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::ExtractionFailed`] when no container matches or the
    /// container holds no usable text.
    #[instrument(level = "info", skip_all, fields(url = %page.url))]
    pub fn extract(&self, page: &RawDocument) -> Result<ExtractedSegment, ScrapeError> {
        let document = Html::parse_document(&page.html);
        let title = page_title(&document).unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let (selector_name, container) = self
            .find_container(&document)
            .ok_or_else(|| ScrapeError::extraction(&page.url, "no content container"))?;
        debug!(selector = %selector_name, "Resolved content container");

        let is_roundup = !self.roundup_keyword.is_empty() && title.contains(&self.roundup_keyword);
        let (flat_content, structured_items) = if is_roundup {
            self.extract_roundup(container)
        } else {
            let text = self.paragraphs(container).join("\n\n");
            (self.normalizer.normalize(&text), None)
        };

        if flat_content.is_empty() {
            return Err(ScrapeError::extraction(&page.url, "content container has no text"));
        }

        info!(
            %title,
            is_roundup,
            chars = flat_content.chars().count(),
            items = structured_items.as_ref().map_or(0, Vec::len),
            "Extracted segment"
        );
        Ok(ExtractedSegment {
            title,
            source_url: page.url.clone(),
            flat_content,
            structured_items,
            is_roundup,
        })
    }

    fn find_container<'a>(&'a self, document: &'a Html) -> Option<(&'a str, ElementRef<'a>)> {
        self.containers.iter().find_map(|(name, selector)| {
            document
                .select(selector)
                .find(|el| !stripped_text(*el).is_empty())
                .map(|el| (name.as_str(), el))
        })
    }

    /// Paragraph texts long enough to keep, with a repeated boilerplate lead
    /// paragraph dropped.
    fn paragraphs(&self, container: ElementRef<'_>) -> Vec<String> {
        let mut kept: Vec<String> = Vec::new();
        for p in container.select(&PARAGRAPH) {
            let text = stripped_text(p);
            if text.chars().count() < self.min_paragraph_chars {
                continue;
            }
            let repeats_lead = !self.lead_marker.is_empty()
                && text.contains(&self.lead_marker)
                && kept.first().is_some_and(|first| first.contains(&self.lead_marker));
            if repeats_lead {
                continue;
            }
            kept.push(text);
        }
        kept
    }

    fn extract_roundup(&self, container: ElementRef<'_>) -> (String, Option<Vec<StructuredItem>>) {
        let raw = BoldTagSegmenter::new(&self.title_blocklist).segment(container);
        let items = self.clean_items(raw);

        if items.len() >= 2 {
            let entries = items.iter().map(|i| format!("{}{}", i.title, i.content));
            return (self.join_entries(entries), Some(items));
        }

        debug!(bold_items = items.len(), "Falling back to pattern segmentation");
        let text = self.normalizer.normalize(&self.paragraphs(container).join("\n\n"));
        let entries = self.segmenter.split(&text);
        (self.join_entries(entries.into_iter()), None)
    }

    /// Normalize each pair and keep the first of each title, dropping pairs
    /// with an empty side.
    fn clean_items(&self, raw: Vec<StructuredItem>) -> Vec<StructuredItem> {
        let mut seen = HashSet::new();
        raw.into_iter()
            .map(|item| {
                StructuredItem::new(
                    self.normalizer.normalize_title(&item.title),
                    self.normalizer.normalize(&item.content),
                )
            })
            .filter(|item| !item.title.is_empty() && !item.content.is_empty())
            .filter(|item| seen.insert(item.title.clone()))
            .collect()
    }

    fn join_entries(&self, entries: impl Iterator<Item = String>) -> String {
        let joined = entries
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unique()
            .join("\n\n");
        self.normalizer.normalize(&joined)
    }
}
