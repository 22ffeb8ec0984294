//! Data models flowing through the pipeline.
//!
//! - [`RawDocument`]: fetched HTML plus the URL it came from
//! - [`LinkSet`]: ordered, duplicate-free segment links from an index page
//! - [`SegmentClassification`]: the full-broadcast link split from the rest
//! - [`ExtractedSegment`]: cleaned text of one detail page
//! - [`NewsDocument`]: the assembled digest, serialized to JSON and Markdown

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fetched page. Owned by the caller and borrowed by the extractors.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub html: String,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Distinct URLs in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `url` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, url: String) -> bool {
        if self.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.urls.iter()
    }

    pub fn first(&self) -> Option<&String> {
        self.urls.first()
    }

    /// Keep only the URLs for which `keep` returns true, preserving order.
    pub fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.urls.retain(|u| keep(u));
        self.seen = self.urls.iter().cloned().collect();
    }
}

impl FromIterator<String> for LinkSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        for url in iter {
            set.insert(url);
        }
        set
    }
}

/// The full-broadcast link and the individual segment links.
///
/// `full_broadcast_url` never appears in `segment_urls`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentClassification {
    pub full_broadcast_url: String,
    pub segment_urls: Vec<String>,
}

/// One (sub-title, sub-content) pair split out of a roundup page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StructuredItem {
    pub title: String,
    pub content: String,
}

impl StructuredItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// The cleaned text of one detail page.
///
/// `structured_items` is only set when bold-tag segmentation produced at least
/// two distinct, non-empty items.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractedSegment {
    /// Page title as found in `<title>`, trimmed.
    pub title: String,
    pub source_url: String,
    pub flat_content: String,
    pub structured_items: Option<Vec<StructuredItem>>,
    /// Whether the page title marked it as a news-brief roundup.
    #[serde(default)]
    pub is_roundup: bool,
}

/// The assembled digest for one broadcast.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsDocument {
    pub broadcast_title: String,
    pub broadcast_url: String,
    pub date: Option<NaiveDate>,
    pub outline: Vec<String>,
    pub segments: Vec<ExtractedSegment>,
    pub markdown: String,
}

impl NewsDocument {
    /// File stem used for persisted copies: `xwlb_YYYYMMDD`, or
    /// `latest_xwlb` when no date resolved.
    pub fn file_stem(&self) -> String {
        match self.date {
            Some(date) => format!("xwlb_{}", date.format("%Y%m%d")),
            None => "latest_xwlb".to_string(),
        }
    }
}
