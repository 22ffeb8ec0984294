//! Segment link discovery on index pages.
//!
//! [`collect_links`] scans every `a[href]` in document order and keeps the
//! hrefs that carry both link markers, resolved against the base URL and
//! de-duplicated. [`classify`] then picks the full-broadcast link out of the
//! set and leaves the rest as individual segments.

use crate::error::ScrapeError;
use crate::models::{LinkSet, SegmentClassification};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Substrings an href must contain to count as a segment link.
#[derive(Debug, Clone, Copy)]
pub struct LinkMarkers<'a> {
    pub link_path: &'a str,
    pub video: &'a str,
}

impl LinkMarkers<'_> {
    fn matches(&self, href: &str) -> bool {
        href.contains(self.link_path) && href.contains(self.video)
    }
}

/// Resolve `href` to an absolute URL, leaving absolute hrefs untouched.
fn resolve(base: &Url, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    base.join(href).ok().map(|u| u.to_string())
}

/// Collect qualifying links from an index page.
///
/// Returns an empty set when nothing qualifies; deciding whether that ends
/// the run is up to the caller.
#[instrument(level = "debug", skip_all, fields(%base_url))]
pub fn collect_links(html: &str, base_url: &Url, markers: LinkMarkers<'_>) -> LinkSet {
    let document = Html::parse_document(html);
    let mut links = LinkSet::new();

    for element in document.select(&ANCHOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if !markers.matches(href) {
            continue;
        }
        match resolve(base_url, href) {
            Some(absolute) => {
                if links.insert(absolute) {
                    debug!(href, "Collected segment link");
                }
            }
            None => debug!(href, "Could not resolve href"),
        }
    }

    info!(count = links.len(), "Collected segment links");
    links
}

/// Split a link set into the full broadcast and its segments.
///
/// The first URL containing `full_broadcast_marker` wins; otherwise the first
/// URL in the set is taken. `cap` bounds how many segment URLs are returned.
pub fn classify(
    links: &LinkSet,
    full_broadcast_marker: &str,
    cap: Option<usize>,
    source: &str,
) -> Result<SegmentClassification, ScrapeError> {
    let full_broadcast_url = links
        .iter()
        .find(|u| !full_broadcast_marker.is_empty() && u.contains(full_broadcast_marker))
        .or_else(|| links.first())
        .cloned()
        .ok_or_else(|| ScrapeError::NoQualifyingLinks {
            url: source.to_string(),
        })?;

    let segment_urls: Vec<String> = links
        .iter()
        .filter(|u| **u != full_broadcast_url)
        .take(cap.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    info!(
        %full_broadcast_url,
        segments = segment_urls.len(),
        "Classified broadcast links"
    );
    Ok(SegmentClassification {
        full_broadcast_url,
        segment_urls,
    })
}

/// `YYYY/MM/DD` path fragment used to match links for a specific day.
pub fn date_path(date: chrono::NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}
