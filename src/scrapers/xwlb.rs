//! Xinwen Lianbo (CCTV evening news) digest builder.
//!
//! The programme's index page at `https://tv.cctv.com/lm/xwlb/` links the
//! full broadcast and one page per news segment, e.g.
//! `https://tv.cctv.com/2025/12/26/VIDE0....shtml`. A run:
//!
//! 1. **Indexing**: collect segment links from the index page, or for a
//!    requested date, from the first index source that lists that date
//! 2. **Fetching**: download the full-broadcast page for its title, then each
//!    segment page in order
//! 3. **Assembly**: extract, normalize and render the digest
//!
//! A failing segment is logged and skipped; it never aborts the run.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract::{ContentExtractor, page_title};
use crate::fetch::PageFetcher;
use crate::links::{LinkMarkers, classify, collect_links, date_path};
use crate::models::{ExtractedSegment, LinkSet, NewsDocument, RawDocument};
use crate::outputs::markdown;
use crate::utils::truncate_for_log;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use scraper::Html;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

fn markers(config: &ScraperConfig) -> LinkMarkers<'_> {
    LinkMarkers {
        link_path: &config.link_path_marker,
        video: &config.video_marker,
    }
}

fn fetch_error(url: &str, e: impl std::fmt::Display) -> ScrapeError {
    ScrapeError::Fetch {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// Collect segment links for the run, returning them with the URL of the
/// index source they came from.
///
/// Without a date the main index page is the only source. With a date, links
/// on the main index must contain the `YYYY/MM/DD` path; if none do, the
/// configured fallback index pages are tried in order.
#[instrument(level = "info", skip_all, fields(?date))]
pub async fn index_links<F: PageFetcher>(
    fetcher: &F,
    config: &ScraperConfig,
    date: Option<NaiveDate>,
) -> Result<(LinkSet, String), ScrapeError> {
    let base = Url::parse(&config.base_url).map_err(|e| ScrapeError::Config(e.to_string()))?;
    let index_url = config.index_url();

    let Some(date) = date else {
        let html = fetcher
            .fetch(&index_url)
            .await
            .map_err(|e| fetch_error(&index_url, e))?;
        let links = collect_links(&html, &base, markers(config));
        if links.is_empty() {
            return Err(ScrapeError::NoQualifyingLinks { url: index_url });
        }
        return Ok((links, index_url));
    };

    let wanted = date_path(date);
    match fetcher.fetch(&index_url).await {
        Ok(html) => {
            let mut links = collect_links(&html, &base, markers(config));
            links.retain(|u| u.contains(&wanted));
            if !links.is_empty() {
                info!(count = links.len(), source = %index_url, "Index lists requested date");
                return Ok((links, index_url));
            }
            info!(%wanted, "Index does not list requested date; trying fallbacks");
        }
        Err(e) => warn!(url = %index_url, error = %e, "Index fetch failed; trying fallbacks"),
    }

    let fallbacks = config.fallback_urls_for(date);
    for url in &fallbacks {
        match fetcher.fetch(url).await {
            Ok(html) => {
                let links = collect_links(&html, &base, markers(config));
                if !links.is_empty() {
                    info!(count = links.len(), source = %url, "Fallback index lists requested date");
                    return Ok((links, url.clone()));
                }
                debug!(%url, "Fallback index has no qualifying links");
            }
            Err(e) => warn!(%url, error = %e, "Fallback index fetch failed"),
        }
    }

    Err(ScrapeError::DateNotFound {
        date: date.to_string(),
        sources_tried: fallbacks.len() + 1,
    })
}

/// Title of the full-broadcast page, or the programme name if it cannot be read.
#[instrument(level = "info", skip_all, fields(%url))]
async fn broadcast_title<F: PageFetcher>(fetcher: &F, config: &ScraperConfig, url: &str) -> String {
    match fetcher.fetch(url).await {
        Ok(html) => page_title(&Html::parse_document(&html)).unwrap_or_else(|| {
            warn!("Full broadcast page has no title");
            config.broadcast_name.clone()
        }),
        Err(e) => {
            warn!(error = %e, "Full broadcast fetch failed; using programme name");
            config.broadcast_name.clone()
        }
    }
}

async fn fetch_segment<F: PageFetcher>(
    fetcher: &F,
    extractor: &ContentExtractor,
    url: &str,
) -> Result<ExtractedSegment, ScrapeError> {
    let html = fetcher.fetch(url).await.map_err(|e| fetch_error(url, e))?;
    extractor.extract(&RawDocument::new(url, html))
}

/// Fetch and extract segment pages one at a time, in order. Failures are
/// logged and skipped.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn fetch_segments<F: PageFetcher>(
    fetcher: &F,
    extractor: &ContentExtractor,
    urls: &[String],
) -> Vec<ExtractedSegment> {
    let total = urls.len();
    let segments: Vec<ExtractedSegment> = stream::iter(urls.iter().enumerate())
        .then(|(i, url)| async move {
            debug!(index = i + 1, total, %url, "Fetching segment");
            match fetch_segment(fetcher, extractor, url).await {
                Ok(segment) => {
                    debug!(
                        %url,
                        preview = %truncate_for_log(&segment.flat_content, 80),
                        "Segment extracted"
                    );
                    Some(segment)
                }
                Err(e @ ScrapeError::ExtractionFailed { .. }) => {
                    warn!(%url, error = %e, "Segment has no usable content; skipping");
                    None
                }
                Err(e) => {
                    error!(%url, error = %e, "Segment fetch failed; skipping");
                    None
                }
            }
        })
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(fetched = segments.len(), attempted = total, "Fetched segment contents");
    segments
}

/// Run the whole pipeline and return the assembled document.
#[instrument(level = "info", skip_all, fields(?date))]
pub async fn build_digest<F: PageFetcher>(
    fetcher: &F,
    config: &ScraperConfig,
    date: Option<NaiveDate>,
) -> Result<NewsDocument, ScrapeError> {
    let extractor = ContentExtractor::new(config)?;
    let (links, source) = index_links(fetcher, config, date).await?;
    let classification = classify(
        &links,
        &config.full_broadcast_marker,
        Some(config.max_segments),
        &source,
    )?;

    let title = broadcast_title(fetcher, config, &classification.full_broadcast_url).await;
    info!(%title, "Full broadcast");

    let segments = fetch_segments(fetcher, &extractor, &classification.segment_urls).await;
    if segments.is_empty() {
        return Err(ScrapeError::NoUsableContent {
            attempted: classification.segment_urls.len(),
        });
    }

    Ok(markdown::assemble(
        config,
        &title,
        &classification.full_broadcast_url,
        date,
        segments,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::ScriptedFetcher;

    const INDEX: &str = "https://tv.cctv.com/lm/xwlb/";
    const FULL: &str = "https://tv.cctv.com/2025/12/26/VIDE0full251226.shtml";

    fn segment_url(i: usize) -> String {
        format!("https://tv.cctv.com/2025/12/26/VIDEseg{i:02}.shtml")
    }

    fn index_html(count: usize) -> String {
        let mut html = String::from(r#"<html><body><a href="/2025/12/26/VIDE0full251226.shtml">完整版</a>"#);
        for i in 0..count {
            html.push_str(&format!(r#"<a href="/2025/12/26/VIDEseg{i:02}.shtml">第{i}条</a>"#));
        }
        html.push_str(r#"<a href="/lm/xwlb/about.html">关于</a></body></html>"#);
        html
    }

    fn detail_html(i: usize) -> String {
        format!(
            r#"<html><head><title>[视频]第{i}条新闻标题</title></head><body>
               <div id="content"><p>这是第{i}条新闻的正文内容，足够长。</p></div></body></html>"#
        )
    }

    fn full_html() -> &'static str {
        "<html><head><title>《新闻联播》 20251226 21:00</title></head><body></body></html>"
    }

    #[tokio::test]
    async fn test_one_failed_segment_does_not_abort_run() {
        let mut fetcher = ScriptedFetcher::default()
            .with_page(INDEX, &index_html(20))
            .with_page(FULL, full_html())
            .failing(&segment_url(7));
        for i in 0..20 {
            fetcher = fetcher.with_page(&segment_url(i), &detail_html(i));
        }

        let doc = build_digest(&fetcher, &ScraperConfig::default(), None).await.unwrap();
        assert_eq!(doc.segments.len(), 19);
        assert!(!doc.outline.contains(&"第7条新闻标题".to_string()));
        assert_eq!(doc.outline[0], "第0条新闻标题");
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2025, 12, 26));
        assert!(doc.markdown.contains("2025年12月26日"));
        assert_eq!(doc.broadcast_title, "《新闻联播》 20251226 21:00");
    }

    #[tokio::test]
    async fn test_segments_fetched_in_order_and_capped() {
        let mut fetcher = ScriptedFetcher::default()
            .with_page(INDEX, &index_html(25))
            .with_page(FULL, full_html());
        for i in 0..25 {
            fetcher = fetcher.with_page(&segment_url(i), &detail_html(i));
        }
        let config = ScraperConfig {
            max_segments: 3,
            ..ScraperConfig::default()
        };

        let doc = build_digest(&fetcher, &config, None).await.unwrap();
        assert_eq!(doc.outline, vec!["第0条新闻标题", "第1条新闻标题", "第2条新闻标题"]);
        let calls = fetcher.calls.borrow();
        assert_eq!(
            calls.as_slice(),
            &[INDEX.to_string(), FULL.to_string(), segment_url(0), segment_url(1), segment_url(2)]
        );
    }

    #[tokio::test]
    async fn test_empty_index_is_no_qualifying_links() {
        let fetcher = ScriptedFetcher::default().with_page(INDEX, "<html><a href='/x.html'>x</a></html>");
        let err = build_digest(&fetcher, &ScraperConfig::default(), None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::NoQualifyingLinks { .. }));
    }

    #[tokio::test]
    async fn test_all_segments_failing_is_no_usable_content() {
        let fetcher = ScriptedFetcher::default()
            .with_page(INDEX, &index_html(2))
            .with_page(FULL, full_html())
            .failing(&segment_url(0))
            .with_page(&segment_url(1), "<html><body><span>空</span></body></html>");
        let err = build_digest(&fetcher, &ScraperConfig::default(), None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::NoUsableContent { attempted: 2 }));
    }

    #[tokio::test]
    async fn test_missing_full_broadcast_page_uses_programme_name() {
        let fetcher = ScriptedFetcher::default()
            .with_page(INDEX, &index_html(1))
            .with_page(&segment_url(0), &detail_html(0));
        let doc = build_digest(&fetcher, &ScraperConfig::default(), None).await.unwrap();
        assert_eq!(doc.broadcast_title, "新闻联播");
        // Date still comes from the broadcast URL.
        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2025, 12, 26));
    }

    #[tokio::test]
    async fn test_date_found_on_fallback_source() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let fallback = "https://tv.cctv.com/lm/xwlb/day/20251220.shtml";
        let fetcher = ScriptedFetcher::default()
            .with_page(INDEX, &index_html(2))
            .with_page(
                fallback,
                r#"<a href="//tv.cctv.com/2025/12/20/VIDE0old.shtml">完整版</a>
                   <a href="https://tv.cctv.com/2025/12/20/VIDEold1.shtml">旧闻</a>"#,
            );
        let (links, source) = index_links(&fetcher, &ScraperConfig::default(), Some(date))
            .await
            .unwrap();
        assert_eq!(source, fallback);
        assert_eq!(links.len(), 2);
        assert_eq!(links.first().map(String::as_str), Some("https://tv.cctv.com/2025/12/20/VIDE0old.shtml"));
    }

    #[tokio::test]
    async fn test_date_on_main_index_is_filtered() {
        let date = NaiveDate::from_ymd_opt(2025, 12, 26).unwrap();
        let html = format!(
            r#"{}<a href="/2025/12/25/VIDEyesterday.shtml">昨天</a>"#,
            index_html(2)
        );
        let fetcher = ScriptedFetcher::default().with_page(INDEX, &html);
        let (links, source) = index_links(&fetcher, &ScraperConfig::default(), Some(date))
            .await
            .unwrap();
        assert_eq!(source, INDEX);
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|u| u.contains("2025/12/26")));
    }

    #[tokio::test]
    async fn test_date_not_found_after_all_sources() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let fetcher = ScriptedFetcher::default().with_page(INDEX, &index_html(3));
        let err = index_links(&fetcher, &ScraperConfig::default(), Some(date))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::DateNotFound { sources_tried: 3, .. }));
        assert_eq!(fetcher.calls.borrow().len(), 3);
    }
}
