//! Markdown assembly of the daily digest.
//!
//! # Layout
//!
//! ```text
//! ![新闻联播](banner.png)
//!
//! # 2025年12月26日新闻联播文字版
//!
//! ## 新闻大纲
//! 1. First segment
//! 2. 国内联播快讯
//!
//! ## 详细新闻内容
//!
//! ### First segment
//! Body text
//!
//! ### 国内联播快讯
//! #### Sub-item title
//! Sub-item body
//! ```
//!
//! Sub-headings only appear under roundup segments: either the structured
//! items found on the page, or blank-line separated chunks whose titles are
//! inferred from the text.

use crate::config::ScraperConfig;
use crate::models::{ExtractedSegment, NewsDocument};
use crate::normalize::strip_title_prefix;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use tracing::{debug, instrument};

static URL_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})/(\d{2})/(\d{2})").unwrap());

static TITLE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})(\d{2})(\d{2})").unwrap());

static TEMPORAL_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"今天|昨日|近日|[0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日").unwrap());

/// Punctuation that may close an inferred title, in priority order.
const TITLE_PUNCTUATION: [char; 4] = ['。', '、', '：', '，'];
const DEFAULT_ITEM_TITLE: &str = "新闻快讯";
const PUNCTUATION_RULE_MIN_CHARS: usize = 50;
const PUNCTUATION_WINDOW_CHARS: usize = 100;
const TRUNCATED_TITLE_CHARS: usize = 70;

fn date_from_captures(caps: regex::Captures<'_>) -> Option<NaiveDate> {
    let y = caps[1].parse().ok()?;
    let m = caps[2].parse().ok()?;
    let d = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Pick the broadcast date: an explicit date wins, then a `YYYY/MM/DD` path in
/// the broadcast URL, then `YYYYMMDD` digits in the broadcast title.
pub fn resolve_date(
    explicit: Option<NaiveDate>,
    broadcast_url: &str,
    broadcast_title: &str,
) -> Option<NaiveDate> {
    explicit
        .or_else(|| URL_DATE.captures_iter(broadcast_url).find_map(date_from_captures))
        .or_else(|| TITLE_DATE.captures_iter(broadcast_title).find_map(date_from_captures))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y年%m月%d日").to_string()
}

type TitleRule = (fn(&str) -> bool, fn(&str) -> Option<String>);

/// Title inference strategies, tried in order. The first rule that applies and
/// returns `Some` decides the title; an empty decision becomes the default
/// item title.
const TITLE_RULES: [TitleRule; 3] = [
    (is_long_chunk, title_up_to_punctuation),
    (has_temporal_marker, title_before_temporal_marker),
    (always, truncated_title),
];

fn always(_: &str) -> bool {
    true
}

fn is_long_chunk(chunk: &str) -> bool {
    chunk.chars().count() > PUNCTUATION_RULE_MIN_CHARS
}

fn title_up_to_punctuation(chunk: &str) -> Option<String> {
    let window: String = chunk.chars().take(PUNCTUATION_WINDOW_CHARS).collect();
    TITLE_PUNCTUATION
        .iter()
        .find(|p| window.contains(**p))
        .and_then(|p| {
            let head = chunk.split(*p).next()?.trim();
            Some(format!("{head}{p}"))
        })
}

fn has_temporal_marker(chunk: &str) -> bool {
    TEMPORAL_MARKER.is_match(chunk)
}

/// Text before the first temporal marker. A marker at the very start yields an
/// empty title.
fn title_before_temporal_marker(chunk: &str) -> Option<String> {
    let m = TEMPORAL_MARKER.find(chunk)?;
    let head = chunk[..m.start()].trim();
    if head.is_empty() || head.ends_with(TITLE_PUNCTUATION) {
        Some(head.to_string())
    } else {
        Some(format!("{head}："))
    }
}

fn truncated_title(chunk: &str) -> Option<String> {
    let head: String = chunk.chars().take(TRUNCATED_TITLE_CHARS).collect();
    let head = head.trim();
    if chunk.chars().count() > TRUNCATED_TITLE_CHARS {
        Some(format!("{head}..."))
    } else {
        Some(head.to_string())
    }
}

/// Infer a sub-heading for a chunk of roundup text.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(infer_title("全国铁路 今天发送旅客1500万人次"), "全国铁路：");
/// assert_eq!(infer_title("今天，全国冬小麦播种基本完成。"), "新闻快讯");
/// ```
pub fn infer_title(chunk: &str) -> String {
    TITLE_RULES
        .iter()
        .filter(|(applies, _)| applies(chunk))
        .find_map(|(_, extract)| extract(chunk))
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_ITEM_TITLE.to_string())
}

/// Split a chunk into an inferred title and the remaining body.
pub fn split_chunk(chunk: &str) -> (String, String) {
    let title = infer_title(chunk);
    let body = if chunk.contains(&title) {
        chunk.replacen(&title, "", 1).trim().to_string()
    } else {
        chunk.to_string()
    };
    (title, body)
}

fn render_segment(md: &mut String, segment: &ExtractedSegment, title: &str) {
    writeln!(md, "### {title}").ok();

    if let Some(items) = &segment.structured_items {
        for item in items {
            writeln!(md, "#### {}", item.title.trim()).ok();
            writeln!(md, "{}\n", item.content.trim()).ok();
        }
        return;
    }

    if segment.is_roundup && segment.flat_content.contains("\n\n") {
        for chunk in segment
            .flat_content
            .split("\n\n")
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            let (sub_title, body) = split_chunk(chunk);
            writeln!(md, "#### {sub_title}").ok();
            if !body.is_empty() {
                writeln!(md, "{body}\n").ok();
            }
        }
        return;
    }

    writeln!(md, "{}\n", segment.flat_content).ok();
}

/// Render the Markdown body for the given parts. Pure: identical inputs give
/// identical output.
pub fn render_markdown(
    config: &ScraperConfig,
    date: Option<NaiveDate>,
    outline: &[String],
    segments: &[ExtractedSegment],
) -> String {
    let mut md = String::new();

    writeln!(md, "![{}]({})\n", config.broadcast_name, config.banner_image_url).ok();
    match date {
        Some(date) => writeln!(md, "# {}{}文字版\n", format_date(date), config.broadcast_name).ok(),
        None => writeln!(md, "# {}文字版\n", config.broadcast_name).ok(),
    };

    if !outline.is_empty() {
        writeln!(md, "## 新闻大纲").ok();
        for (i, title) in outline.iter().enumerate() {
            writeln!(md, "{}. {}", i + 1, title).ok();
        }
        writeln!(md).ok();
    }

    if !segments.is_empty() {
        writeln!(md, "## 详细新闻内容\n").ok();
        for (segment, title) in segments.iter().zip(outline) {
            render_segment(&mut md, segment, title);
        }
    }

    md
}

/// Combine the broadcast metadata and extracted segments into the final
/// document.
#[instrument(level = "info", skip_all, fields(%broadcast_url, segments = segments.len()))]
pub fn assemble(
    config: &ScraperConfig,
    broadcast_title: &str,
    broadcast_url: &str,
    explicit_date: Option<NaiveDate>,
    segments: Vec<ExtractedSegment>,
) -> NewsDocument {
    let date = resolve_date(explicit_date, broadcast_url, broadcast_title);
    let outline: Vec<String> = segments
        .iter()
        .map(|s| strip_title_prefix(&s.title, &config.video_title_prefix).to_string())
        .collect();
    let markdown = render_markdown(config, date, &outline, &segments);
    debug!(?date, bytes = markdown.len(), "Assembled document");

    NewsDocument {
        broadcast_title: broadcast_title.trim().to_string(),
        broadcast_url: broadcast_url.to_string(),
        date,
        outline,
        segments,
        markdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StructuredItem;

    fn segment(title: &str, flat: &str, items: Option<Vec<StructuredItem>>, roundup: bool) -> ExtractedSegment {
        ExtractedSegment {
            title: title.to_string(),
            source_url: "https://tv.cctv.com/2025/12/26/VIDEa.shtml".to_string(),
            flat_content: flat.to_string(),
            structured_items: items,
            is_roundup: roundup,
        }
    }

    #[test]
    fn test_date_from_url() {
        let date = resolve_date(None, "https://x/2025/12/26/VIDE0abc251226.shtml", "新闻联播");
        assert_eq!(date.map(format_date).as_deref(), Some("2025年12月26日"));
    }

    #[test]
    fn test_date_priority() {
        let explicit = NaiveDate::from_ymd_opt(2024, 1, 2);
        assert_eq!(
            resolve_date(explicit, "https://x/2025/12/26/VIDE0.shtml", "《新闻联播》 20230101"),
            explicit
        );
        assert_eq!(
            resolve_date(None, "https://x/VIDE0.shtml", "《新闻联播》 20230101"),
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
        assert_eq!(resolve_date(None, "https://x/VIDE0.shtml", "新闻联播"), None);
        // Not a calendar date.
        assert_eq!(resolve_date(None, "https://x/2025/13/45/a", "新闻联播"), None);
    }

    #[test]
    fn test_infer_title_punctuation() {
        let chunk = "国务院常务会议召开。会议研究部署进一步优化营商环境的政策措施，强调要加大力度推动各项政策落地见效，切实为企业减负。";
        assert!(chunk.chars().count() > 50);
        let (title, body) = split_chunk(chunk);
        assert_eq!(title, "国务院常务会议召开。");
        assert!(body.starts_with("会议研究部署"));
    }

    #[test]
    fn test_infer_title_temporal_marker() {
        assert_eq!(infer_title("全国铁路 今天发送旅客1500万人次"), "全国铁路：");
        let (title, body) = split_chunk("全国铁路 今天发送旅客1500万人次");
        assert_eq!(title, "全国铁路：");
        assert_eq!(body, "全国铁路 今天发送旅客1500万人次");
    }

    #[test]
    fn test_leading_temporal_marker_uses_default_title() {
        let chunk = "今天，全国冬小麦播种基本完成。";
        assert_eq!(infer_title(chunk), "新闻快讯");
        let (title, body) = split_chunk(chunk);
        assert_eq!(title, "新闻快讯");
        assert_eq!(body, chunk);

        // Long chunks are still titled by their first punctuation.
        let long = format!("今天，多地开展冬季安全生产检查。{}", "检查覆盖重点行业企业".repeat(5));
        assert_eq!(infer_title(&long), "今天，多地开展冬季安全生产检查。");
    }

    #[test]
    fn test_infer_title_truncation() {
        let short = "北京迎来降雪";
        assert_eq!(infer_title(short), short);
        let long = "甲".repeat(80);
        assert_eq!(infer_title(&long), format!("{}...", "甲".repeat(70)));
    }

    #[test]
    fn test_render_structure() {
        let segments = vec![
            segment("[视频]国家主席会见外宾", "会见正文。", None, false),
            segment(
                "[视频]国内联播快讯",
                "甲乙\n\n丙丁",
                Some(vec![StructuredItem::new("甲", "乙"), StructuredItem::new("丙", "丁")]),
                true,
            ),
        ];
        let config = ScraperConfig::default();
        let doc = assemble(
            &config,
            "《新闻联播》 20251226 21:00",
            "https://tv.cctv.com/2025/12/26/VIDE0abc.shtml",
            None,
            segments,
        );

        assert_eq!(doc.outline, vec!["国家主席会见外宾", "国内联播快讯"]);
        let md = &doc.markdown;
        assert!(md.starts_with("![新闻联播]("));
        assert!(md.contains("# 2025年12月26日新闻联播文字版"));
        assert!(md.contains("## 新闻大纲\n1. 国家主席会见外宾\n2. 国内联播快讯\n"));
        assert!(md.contains("### 国家主席会见外宾\n会见正文。\n"));
        assert!(md.contains("### 国内联播快讯\n#### 甲\n乙\n\n#### 丙\n丁\n"));
        assert_eq!(md.matches("#### ").count(), 2);
        assert_eq!(md, &render_markdown(&config, doc.date, &doc.outline, &doc.segments));
    }

    #[test]
    fn test_flat_roundup_chunks_get_headings() {
        let segments = vec![segment(
            "国际联播快讯",
            "联合国 今天召开安理会会议\n\n美国 近日宣布新的关税措施",
            None,
            true,
        )];
        let doc = assemble(&ScraperConfig::default(), "新闻联播", "https://x/VIDE0.shtml", None, segments);
        assert!(doc.date.is_none());
        assert!(doc.markdown.contains("# 新闻联播文字版"));
        assert!(doc.markdown.contains("#### 联合国：\n联合国 今天召开安理会会议\n"));
        assert!(doc.markdown.contains("#### 美国：\n"));
    }

    #[test]
    fn test_roundup_entry_opening_with_date_keeps_body() {
        let segments = vec![segment(
            "国内联播快讯",
            "2025年12月26日，全国铁路发送旅客1500万人次。\n\n北京迎来降雪",
            None,
            true,
        )];
        let doc = assemble(&ScraperConfig::default(), "新闻联播", "https://x/VIDE0.shtml", None, segments);
        assert!(doc
            .markdown
            .contains("#### 新闻快讯\n2025年12月26日，全国铁路发送旅客1500万人次。\n\n"));
        assert!(doc.markdown.contains("#### 北京迎来降雪\n"));
    }

    #[test]
    fn test_ordinary_segment_never_sub_split() {
        let segments = vec![segment("国内新闻", "第一段。\n\n第二段。", None, false)];
        let doc = assemble(&ScraperConfig::default(), "新闻联播", "https://x/VIDE0.shtml", None, segments);
        assert!(!doc.markdown.contains("####"));
        assert!(doc.markdown.contains("### 国内新闻\n第一段。\n\n第二段。\n"));
    }

    #[test]
    fn test_empty_document_omits_sections() {
        let md = render_markdown(&ScraperConfig::default(), None, &[], &[]);
        assert!(!md.contains("新闻大纲"));
        assert!(!md.contains("详细新闻内容"));
    }
}
