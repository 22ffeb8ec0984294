//! Runtime configuration for the scraper.
//!
//! Every policy constant the pipeline relies on lives in [`ScraperConfig`]:
//! URL markers, container selectors, boilerplate vocabulary, the segment cap
//! and HTTP settings. The defaults target the CCTV Xinwen Lianbo pages; a YAML
//! file passed with `--config` can override any subset of fields.
//!
//! ```yaml
//! max_segments: 10
//! request_timeout_secs: 15
//! boilerplate_phrases:
//!   - "央视网消息（新闻联播）："
//! ```

use crate::error::ScrapeError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Scheme and host used to resolve relative hrefs.
    pub base_url: String,
    /// Path of the programme's index page, relative to `base_url`.
    pub index_path: String,
    /// Both markers must appear in an href for it to count as a segment link.
    pub link_path_marker: String,
    pub video_marker: String,
    /// Substring that identifies the full-broadcast link.
    pub full_broadcast_marker: String,
    /// Alternate index pages tried when a date is requested but the main index
    /// does not list it. Placeholders: `{yyyy}`, `{mm}`, `{dd}`, `{yyyymmdd}`.
    pub date_fallback_urls: Vec<String>,
    /// Upper bound on detail pages fetched per run.
    pub max_segments: usize,
    /// CSS selectors for the main content container, highest priority first.
    pub container_selectors: Vec<String>,
    /// Title keyword marking a "news brief" roundup page.
    pub roundup_keyword: String,
    /// Paragraphs shorter than this (in characters) are dropped.
    pub min_paragraph_chars: usize,
    /// Bold candidates containing any of these are not sub-items.
    pub title_blocklist: Vec<String>,
    /// Attribution phrases removed everywhere.
    pub boilerplate_phrases: Vec<String>,
    /// Lead phrase that marks the duplicated opening paragraph.
    pub lead_marker: String,
    /// Name tokens removed as known byline leftovers.
    pub spurious_names: Vec<String>,
    /// Temporal words that open a new entry in a roundup.
    pub temporal_markers: Vec<String>,
    /// Place and organisation names that open a new entry in a roundup.
    pub region_markers: Vec<String>,
    /// Prefix stripped from page titles before they are displayed.
    pub video_title_prefix: String,
    pub broadcast_name: String,
    pub banner_image_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tv.cctv.com".to_string(),
            index_path: "/lm/xwlb/".to_string(),
            link_path_marker: "shtml".to_string(),
            video_marker: "VIDE".to_string(),
            full_broadcast_marker: "VIDE0".to_string(),
            date_fallback_urls: strings(&[
                "https://tv.cctv.com/lm/xwlb/day/{yyyymmdd}.shtml",
                "https://tv.cctv.com/{yyyy}/{mm}/{dd}/",
            ]),
            max_segments: 20,
            container_selectors: strings(&[
                "div#content",
                "div.cnt_bd",
                "div.content",
                "article",
                "div.text_area",
                "div.article_body",
                "div.content_area",
            ]),
            roundup_keyword: "联播快讯".to_string(),
            min_paragraph_chars: 10,
            title_blocklist: strings(&[
                "央视网消息",
                "新闻联播",
                "(新闻联播)",
                "央视网消息（新闻联播）",
            ]),
            boilerplate_phrases: strings(&["央视网消息（新闻联播）："]),
            lead_marker: "央视网消息（新闻联播）".to_string(),
            spurious_names: strings(&["刘亮"]),
            temporal_markers: strings(&["今天", "昨日", "近日"]),
            region_markers: strings(&[
                "国家", "上海", "北京", "广东", "海南", "福建", "山东", "江苏", "浙江", "河北",
                "河南", "湖北", "湖南", "四川", "陕西", "甘肃", "青海", "新疆", "西藏", "内蒙古",
                "辽宁", "吉林", "黑龙江", "天津", "重庆", "广西", "宁夏", "山西", "安徽", "江西",
                "贵州", "云南", "香港", "澳门", "台湾", "美国", "英国", "法国", "德国", "日本",
                "韩国", "俄罗斯", "联合国", "国际", "黎巴嫩", "以色列", "伊朗",
            ]),
            video_title_prefix: "[视频]".to_string(),
            broadcast_name: "新闻联播".to_string(),
            banner_image_url: "https://p1.img.cctvpic.com/photoAlbum/templet/common/DEPA1709876391617553/xwlb_logo.png".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
            request_timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a YAML file, or fall back to defaults when no
    /// path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ScrapeError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(Path::new(path))
                    .map_err(|e| ScrapeError::Config(format!("{path}: {e}")))?;
                let config = Self::from_yaml(&raw)?;
                info!(path, "Loaded configuration file");
                config
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ScrapeError> {
        serde_yaml::from_str(raw).map_err(|e| ScrapeError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<(), ScrapeError> {
        if self.link_path_marker.is_empty() || self.video_marker.is_empty() {
            return Err(ScrapeError::Config("link markers must not be empty".into()));
        }
        if self.container_selectors.is_empty() {
            return Err(ScrapeError::Config(
                "at least one container selector is required".into(),
            ));
        }
        if url::Url::parse(&self.base_url).is_err() {
            return Err(ScrapeError::Config(format!(
                "base_url {:?} is not an absolute URL",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn index_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.index_path.trim_start_matches('/')
        )
    }

    /// Expand the fallback URL templates for `date`.
    pub fn fallback_urls_for(&self, date: NaiveDate) -> Vec<String> {
        let yyyy = format!("{:04}", date.year());
        let mm = format!("{:02}", date.month());
        let dd = format!("{:02}", date.day());
        let compact = format!("{yyyy}{mm}{dd}");
        self.date_fallback_urls
            .iter()
            .map(|t| {
                t.replace("{yyyymmdd}", &compact)
                    .replace("{yyyy}", &yyyy)
                    .replace("{mm}", &mm)
                    .replace("{dd}", &dd)
            })
            .collect()
    }
}
