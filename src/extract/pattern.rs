//! Keyword-anchored splitting of roundup text into entries.
//!
//! Text is cut into sentences on runs of `。！？`. A sentence that opens with
//! an entry-start marker begins a new entry; any other sentence extends the
//! entry in progress. What counts as an entry start is decided by an
//! [`EntryBoundary`], so the vocabulary can be swapped without touching the
//! splitting itself.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static INLINE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\n\s*").unwrap());

const SENTENCE_END: [char; 3] = ['。', '！', '？'];

/// Decides whether a sentence opens a new entry.
pub trait EntryBoundary: Send + Sync {
    fn is_entry_start(&self, window: &str) -> bool;
}

impl<F> EntryBoundary for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_entry_start(&self, window: &str) -> bool {
        self(window)
    }
}

/// Entry starts are a numbered marker (`3条`), an explicit date
/// (`2025年12月26日`), or one of a configured list of temporal words and
/// place names.
#[derive(Debug, Clone)]
pub struct KeywordBoundary {
    pattern: Regex,
}

impl KeywordBoundary {
    /// Compile the entry-start pattern.
    ///
    /// Keywords are tried longest first, so `内蒙古` wins over a shorter
    /// overlapping name. Empty keywords are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Config`] if the combined pattern does not
    /// compile.
    pub fn new(temporal_markers: &[String], region_markers: &[String]) -> Result<Self, ScrapeError> {
        let keywords = temporal_markers
            .iter()
            .chain(region_markers)
            .filter(|k| !k.is_empty())
            .sorted_by_key(|k| std::cmp::Reverse(k.chars().count()))
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>();

        let mut alternatives = vec![
            r"[0-9]+条".to_string(),
            r"[0-9]{4}年[0-9]{1,2}月[0-9]{1,2}日".to_string(),
        ];
        alternatives.extend(keywords);

        let pattern = Regex::new(&format!("^(?:{})", alternatives.join("|")))
            .map_err(|e| ScrapeError::Config(format!("entry boundary pattern: {e}")))?;
        Ok(Self { pattern })
    }

    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Self::new(&config.temporal_markers, &config.region_markers)
    }
}

impl EntryBoundary for KeywordBoundary {
    fn is_entry_start(&self, window: &str) -> bool {
        self.pattern.is_match(window)
    }
}

pub struct PatternSegmenter {
    boundary: Box<dyn EntryBoundary>,
}

impl fmt::Debug for PatternSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternSegmenter").finish_non_exhaustive()
    }
}

impl PatternSegmenter {
    pub fn new(boundary: impl EntryBoundary + 'static) -> Self {
        Self {
            boundary: Box::new(boundary),
        }
    }

    /// Split `text` into trimmed, distinct entries in order of appearance.
    ///
    /// Sentences before the first entry start form an entry of their own.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let entries = segmenter.split("北京举行冬季运动会开幕式。上海发布新一轮消费促进政策。");
    /// assert_eq!(entries, vec!["北京举行冬季运动会开幕式。", "上海发布新一轮消费促进政策。"]);
    /// ```
    pub fn split(&self, text: &str) -> Vec<String> {
        let text = INLINE_WHITESPACE.replace_all(text, " ");
        let mut entries: Vec<String> = Vec::new();
        let mut current = String::new();

        for sentence in sentences(text.trim()) {
            if self.boundary.is_entry_start(sentence.trim_start()) && !current.trim().is_empty() {
                entries.push(std::mem::take(&mut current));
            }
            current.push_str(sentence);
        }
        entries.push(current);

        entries
            .into_iter()
            .map(|e| LINE_BREAKS.replace_all(e.trim(), "\n").into_owned())
            .filter(|e| !e.is_empty())
            .unique()
            .collect()
    }
}

/// Sentences including their closing punctuation run; a trailing fragment
/// without punctuation is yielded as the last sentence.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if !SENTENCE_END.contains(&c) {
            continue;
        }
        if let Some(&(_, next)) = chars.peek() {
            if SENTENCE_END.contains(&next) {
                continue;
            }
        }
        let end = i + c.len_utf8();
        out.push(&text[start..end]);
        start = end;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}
