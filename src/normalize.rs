//! Text cleanup applied to every piece of extracted content.
//!
//! The rules run in a fixed order:
//!
//! 1. collapse runs of three or more line breaks to a blank line
//! 2. strip editor bylines (`编辑：…`, `责任编辑：…`)
//! 3. strip known spurious name tokens
//! 4. collapse a line immediately repeated on the next line
//! 5. strip boilerplate attribution phrases
//! 6. collapse blank-line runs and trim
//!
//! The sequence is repeated until the text stops changing, so
//! `normalize(normalize(x)) == normalize(x)` for every input.

use crate::config::ScraperConfig;
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]{3,}").unwrap());

static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n)+").unwrap());

static BYLINE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:责任)?编辑[:：]").unwrap());

/// Longest run treated as a complete name when it is followed by a break.
const MAX_NAME_CHARS: usize = 4;
/// Characters consumed when the name runs straight into the following text.
const FALLBACK_NAME_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct TextNormalizer {
    boilerplate_phrases: Vec<String>,
    spurious_names: Vec<String>,
}

impl TextNormalizer {
    pub fn new(config: &ScraperConfig) -> Self {
        let non_empty = |v: &[String]| {
            v.iter()
                .filter(|s| !s.is_empty())
                .cloned()
                .collect::<Vec<_>>()
        };
        Self {
            boilerplate_phrases: non_empty(&config.boilerplate_phrases),
            spurious_names: non_empty(&config.spurious_names),
        }
    }

    /// Clean a content string.
    ///
    /// Every rule only deletes text, so a pass that changes anything makes the
    /// text strictly shorter and the loop always reaches a fixpoint.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let n = TextNormalizer::new(&ScraperConfig::default());
    /// assert_eq!(n.normalize("编辑：张三责任编辑：李四核心内容。"), "核心内容。");
    /// ```
    pub fn normalize(&self, text: &str) -> String {
        let mut current = self.pass(text);
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Clean a short title: boilerplate phrases go, bylines are left alone.
    pub fn normalize_title(&self, title: &str) -> String {
        let mut title = title.trim().to_string();
        loop {
            let stripped = self.strip_boilerplate(&title).trim().to_string();
            if stripped == title {
                return title;
            }
            title = stripped;
        }
    }

    fn pass(&self, text: &str) -> String {
        let text = LINE_BREAK_RUN.replace_all(text, "\n\n");
        let text = strip_bylines(&text);
        let text = self
            .spurious_names
            .iter()
            .fold(text, |acc, name| acc.replace(name.as_str(), ""));
        let text = collapse_repeated_lines(&text);
        let text = self.strip_boilerplate(&text);
        BLANK_LINE_RUN
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }

    fn strip_boilerplate(&self, text: &str) -> String {
        self.boilerplate_phrases
            .iter()
            .fold(text.to_string(), |acc, phrase| acc.replace(phrase.as_str(), ""))
    }
}

/// Remove a page-title prefix such as `[视频]` and surrounding whitespace.
pub fn strip_title_prefix<'a>(title: &'a str, prefix: &str) -> &'a str {
    let title = title.trim();
    if prefix.is_empty() {
        return title;
    }
    title.strip_prefix(prefix).unwrap_or(title).trim()
}

fn is_name_break(c: char) -> bool {
    c.is_whitespace()
        || c.is_ascii_punctuation()
        || "，。、：；！？（）【】《》〈〉“”‘’「」『』—…".contains(c)
}

/// Byte length of the name that follows a byline label.
fn byline_name_len(text: &str) -> usize {
    let mut run_chars = 0;
    let mut run_bytes = 0;
    let mut fallback_bytes = 0;
    for c in text.chars() {
        if is_name_break(c) {
            break;
        }
        run_chars += 1;
        run_bytes += c.len_utf8();
        if run_chars <= FALLBACK_NAME_CHARS {
            fallback_bytes = run_bytes;
        }
        if run_chars > MAX_NAME_CHARS {
            return fallback_bytes;
        }
    }
    run_bytes
}

fn strip_bylines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(m) = BYLINE_LABEL.find(rest) {
        out.push_str(&rest[..m.start()]);
        let after = rest[m.end()..].trim_start_matches([' ', '\t', '\u{3000}']);
        rest = &after[byline_name_len(after)..];
    }
    out.push_str(rest);
    out
}

fn collapse_repeated_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        if !line.trim().is_empty() && lines.last() == Some(&line) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n")
}
