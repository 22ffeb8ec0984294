//! Splitting roundup pages on bold sub-titles.
//!
//! Roundup pages mark each brief with a `<strong>` or `<b>` title followed by
//! its text. Every bold tag in the container is paired with its nearest
//! enclosing `<p>` or `<div>` inside the container: the bold text becomes the
//! sub-title and the text of the following siblings (up to the next bold tag)
//! becomes the sub-content. Text outside the container is never read.

use super::stripped_text;
use crate::error::ScrapeError;
use crate::models::StructuredItem;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Node, Selector};
use tracing::{debug, warn};

static BOLD: Lazy<Selector> = Lazy::new(|| Selector::parse("strong, b").unwrap());

fn is_bold(element: &ElementRef<'_>) -> bool {
    matches!(element.value().name(), "strong" | "b")
}

fn is_block(element: &ElementRef<'_>) -> bool {
    matches!(element.value().name(), "p" | "div")
}

/// Remove the first occurrence of `needle` from `haystack`, then trim.
fn remove_first(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.trim().to_string();
    }
    haystack.replacen(needle, "", 1).trim().to_string()
}

#[derive(Debug)]
pub struct BoldTagSegmenter<'a> {
    blocklist: &'a [String],
}

impl<'a> BoldTagSegmenter<'a> {
    pub fn new(blocklist: &'a [String]) -> Self {
        Self { blocklist }
    }

    fn is_blocked(&self, title: &str) -> bool {
        self.blocklist
            .iter()
            .any(|b| !b.is_empty() && title.contains(b.as_str()))
    }

    /// Raw (title, content) candidates in document order.
    ///
    /// # Arguments
    ///
    /// * `container` - The resolved content container of the page
    ///
    /// # Returns
    ///
    /// One [`StructuredItem`] per non-empty, non-blocklisted bold tag. Content
    /// may be empty; cleanup and de-duplication are left to the caller.
    /// Candidates that cannot be walked are logged and skipped.
    pub fn segment(&self, container: ElementRef<'_>) -> Vec<StructuredItem> {
        let mut items = Vec::new();
        for bold in container.select(&BOLD) {
            match harvest(container, bold) {
                Ok(Some(item)) if self.is_blocked(&item.title) => {
                    debug!(title = %item.title, "Dropping blocklisted bold title");
                }
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Skipping bold candidate"),
            }
        }
        debug!(count = items.len(), "Bold-tag candidates");
        items
    }
}

/// Build one candidate from a bold tag inside `container`.
fn harvest(
    container: ElementRef<'_>,
    bold: ElementRef<'_>,
) -> Result<Option<StructuredItem>, ScrapeError> {
    let title = stripped_text(bold);
    if title.is_empty() {
        return Ok(None);
    }
    let Some(block) = bold
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take_while_inclusive(|el| el.id() != container.id())
        .find(is_block)
    else {
        return Err(ScrapeError::SegmentParseError {
            candidate: title,
            reason: "bold tag has no enclosing paragraph or div".into(),
        });
    };

    let mut content = String::new();
    for node in bold.next_siblings() {
        match node.value() {
            Node::Text(text) => content.push_str(text.trim()),
            Node::Element(_) => {
                let Some(element) = ElementRef::wrap(node) else {
                    continue;
                };
                if is_bold(&element) {
                    break;
                }
                content.push_str(&stripped_text(element));
            }
            _ => {}
        }
    }
    let mut content = remove_first(&content, &title);

    // The container's own siblings lie outside the content.
    if content.is_empty() && block.id() != container.id() {
        if let Some(next) = block.next_siblings().filter_map(ElementRef::wrap).find(is_block) {
            content = remove_first(&stripped_text(next), &title);
        }
    }

    Ok(Some(StructuredItem::new(title, content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn container_items(html: &str) -> Vec<StructuredItem> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("div#content").unwrap();
        let container = document.select(&selector).next().unwrap();
        let blocklist = vec!["央视网消息".to_string(), "新闻联播".to_string()];
        BoldTagSegmenter::new(&blocklist).segment(container)
    }

    #[test]
    fn test_bold_titles_with_trailing_text() {
        let items = container_items(
            r#"<div id="content">
                <p><strong>我国新能源汽车产量突破3000万辆</strong> 工信部今天发布数据显示，产量同比增长32.5%。</p>
                <p><b>全国冬小麦播种基本完成</b> 农业农村部最新农情调度显示，播种面积保持稳定。</p>
                <p><strong>国际油价小幅下跌</strong> 纽约轻质原油期货价格收于每桶72.5美元。</p>
            </div>"#,
        );
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "我国新能源汽车产量突破3000万辆");
        assert_eq!(items[0].content, "工信部今天发布数据显示，产量同比增长32.5%。");
        assert_eq!(items[1].title, "全国冬小麦播种基本完成");
        assert_eq!(items[2].content, "纽约轻质原油期货价格收于每桶72.5美元。");
    }

    #[test]
    fn test_title_only_paragraph_takes_next_block() {
        let items = container_items(
            r#"<div id="content">
                <p><strong>多地迎来降雪</strong></p>
                <p>多地迎来降雪，气象部门提醒注意出行安全。</p>
            </div>"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, "，气象部门提醒注意出行安全。");
    }

    #[test]
    fn test_blocklisted_titles_dropped() {
        let items = container_items(
            r#"<div id="content">
                <p><strong>央视网消息（新闻联播）：</strong>今天的主要内容有：</p>
                <p><strong>全国铁路迎来客流高峰</strong>今天全国铁路预计发送旅客1500万人次。</p>
            </div>"#,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "全国铁路迎来客流高峰");
    }

    #[test]
    fn test_siblings_stop_at_next_bold() {
        let items = container_items(
            r#"<div id="content"><p><b>甲地新闻</b>甲地内容。<span>补充</span><b>乙地新闻</b>乙地内容。</p></div>"#,
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "甲地内容。补充");
        assert_eq!(items[1].content, "乙地内容。");
    }

    #[test]
    fn test_nested_blocks_harvest_once() {
        let items = container_items(
            r#"<div id="content"><div><p><strong>丙地新闻</strong>丙地内容。</p></div></div>"#,
        );
        assert_eq!(items, vec![StructuredItem::new("丙地新闻", "丙地内容。")]);
    }

    #[test]
    fn test_bold_outside_block_is_skipped() {
        let document = Html::parse_document(r#"<article><strong>孤立标题</strong>正文</article>"#);
        let selector = Selector::parse("article").unwrap();
        let container = document.select(&selector).next().unwrap();
        assert!(BoldTagSegmenter::new(&[]).segment(container).is_empty());
    }

    #[test]
    fn test_fallback_stays_inside_container() {
        let document = Html::parse_document(
            r#"<div class="wrapper">
                 <article><strong>孤立标题</strong></article>
                 <p>外部导航文字</p>
               </div>
               <div id="content"><strong>多地迎来降雪</strong></div>
               <div class="sidebar">多地迎来降雪，侧栏推荐。</div>"#,
        );
        let article = Selector::parse("article").unwrap();
        let container = document.select(&article).next().unwrap();
        assert!(BoldTagSegmenter::new(&[]).segment(container).is_empty());

        let content = Selector::parse("div#content").unwrap();
        let container = document.select(&content).next().unwrap();
        let items = BoldTagSegmenter::new(&[]).segment(container);
        assert_eq!(items, vec![StructuredItem::new("多地迎来降雪", "")]);
    }

    #[test]
    fn test_empty_bold_ignored() {
        let items = container_items(r#"<div id="content"><p><strong> </strong>内容</p></div>"#);
        assert!(items.is_empty());
    }
}
