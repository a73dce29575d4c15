//! 站台修補動作，每一項都可以重複執行

mod analytics;
mod blog_images;
mod css;
mod events;
mod hamburger;
mod menu;
mod mobile;
mod post_nav;
mod raw_images;
mod social;

pub use analytics::AnalyticsPatch;
pub use blog_images::BlogCardImagesPatch;
pub use css::{MenuHideCssPatch, SpacingCssPatch};
pub use events::{EventHeroPatch, EventParagraphPatch};
pub use hamburger::HamburgerPatch;
pub use menu::{BlogLinkPatch, DedupeMenuPatch, PartnerLinksPatch};
pub use mobile::MobileNavPatch;
pub use post_nav::PostNavPatch;
pub use raw_images::RawImagesPatch;
pub use social::{PartnerImagesPatch, SocialMetaPatch};

use crate::config::SiteConfig;
use crate::core::html::{self, attr, ElementSpan};
use crate::core::site;
use crate::utils::error::Result;
use std::ops::Range;
use std::path::PathBuf;

/// 修補預設作用的頁面範圍
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    AllPages,
    Section(String),
}

impl Scope {
    pub fn targets(&self, config: &SiteConfig) -> Result<Vec<PathBuf>> {
        match self {
            Scope::AllPages => site::html_files(config),
            Scope::Section(section) => site::section_pages(config, section),
        }
    }
}

/// span 範圍內的元素
pub(crate) fn children(page_html: &str, parent: &ElementSpan, tag: &str) -> Result<Vec<ElementSpan>> {
    Ok(html::find_all(page_html, tag)?
        .into_iter()
        .filter(|s| s.start >= parent.open_end && s.end <= parent.close_start)
        .collect())
}

/// span 範圍內所有連結的 href
pub(crate) fn hrefs(page_html: &str, parent: &ElementSpan) -> Result<Vec<String>> {
    Ok(children(page_html, parent, "a")?
        .iter()
        .filter_map(|a| attr(a.open_tag(page_html), "href"))
        .collect())
}

/// 所在行開頭的空白
pub(crate) fn indent_at(text: &str, position: usize) -> &str {
    let line_start = text[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..position];
    &line[..line.len() - line.trim_start().len()]
}

/// 在 after 這個 <li> 後面逐行插入新的 <li>
pub(crate) fn insert_items_after(page_html: &str, after: &ElementSpan, items: &[String]) -> String {
    let indent = indent_at(page_html, after.start);
    let block: String = items
        .iter()
        .map(|item| format!("\n{}{}", indent, item))
        .collect();
    html::insert_at(page_html, after.end, &block)
}

/// `from` 之後第一個規則 `{` 與對應 `}` 之間的區間，會跳過巢狀的 @media 區塊
pub(crate) fn css_rule_body(css: &str, from: usize) -> Option<Range<usize>> {
    let open = from + css[from..].find('{')?;
    let mut depth = 0usize;
    for (i, c) in css[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + 1..open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// 在規則內 `property: ...;` 之後加上宣告，找不到該屬性時加在規則最後
pub(crate) fn insert_declaration(css: &str, body: &Range<usize>, property: &str, declarations: &str) -> String {
    let text = &css[body.clone()];
    let position = text
        .find(&format!("{}:", property))
        .and_then(|at| text[at..].find(';').map(|semi| at + semi + 1))
        .unwrap_or_else(|| text.trim_end().len());
    html::insert_at(css, body.start + position, declarations)
}

/// 以新內容取代第一個 <style> 的內容
pub(crate) fn replace_style(page_html: &str, css: &str) -> Result<Option<String>> {
    let Some(range) = html::style_block(page_html)? else {
        return Ok(None);
    };
    let mut out = page_html.to_string();
    out.replace_range(range, css);
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_items_after_keeps_indent() {
        let page = "<ul>\n    <li><a href=\"a/\">A</a></li>\n</ul>";
        let ul = html::find_first(page, "ul").unwrap().unwrap();
        let items = children(page, &ul, "li").unwrap();
        assert_eq!(hrefs(page, &ul).unwrap(), vec!["a/"]);

        let out = insert_items_after(page, &items[0], &["<li>B</li>".to_string()]);
        assert_eq!(out, "<ul>\n    <li><a href=\"a/\">A</a></li>\n    <li>B</li>\n</ul>");
    }

    #[test]
    fn test_css_rule_body_spans_nested_blocks() {
        let css = "a { x: 1; }\n@media (max-width: 768px) {\n  b { y: 2; }\n}\nc {}";
        let media = css.find("@media").unwrap();
        let body = css_rule_body(css, media).unwrap();
        assert_eq!(&css[body.clone()], "\n  b { y: 2; }\n");

        let out = insert_declaration(css, &css_rule_body(css, 0).unwrap(), "x", " z: 3;");
        assert!(out.starts_with("a { x: 1; z: 3; }"));
        let out = insert_declaration(css, &css_rule_body(css, 0).unwrap(), "w", " z: 3;");
        assert!(out.starts_with("a { x: 1; z: 3; }"));
    }
}
