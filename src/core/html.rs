//! HTML 文字層級的修改工具。
//!
//! 讀取用 `scraper`，寫入則直接在原始字串的位元組區間上插入或刪除，
//! 其餘標記維持原樣，重複執行才不會讓整份文件重新序列化。

use crate::utils::error::{Result, SiteError};
use regex::Regex;
use scraper::{Html, Selector};
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Component, Path};
use std::sync::LazyLock;

static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern")
});

static RAW_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(<!--.*?(?:-->|\z))|<script\b[^>]*>(.*?)</script\s*>|<style\b[^>]*>(.*?)</style\s*>",
    )
    .expect("raw text pattern")
});

static TAG_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9-]*)").expect("tag name pattern"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// 元素在原始字串中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementSpan {
    pub start: usize,
    pub open_end: usize,
    pub close_start: usize,
    pub end: usize,
}

impl ElementSpan {
    pub fn inner(&self) -> Range<usize> {
        self.open_end..self.close_start
    }

    pub fn outer(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn open_tag<'a>(&self, html: &'a str) -> &'a str {
        &html[self.start..self.open_end]
    }
}

pub fn tag_name(open_tag: &str) -> &str {
    TAG_NAME_RE
        .captures(open_tag)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// 解析開始標籤的屬性，名稱一律轉小寫
pub fn attributes(open_tag: &str) -> Vec<(String, String)> {
    let body = &open_tag[(1 + tag_name(open_tag).len()).min(open_tag.len())..];
    ATTR_RE
        .captures_iter(body)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or("");
            (caps[1].to_ascii_lowercase(), value.to_string())
        })
        .collect()
}

pub fn attr(open_tag: &str, name: &str) -> Option<String> {
    attributes(open_tag)
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value)
}

pub fn has_class(open_tag: &str, class: &str) -> bool {
    attr(open_tag, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// 註解整段、`<script>` 與 `<style>` 的內容換成等長空白，標籤本身保留。
/// 位元組位置不變，比對結果可以直接對應回原始字串。
fn mask_raw_text(html: &str) -> Cow<'_, str> {
    let mut ranges = Vec::new();
    for caps in RAW_TEXT_RE.captures_iter(html) {
        if let Some(m) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) {
            if !m.is_empty() {
                ranges.push(m.range());
            }
        }
    }
    if ranges.is_empty() {
        return Cow::Borrowed(html);
    }

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for range in ranges {
        out.push_str(&html[last..range.start]);
        out.push_str(&" ".repeat(range.len()));
        last = range.end;
    }
    out.push_str(&html[last..]);
    Cow::Owned(out)
}

/// 找出所有指定標籤的元素（含巢狀）。
///
/// 註解、`<script>`、`<style>` 裡看起來像標籤的文字不算。
/// 找不到對應結束標籤的元素（例如省略 `</li>`）視為空元素：
/// `close_start == end == open_end`，只涵蓋開始標籤，不會吃掉後面的兄弟元素。
pub fn find_all(html: &str, tag: &str) -> Result<Vec<ElementSpan>> {
    let escaped = regex::escape(tag);
    let open_re = Regex::new(&format!(r"(?i)<{}\b[^>]*>", escaped))?;
    let any_re = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*>", escaped))?;
    let is_void = VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str());
    let masked = mask_raw_text(html);
    let haystack: &str = &masked;

    let mut spans = Vec::new();
    for m in open_re.find_iter(haystack) {
        let open_end = m.end();
        if is_void || m.as_str().ends_with("/>") {
            spans.push(ElementSpan {
                start: m.start(),
                open_end,
                close_start: open_end,
                end: open_end,
            });
            continue;
        }

        let mut depth = 1usize;
        let mut close = None;
        for caps in any_re.captures_iter(&haystack[open_end..]) {
            let whole = match caps.get(0) {
                Some(w) => w,
                None => continue,
            };
            if &caps[1] == "/" {
                depth -= 1;
                if depth == 0 {
                    close = Some((open_end + whole.start(), open_end + whole.end()));
                    break;
                }
            } else if !whole.as_str().ends_with("/>") {
                depth += 1;
            }
        }

        let (close_start, end) = close.unwrap_or((open_end, open_end));
        spans.push(ElementSpan {
            start: m.start(),
            open_end,
            close_start,
            end,
        });
    }
    Ok(spans)
}

pub fn find_first(html: &str, tag: &str) -> Result<Option<ElementSpan>> {
    Ok(find_all(html, tag)?.into_iter().next())
}

/// 找出帶有指定 class 的元素
pub fn find_elements(html: &str, tag: &str, class: &str) -> Result<Vec<ElementSpan>> {
    Ok(find_all(html, tag)?
        .into_iter()
        .filter(|span| has_class(span.open_tag(html), class))
        .collect())
}

pub fn find_first_with_class(html: &str, tag: &str, class: &str) -> Result<Option<ElementSpan>> {
    Ok(find_elements(html, tag, class)?.into_iter().next())
}

pub fn insert_at(html: &str, position: usize, snippet: &str) -> String {
    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..position]);
    out.push_str(snippet);
    out.push_str(&html[position..]);
    out
}

/// 插在第一個 </head> 之前，自成一行
pub fn insert_before_head_close(html: &str, snippet: &str) -> Option<String> {
    let position = html.to_ascii_lowercase().find("</head>")?;
    Some(insert_at(html, position, &format!("\n{}\n", snippet)))
}

/// 插在最後一個 </body> 之前
pub fn insert_before_body_close(html: &str, snippet: &str) -> Option<String> {
    let position = html.to_ascii_lowercase().rfind("</body>")?;
    Some(insert_at(html, position, &format!("{}\n", snippet)))
}

/// 第一個 <style> 的內容區間
pub fn style_block(html: &str) -> Result<Option<Range<usize>>> {
    Ok(find_first(html, "style")?.map(|span| span.inner()))
}

pub fn style_content(html: &str) -> Result<Option<&str>> {
    Ok(style_block(html)?.map(|range| &html[range]))
}

/// 接在第一個 <style> 內容尾端（保留原本結尾的縮排）
pub fn append_css(html: &str, css: &str) -> Result<Option<String>> {
    let Some(range) = style_block(html)? else {
        return Ok(None);
    };
    let position = range.start + html[range.clone()].trim_end().len();
    Ok(Some(insert_at(html, position, css)))
}

/// 在 <style> 內容的指定偏移處插入
pub fn insert_css_at(html: &str, offset_in_style: usize, css: &str) -> Result<Option<String>> {
    let Some(range) = style_block(html)? else {
        return Ok(None);
    };
    let position = (range.start + offset_in_style).min(range.end);
    Ok(Some(insert_at(html, position, css)))
}

pub fn add_class(html: &str, span: &ElementSpan, class: &str) -> String {
    let open = span.open_tag(html);
    if has_class(open, class) {
        return html.to_string();
    }

    let name_len = tag_name(open).len();
    let body_offset = span.start + 1 + name_len;
    for caps in ATTR_RE.captures_iter(&open[1 + name_len..]) {
        if !caps[1].eq_ignore_ascii_case("class") {
            continue;
        }
        if let Some(value) = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)) {
            let at = body_offset + value.end();
            let sep = if value.as_str().trim().is_empty() { "" } else { " " };
            return insert_at(html, at, &format!("{}{}", sep, class));
        }
    }

    insert_at(html, body_offset, &format!(" class=\"{}\"", class))
}

/// 設定屬性值，不存在時加在標籤結尾前
pub fn set_attr(html: &str, span: &ElementSpan, name: &str, value: &str) -> String {
    let open = span.open_tag(html);
    let name_len = tag_name(open).len();
    let body_offset = span.start + 1 + name_len;
    let escaped = escape_attr(value);

    for caps in ATTR_RE.captures_iter(&open[1 + name_len..]) {
        if !caps[1].eq_ignore_ascii_case(name) {
            continue;
        }
        if let Some(whole) = caps.get(0) {
            let start = body_offset + whole.start();
            let end = body_offset + whole.end();
            let replacement = format!("{}=\"{}\"", &caps[1], escaped);
            let mut out = String::with_capacity(html.len() + replacement.len());
            out.push_str(&html[..start]);
            out.push_str(&replacement);
            out.push_str(&html[end..]);
            return out;
        }
    }

    let close_len = if open.ends_with("/>") { 2 } else { 1 };
    let trimmed = open[..open.len() - close_len].trim_end().len();
    insert_at(
        html,
        span.start + trimmed,
        &format!(" {}=\"{}\"", name, escaped),
    )
}

/// 移除元素，連同緊接的一個換行。巢狀於已移除區間內的元素會被略過。
pub fn remove_spans(html: &str, spans: &[ElementSpan]) -> String {
    let mut sorted: Vec<ElementSpan> = spans.to_vec();
    sorted.sort_by_key(|s| s.start);

    let mut kept: Vec<ElementSpan> = Vec::new();
    for span in sorted {
        if kept.last().is_some_and(|last| span.start < last.end) {
            continue;
        }
        kept.push(span);
    }

    let mut out = html.to_string();
    for span in kept.iter().rev() {
        let mut end = span.end;
        if out[end..].starts_with("\r\n") {
            end += 2;
        } else if out[end..].starts_with('\n') {
            end += 1;
        }
        out.replace_range(span.start..end, "");
    }
    out
}

/// 修正先前腳本留下的 class_="..." 屬性
pub fn normalize_class_attrs(html: &str) -> String {
    html.replace("class_=\"", "class=\"")
}

/// 依頁面所在目錄層數回到站台根目錄，例如 post/a/index.html -> "../../"
pub fn relative_root(rel_path: &Path) -> String {
    let depth = rel_path
        .parent()
        .map(|p| {
            p.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0);
    "../".repeat(depth)
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| SiteError::ProcessingError {
        message: format!("invalid selector '{}': {}", css, e),
    })
}

/// 元素文字，去除前後空白
pub fn first_text(doc: &Html, css: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string()))
}

pub fn first_attr(doc: &Html, css: &str, name: &str) -> Result<Option<String>> {
    let sel = selector(css)?;
    Ok(doc
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(name))
        .map(str::to_string))
}

pub fn meta_property(doc: &Html, property: &str) -> Result<Option<String>> {
    first_attr(doc, &format!(r#"meta[property="{}"]"#, property), "content")
}
