//! og:image / twitter:image 等社群預覽 meta 標籤

use crate::core::html::{self, attr, escape_html, ElementSpan};
use crate::utils::error::{Result, SiteError};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use url::Url;

static INLINE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).expect("url() pattern"));

static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"background-image:\s*url\(\s*["']?([^"')]+)["']?\s*\)"#)
        .expect("background-image pattern")
});

const HERO_CLASSES: &[&str] = &["partner-hero", "farm-hero", "journey-hero"];

/// 頁面主視覺圖片（原始寫法，尚未轉成絕對網址）
pub fn hero_image(page_html: &str) -> Result<Option<String>> {
    for section in html::find_all(page_html, "section")? {
        let open = section.open_tag(page_html);
        if !HERO_CLASSES.iter().any(|c| html::has_class(open, c)) {
            continue;
        }
        let Some(style) = attr(open, "style") else {
            continue;
        };
        if let Some(caps) = INLINE_URL_RE.captures(&style) {
            return Ok(Some(caps[1].trim().to_string()));
        }
    }

    for style in html::find_all(page_html, "style")? {
        if let Some(caps) = BACKGROUND_URL_RE.captures(&page_html[style.inner()]) {
            return Ok(Some(caps[1].trim().to_string()));
        }
    }

    Ok(None)
}

/// 以頁面位置解析相對路徑，http(s) 絕對網址原樣保留
pub fn resolve_image_url(base_url: &str, rel_path: &Path, image: &str) -> Result<String> {
    if image.starts_with("http://") || image.starts_with("https://") {
        return Ok(image.to_string());
    }

    let page_url = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        rel_path.to_string_lossy().replace('\\', "/")
    );
    let page = Url::parse(&page_url).map_err(|e| SiteError::InvalidConfigValueError {
        field: "site.base_url".to_string(),
        value: base_url.to_string(),
        reason: e.to_string(),
    })?;
    let resolved = page.join(image).map_err(|e| SiteError::html(page_url.as_str(), e.to_string()))?;
    Ok(resolved.to_string())
}

/// property 或 name 屬性符合的第一個 meta
pub fn find_meta(page_html: &str, property: &str) -> Result<Option<ElementSpan>> {
    Ok(html::find_all(page_html, "meta")?.into_iter().find(|span| {
        let open = span.open_tag(page_html);
        attr(open, "property").as_deref() == Some(property) || attr(open, "name").as_deref() == Some(property)
    }))
}

pub fn meta_content(page_html: &str, property: &str) -> Result<Option<String>> {
    Ok(find_meta(page_html, property)?.and_then(|span| attr(span.open_tag(page_html), "content")))
}

fn line_indent(text: &str, position: usize) -> &str {
    let line_start = text[..position].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..position];
    &line[..line.len() - line.trim_start().len()]
}

/// 設定 meta content；標籤不存在時插在 anchor 之後。沒有變更時回傳 None。
pub fn upsert_meta(page_html: &str, property: &str, value: &str, anchor: &str) -> Result<Option<String>> {
    if let Some(span) = find_meta(page_html, property)? {
        if attr(span.open_tag(page_html), "content").as_deref() == Some(value) {
            return Ok(None);
        }
        return Ok(Some(html::set_attr(page_html, &span, "content", value)));
    }

    let Some(anchor_span) = find_meta(page_html, anchor)? else {
        return Ok(None);
    };
    let indent = line_indent(page_html, anchor_span.start);
    let tag = format!(
        "\n{}<meta property=\"{}\" content=\"{}\">",
        indent,
        property,
        escape_html(value)
    );
    Ok(Some(html::insert_at(page_html, anchor_span.end, &tag)))
}
