use crate::core::html::selector;
use crate::core::site::subdirectories;
use crate::utils::error::Result;
use regex::Regex;
use scraper::Html;
use std::path::Path;
use std::sync::LazyLock;

static POST_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|/)post/([^/?#]+)/").expect("post href pattern"));

static SHIPMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^agl(\d+)").expect("shipment pattern"));

/// 依 blog/index.html 中 article.blog-card 的順序取得文章 slug（新到舊）
pub fn blog_post_order(index_html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(index_html);
    let card_sel = selector("article.blog-card")?;
    let link_sel = selector("a.blog-card-link")?;

    let mut order = Vec::new();
    for card in doc.select(&card_sel) {
        let Some(href) = card
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            continue;
        };
        if let Some(caps) = POST_HREF_RE.captures(href) {
            let slug = caps[1].to_string();
            if !order.contains(&slug) {
                order.push(slug);
            }
        }
    }
    Ok(order)
}

/// 農場依目錄名稱字母排序
pub fn farm_order(dir: &Path) -> Result<Vec<String>> {
    subdirectories(dir)
}

/// 只收 aglN 目錄，依 N 由大到小（最新在前）
pub fn shipment_order(dir: &Path) -> Result<Vec<String>> {
    let mut shipments: Vec<(u32, String)> = subdirectories(dir)?
        .into_iter()
        .filter_map(|name| {
            let number = SHIPMENT_RE
                .captures(&name)
                .and_then(|c| c[1].parse::<u32>().ok())?;
            Some((number, name))
        })
        .collect();

    shipments.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(shipments.into_iter().map(|(_, name)| name).collect())
}

/// 序列中的前後項。previous 是較舊的一項（index + 1），next 是較新的一項（index - 1）。
/// slug 不在序列中時回傳 None。
pub fn neighbours<'a>(order: &'a [String], slug: &str) -> Option<(Option<&'a str>, Option<&'a str>)> {
    let index = order.iter().position(|s| s == slug)?;
    let previous = order.get(index + 1).map(String::as_str);
    let next = index
        .checked_sub(1)
        .and_then(|i| order.get(i))
        .map(String::as_str);
    Some((previous, next))
}
