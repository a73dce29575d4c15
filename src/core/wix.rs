//! 解析另存的 Wix Domains 管理頁面，取出 DNS 紀錄

use crate::core::dns::{convert_ttl_to_seconds, dedupe};
use crate::core::html::selector;
use crate::domain::model::DnsRecord;
use crate::utils::error::Result;
use scraper::{ElementRef, Html, Selector};

const HOOK_PREFIX: &str = "dns-records--table-content--";

fn hook(name: &str) -> Result<Selector> {
    selector(&format!(r#"[data-hook="{}{}--view"]"#, HOOK_PREFIX, name))
}

/// 欄位文字；同一個 hook 可能巢狀出現，取最內層的非空文字
fn cell_text(row: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    row.select(sel)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .last()
}

pub fn parse_wix_dns(page_html: &str) -> Result<Vec<DnsRecord>> {
    let doc = Html::parse_document(page_html);
    let row_sel = selector("tr[data-table-row]")?;
    let host_sel = hook("host-name")?;
    let value_sel = hook("value")?;
    let mx_sel = hook("mx-points-to")?;
    let ttl_sel = hook("ttl")?;

    let mut records = Vec::new();
    for row in doc.select(&row_sel) {
        let hostname = cell_text(&row, &host_sel).unwrap_or_default();
        let value = cell_text(&row, &value_sel)
            .or_else(|| cell_text(&row, &mx_sel))
            .unwrap_or_default();
        let ttl = cell_text(&row, &ttl_sel).and_then(|t| convert_ttl_to_seconds(&t));

        if hostname.is_empty() && value.is_empty() {
            continue;
        }
        records.push(DnsRecord::new(hostname, value, ttl));
    }

    tracing::debug!("Parsed {} DNS rows from Wix export", records.len());
    Ok(dedupe(records))
}
