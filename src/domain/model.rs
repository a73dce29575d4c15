use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// 一筆 DNS host record (hostname / value / ttl)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub hostname: String,
    pub value: String,
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl DnsRecord {
    pub fn new(hostname: impl Into<String>, value: impl Into<String>, ttl: Option<u32>) -> Self {
        Self {
            hostname: hostname.into(),
            value: value.into(),
            ttl,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    A,
    #[serde(rename = "CNAME")]
    Cname,
    #[serde(rename = "MX")]
    Mx,
    #[serde(rename = "NS")]
    Ns,
    #[serde(rename = "TXT")]
    Txt,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Cname => "CNAME",
            RecordType::Mx => "MX",
            RecordType::Ns => "NS",
            RecordType::Txt => "TXT",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// partner_locations.json 的一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerLocation {
    pub name: String,
    pub location: String,
}

/// partner_coordinates.json 的一筆；查不到時座標為 null
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCoordinates {
    pub name: String,
    pub location: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub formatted_address: String,
    pub place_id: Option<String>,
}

impl PartnerCoordinates {
    pub fn unresolved(partner: &PartnerLocation) -> Self {
        Self {
            name: partner.name.clone(),
            location: partner.location.clone(),
            lat: None,
            lng: None,
            formatted_address: partner.location.clone(),
            place_id: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerQuery {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub queries: Vec<String>,
}

impl PartnerQuery {
    pub fn effective_queries(&self) -> Vec<String> {
        if self.queries.is_empty() {
            vec![format!("{} {}", self.name, self.location)]
        } else {
            self.queries.clone()
        }
    }
}

/// 地理編碼服務回傳的單一地點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMatch {
    pub name: Option<String>,
    pub formatted_address: String,
    pub place_id: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// products.js 裡的一項商品
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Product {
    pub fn text(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(FieldValue::as_text)
            .filter(|s| !s.is_empty())
    }

    pub fn name(&self) -> &str {
        self.text("name").unwrap_or("")
    }

    pub fn price(&self) -> Option<f64> {
        self.fields.get("price").and_then(FieldValue::as_number)
    }
}

/// 部落格文章頁面抽出的資訊
#[derive(Debug, Clone, PartialEq)]
pub struct BlogPostMeta {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub published: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub author: String,
    pub featured_image: Option<String>,
}

/// 活動頁面的內容，來源是 Wix 匯出的活動頁
#[derive(Debug, Clone, PartialEq)]
pub struct EventMeta {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub header_image: String,
    /// 原始日期字串（JSON-LD startDate 或內文中的日期）
    pub date: Option<String>,
    pub location: Option<String>,
    pub rsvp_url: Option<String>,
}

/// 待處理的 HTML 頁面，路徑相對於站台根目錄
#[derive(Debug, Clone)]
pub struct Page {
    pub rel_path: PathBuf,
    pub content: String,
}

impl Page {
    pub fn new(rel_path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            content: content.into(),
        }
    }

    /// 頁面所在目錄相對根目錄的層數
    pub fn depth(&self) -> usize {
        self.rel_path
            .parent()
            .map(|p| {
                p.components()
                    .filter(|c| matches!(c, Component::Normal(_)))
                    .count()
            })
            .unwrap_or(0)
    }

    /// 回到站台根目錄的相對前綴，例如 "../../"
    pub fn root_prefix(&self) -> String {
        "../".repeat(self.depth())
    }

    /// 頁面所在目錄名稱，即 section/<slug>/index.html 的 slug
    pub fn slug(&self) -> Option<&str> {
        self.rel_path
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
    }

    pub fn display_path(&self) -> String {
        self.rel_path.to_string_lossy().replace('\\', "/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_depth_and_prefix() {
        let root = Page::new("index.html", "");
        assert_eq!(root.depth(), 0);
        assert_eq!(root.root_prefix(), "");

        let post = Page::new("post/cacao-journey/index.html", "");
        assert_eq!(post.depth(), 2);
        assert_eq!(post.root_prefix(), "../../");
        assert_eq!(post.slug(), Some("cacao-journey"));
    }

    #[test]
    fn test_partner_query_defaults_to_name_and_location() {
        let query = PartnerQuery {
            name: "Miss Tomato".to_string(),
            location: "Daly City, California".to_string(),
            queries: vec![],
        };
        assert_eq!(
            query.effective_queries(),
            vec!["Miss Tomato Daly City, California".to_string()]
        );
    }

    #[test]
    fn test_product_price_from_text_or_number() {
        let mut fields = BTreeMap::new();
        fields.insert("price".to_string(), FieldValue::Text("12.5".to_string()));
        let product = Product {
            id: "nibs".to_string(),
            fields,
        };
        assert_eq!(product.price(), Some(12.5));
        assert_eq!(product.name(), "");
    }
}
