//! 由 Wix 匯出的活動頁產生 event-details-registration/<slug>/index.html
//!
//! 每個 slug 找檔名最相近的匯出檔，抽出標題、描述、日期、地點、圖片與報名連結。
//! 找不到匯出檔的 slug 仍會產生頁面，內容用預設值。

use crate::config::SiteConfig;
use crate::core::html::{self, escape_html};
use crate::domain::model::EventMeta;
use crate::utils::error::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use scraper::Html;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const TEMPLATE: &str = include_str!("../../templates/event_page.html");
const DEFAULT_TITLE: &str = "Cacao Circle Event";
const DEFAULT_DESCRIPTION: &str = "Join us for a regenerative cacao circle experience.";
/// 檔名至少要命中這麼多個 slug 關鍵字
const MIN_KEYWORD_MATCHES: usize = 2;

const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

static DATE_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(&format!(r"(?i)\b(?:{})\s+\d{{1,2}},?\s+\d{{4}}\b", MONTHS))
            .expect("month-first date pattern"),
        Regex::new(&format!(r"(?i)\b\d{{1,2}}\s+(?:{})\s+\d{{4}}\b", MONTHS))
            .expect("day-first date pattern"),
    ]
});

static WIX_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^"'>\s]+wixstatic[^"'>\s]+(?:jpg|jpeg|png|webp|avif)"#)
        .expect("wix image pattern")
});

static EVENTBRITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^"'>\s]*eventbrite[^"'>\s]*"#).expect("eventbrite pattern")
});

static LUMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^"'>\s]*lu\.ma/[^"'>\s]*"#).expect("luma pattern"));

const RSVP_HINTS: &[&str] = &["eventbrite", "lu.ma", "ticket", "register"];

/// 第一個 JSON-LD 物件；陣列時取第一個 Event，沒有就取第一個物件
fn json_ld(doc: &Html) -> Result<Option<serde_json::Value>> {
    let sel = html::selector(r#"script[type="application/ld+json"]"#)?;
    for script in doc.select(&sel) {
        let text: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(text.trim()) else {
            continue;
        };
        let found = match value {
            serde_json::Value::Array(items) => {
                let is_event = |v: &serde_json::Value| {
                    v.get("@type").and_then(|t| t.as_str()).is_some_and(|t| t.ends_with("Event"))
                };
                items
                    .iter()
                    .find(|v| is_event(*v))
                    .or_else(|| items.iter().find(|v| v.is_object()))
                    .cloned()
            }
            serde_json::Value::Object(_) => Some(value),
            _ => None,
        };
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

fn json_str<'a>(value: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// location.name，沒有時組合 address 的街道、城市、州
fn json_ld_location(ld: &serde_json::Value) -> Option<String> {
    let location = ld.get("location")?;
    if let Some(name) = json_str(location, "name") {
        return Some(name.to_string());
    }
    let address = location.get("address")?;
    if let Some(text) = address.as_str().map(str::trim).filter(|s| !s.is_empty()) {
        return Some(text.to_string());
    }
    let parts: Vec<&str> = ["streetAddress", "addressLocality", "addressRegion"]
        .iter()
        .filter_map(|key| json_str(address, key))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

/// 優先選有 w_、h_、fill 參數的大圖
fn wix_header_image(page_html: &str) -> Option<String> {
    let images: Vec<&str> = WIX_IMAGE_RE.find_iter(page_html).map(|m| m.as_str()).collect();
    images
        .iter()
        .find(|img| ["w_", "h_", "fill"].iter().any(|size| img.contains(size)))
        .or_else(|| images.first())
        .map(|img| img.to_string())
}

fn text_date(doc: &Html) -> Option<String> {
    let text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    DATE_RES
        .iter()
        .find_map(|re| re.find(&text))
        .map(|m| m.as_str().to_string())
}

/// 從匯出頁抽出活動資訊，缺的欄位用預設值補上
pub fn extract_event_meta(
    slug: &str,
    page_html: &str,
    brand: &str,
    default_image: &str,
) -> Result<EventMeta> {
    let doc = Html::parse_document(page_html);

    let suffix = Regex::new(&format!(r"(?i)\s*\|\s*{}\s*$", regex::escape(brand)))?;
    let title = html::first_text(&doc, "title")?
        .map(|t| suffix.replace(&t, "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let description = html::first_attr(&doc, r#"meta[name="description"]"#, "content")?
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

    let og_title = html::meta_property(&doc, "og:title")?
        .map(|t| suffix.replace(t.trim(), "").to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| title.clone());
    let og_description = html::meta_property(&doc, "og:description")?
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| description.clone());
    let og_image = html::meta_property(&doc, "og:image")?
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty());

    let ld = json_ld(&doc)?;
    let date = ld
        .as_ref()
        .and_then(|ld| json_str(ld, "startDate"))
        .map(str::to_string)
        .or_else(|| text_date(&doc));
    let location = ld.as_ref().and_then(json_ld_location);

    let header_image = og_image
        .clone()
        .or_else(|| wix_header_image(page_html))
        .unwrap_or_else(|| default_image.to_string());

    let rsvp_url = EVENTBRITE_RE
        .find(page_html)
        .or_else(|| LUMA_RE.find(page_html))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            ld.as_ref()
                .and_then(|ld| json_str(ld, "url"))
                .filter(|url| RSVP_HINTS.iter().any(|hint| url.contains(hint)))
                .map(str::to_string)
        });

    Ok(EventMeta {
        slug: slug.to_string(),
        title,
        description,
        og_title,
        og_description,
        og_image: og_image.unwrap_or_else(|| default_image.to_string()),
        header_image,
        date,
        location,
        rsvp_url,
    })
}

/// slug 轉成首字大寫的標題，例如 web3-holiday-food-drive -> Web3 Holiday Food Drive
pub fn title_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// 沒有匯出檔時的頁面內容
pub fn placeholder_event(slug: &str, default_image: &str) -> EventMeta {
    let title = title_from_slug(slug);

    EventMeta {
        slug: slug.to_string(),
        title: title.clone(),
        description: DEFAULT_DESCRIPTION.to_string(),
        og_title: title,
        og_description: DEFAULT_DESCRIPTION.to_string(),
        og_image: default_image.to_string(),
        header_image: default_image.to_string(),
        date: None,
        location: None,
        rsvp_url: None,
    }
}

/// 依 slug 關鍵字命中數找最相近的匯出檔，同分取排序較前者
pub fn match_raw_file<'a>(slug: &str, candidates: &'a [PathBuf]) -> Option<&'a PathBuf> {
    let keywords: Vec<String> = slug
        .split('-')
        .filter(|k| !k.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut best: Option<(&PathBuf, usize)> = None;
    for candidate in candidates {
        let Some(stem) = candidate.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let stem = stem.to_lowercase();
        let score = keywords.iter().filter(|k| stem.contains(k.as_str())).count();
        if score >= MIN_KEYWORD_MATCHES && best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best.map(|(path, _)| path)
}

/// 檔名轉成網址用的 slug
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

fn parse_start(date: &str) -> Option<DateTime<Utc>> {
    if !date.contains('T') {
        return None;
    }
    let date = date.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// ISO 時間轉成 "March 14, 2025 at 06:00 PM"，其他格式原樣顯示
pub fn format_event_date(date: &str) -> String {
    match parse_start(date) {
        Some(dt) => dt.format("%B %d, %Y at %I:%M %p").to_string(),
        None => date.to_string(),
    }
}

/// 只有能解析的 ISO 時間才判斷是否已過
pub fn is_past_event(event: &EventMeta, now: DateTime<Utc>) -> bool {
    event
        .date
        .as_deref()
        .and_then(parse_start)
        .is_some_and(|start| start < now)
}

fn render_meta_items(event: &EventMeta) -> String {
    let mut items = String::new();
    if let Some(date) = &event.date {
        items.push_str(&format!(
            "\n                <div class=\"event-meta-item\"><span>📅</span> <span>{}</span></div>",
            escape_html(&format_event_date(date))
        ));
    }
    if let Some(location) = &event.location {
        items.push_str(&format!(
            "\n                <div class=\"event-meta-item\"><span>📍</span> <span>{}</span></div>",
            escape_html(location)
        ));
    }
    items
}

fn render_call_to_action(event: &EventMeta, rsvp_url: Option<&str>, past: bool, email: &str) -> String {
    match rsvp_url {
        Some(url) if !past => format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="cta-button">Register for This Event</a>"#,
            escape_html(url)
        ),
        _ if past => r#"<p class="event-passed">This event has passed. Thank you for being part of our community!</p>"#
            .to_string(),
        _ => {
            let subject: String =
                url::form_urlencoded::byte_serialize(format!("Registration for {}", event.title).as_bytes())
                    .collect();
            format!(
                r#"<a href="mailto:{}?subject={}" class="cta-button">Contact Us About This Event</a>"#,
                escape_html(email),
                escape_html(&subject.replace('+', "%20"))
            )
        }
    }
}

/// 產生單一活動頁；過去的活動不顯示報名按鈕
pub fn render_event_page(event: &EventMeta, config: &SiteConfig, now: DateTime<Utc>) -> String {
    let events = &config.events;
    let page_url = format!("{}/{}/{}", config.base_url(), events.output_dir, event.slug);
    let rsvp_url = event
        .rsvp_url
        .as_deref()
        .or_else(|| events.rsvp.get(&event.slug).map(String::as_str));
    let past = is_past_event(event, now);

    TEMPLATE
        .replace("{{BRAND}}", &escape_html(&config.site.brand))
        .replace("{{MEASUREMENT_ID}}", &config.analytics.measurement_id)
        .replace("{{ROOT}}", &html::relative_root(&event_output_path(config, &event.slug)))
        .replace("{{CONTACT_EMAIL}}", &escape_html(&events.contact_email))
        .replace("{{PAGE_URL}}", &escape_html(&page_url))
        .replace("{{OG_IMAGE}}", &escape_html(&event.og_image))
        .replace("{{HEADER_IMAGE}}", &escape_html(&event.header_image))
        .replace("{{OG_TITLE}}", &escape_html(&event.og_title))
        .replace("{{OG_DESCRIPTION}}", &escape_html(&event.og_description))
        .replace("{{EVENT_META}}", &render_meta_items(event))
        .replace(
            "{{CALL_TO_ACTION}}",
            &render_call_to_action(event, rsvp_url, past, &events.contact_email),
        )
        .replace("{{TITLE}}", &escape_html(&event.title))
        .replace("{{DESCRIPTION}}", &escape_html(&event.description))
}

/// 站台相對的輸出路徑
pub fn event_output_path(config: &SiteConfig, slug: &str) -> PathBuf {
    Path::new(&config.events.output_dir).join(slug).join("index.html")
}

fn raw_event_files(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let dir = config.site_path(&config.events.raw_dir);
    if !dir.is_dir() {
        tracing::warn!("⚠️ No raw event directory at {}", dir.display());
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "html" || ext == "htm"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_event(slug: &str, path: &Path, config: &SiteConfig) -> Result<EventMeta> {
    let default_image = &config.events.default_image;
    match std::fs::read_to_string(path) {
        Ok(content) => extract_event_meta(slug, &content, &config.site.brand, default_image),
        Err(e) => {
            tracing::warn!("⚠️ Could not read {}: {}", path.display(), e);
            Ok(placeholder_event(slug, default_image))
        }
    }
}

/// 依設定的 slug 清單（或每個匯出檔）整理出活動
pub fn collect_events(config: &SiteConfig) -> Result<Vec<EventMeta>> {
    let raw_files = raw_event_files(config)?;
    let default_image = &config.events.default_image;
    let mut events = Vec::new();

    if config.events.slugs.is_empty() {
        for path in &raw_files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let slug = slugify(stem);
            if slug.is_empty() {
                continue;
            }
            events.push(read_event(&slug, path, config)?);
        }
    } else {
        for slug in &config.events.slugs {
            let event = match match_raw_file(slug, &raw_files) {
                Some(path) => {
                    tracing::debug!("{} <- {}", slug, path.display());
                    read_event(slug, path, config)?
                }
                None => {
                    tracing::warn!("⚠️ No export found for {}, using defaults", slug);
                    placeholder_event(slug, default_image)
                }
            };
            events.push(event);
        }
    }
    Ok(events)
}

/// 寫出所有活動頁，回傳頁數
pub fn generate_events(config: &SiteConfig, now: DateTime<Utc>) -> Result<usize> {
    let events = collect_events(config)?;
    if events.is_empty() {
        tracing::warn!("No events to generate");
        return Ok(0);
    }

    for event in &events {
        let output = config.site_path(event_output_path(config, &event.slug));
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&output, render_event_page(event, config, now))?;
        tracing::info!("✅ Created {}", event.slug);
    }
    tracing::info!("🎉 Created {} event pages", events.len());

    Ok(events.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const DEFAULT_IMAGE: &str = "https://www.agroverse.shop/assets/images/hero/cacao-circles.jpg";

    const WIX_EVENT: &str = r#"<html><head>
<title>Cacao Circle at Regen House | Agroverse</title>
<meta name="description" content="Sip cacao & talk climate">
<meta property="og:title" content="Cacao Circle at Regen House | Agroverse">
<script type="application/ld+json">{"@context":"https://schema.org","@type":"Event","startDate":"2025-06-21T18:00:00+01:00","location":{"@type":"Place","address":{"streetAddress":"12 Regent St","addressLocality":"London","addressRegion":"England"}},"url":"https://www.agroverse.shop/event-details/regen-house"}</script>
</head><body>
<img src="https://static.wixstatic.com/media/abc~mv2.png">
<img src="https://static.wixstatic.com/media/poster~mv2.jpg/v1/fill/w_980,h_551/poster.jpg">
<a href="https://www.eventbrite.com/e/regen-house-123">Tickets</a>
</body></html>"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_extract_event_meta_from_wix_export() {
        let event = extract_event_meta("regen-house", WIX_EVENT, "Agroverse", DEFAULT_IMAGE).unwrap();

        assert_eq!(event.title, "Cacao Circle at Regen House");
        assert_eq!(event.og_title, "Cacao Circle at Regen House");
        assert_eq!(event.description, "Sip cacao & talk climate");
        assert_eq!(event.og_description, "Sip cacao & talk climate");
        assert_eq!(event.date.as_deref(), Some("2025-06-21T18:00:00+01:00"));
        assert_eq!(event.location.as_deref(), Some("12 Regent St, London, England"));
        assert_eq!(
            event.header_image,
            "https://static.wixstatic.com/media/poster~mv2.jpg/v1/fill/w_980,h_551/poster.jpg"
        );
        assert_eq!(event.og_image, DEFAULT_IMAGE);
        assert_eq!(event.rsvp_url.as_deref(), Some("https://www.eventbrite.com/e/regen-house-123"));
    }

    #[test]
    fn test_extract_falls_back_to_text_date_and_luma() {
        let html = r#"<html><head>
<meta property="og:image" content="https://x/og.jpg">
<script type="application/ld+json">[{"@type":"Organization","name":"Agroverse"},{"@type":"SocialEvent","location":{"name":"Ming's Lounge"}}]</script>
</head><body><p>Join us on March 14, 2025 at the lounge.</p>
<a href="https://lu.ma/mings">RSVP</a></body></html>"#;
        let event = extract_event_meta("mings", html, "Agroverse", DEFAULT_IMAGE).unwrap();

        assert_eq!(event.title, DEFAULT_TITLE);
        assert_eq!(event.description, DEFAULT_DESCRIPTION);
        assert_eq!(event.date.as_deref(), Some("March 14, 2025"));
        assert_eq!(event.location.as_deref(), Some("Ming's Lounge"));
        assert_eq!(event.header_image, "https://x/og.jpg");
        assert_eq!(event.og_image, "https://x/og.jpg");
        assert_eq!(event.rsvp_url.as_deref(), Some("https://lu.ma/mings"));
    }

    #[test]
    fn test_match_raw_file_needs_two_keywords() {
        let files = vec![
            PathBuf::from("gatherings/Cacao Circle at Wesfest 25.html"),
            PathBuf::from("gatherings/Cacao Circle at Mings Lounge.html"),
        ];
        assert_eq!(
            match_raw_file("cacao-circle-at-mings-lounge", &files),
            Some(&files[1])
        );
        assert_eq!(match_raw_file("web3-holiday-food-drive", &files), None);
        assert_eq!(slugify("Cacao Circle at Mings Lounge"), "cacao-circle-at-mings-lounge");
    }

    #[test]
    fn test_render_upcoming_event_with_configured_rsvp() {
        let mut config = SiteConfig::default();
        config
            .events
            .rsvp
            .insert("web3-holiday-food-drive".to_string(), "https://lu.ma/holiday".to_string());
        let mut event = placeholder_event("web3-holiday-food-drive", DEFAULT_IMAGE);
        event.date = Some("2025-12-20T17:00:00Z".to_string());
        event.location = Some("Oakland & Berkeley".to_string());

        let page = render_event_page(&event, &config, now());

        assert!(page.contains("<title>Web3 Holiday Food Drive | Agroverse</title>"));
        assert!(page.contains(
            r#"<link rel="canonical" href="https://www.agroverse.shop/event-details-registration/web3-holiday-food-drive">"#
        ));
        assert!(page.contains(r#"href="../../assets/images/logo/agroverse-logo.jpeg""#));
        assert!(page.contains("<span>December 20, 2025 at 05:00 PM</span>"));
        assert!(page.contains("<span>Oakland &amp; Berkeley</span>"));
        assert!(page.contains(r#"<a href="https://lu.ma/holiday" target="_blank""#));
        assert!(page.contains("gtag('config', 'G-S6EP25EHF4');"));
        assert!(!page.contains("{{"));
    }

    #[test]
    fn test_render_past_event_hides_registration() {
        let config = SiteConfig::default();
        let mut event = extract_event_meta("regen-house", WIX_EVENT, "Agroverse", DEFAULT_IMAGE).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();

        let page = render_event_page(&event, &config, later);
        assert!(page.contains("This event has passed."));
        assert!(!page.contains("cta-button\">Register"));

        event.rsvp_url = None;
        event.date = Some("Summer 2026".to_string());
        let page = render_event_page(&event, &config, later);
        assert!(page.contains("<span>Summer 2026</span>"));
        assert!(page.contains(
            "mailto:community@agroverse.shop?subject=Registration%20for%20Cacao%20Circle%20at%20Regen%20House"
        ));
    }

    #[test]
    fn test_generate_events_from_slug_list() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("assets/raw/gatherings");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("Cacao Circle at Regen House London.html"), WIX_EVENT).unwrap();

        let mut config = SiteConfig::default().with_root(temp.path());
        config.events.slugs = vec![
            "cacao-circle-at-regen-house-in-london".to_string(),
            "halloweekend-free-entrance".to_string(),
        ];

        assert_eq!(generate_events(&config, now()).unwrap(), 2);

        let regen = std::fs::read_to_string(
            temp.path().join("event-details-registration/cacao-circle-at-regen-house-in-london/index.html"),
        )
        .unwrap();
        assert!(regen.contains("<h1>Cacao Circle at Regen House</h1>"));
        assert!(regen.contains("Register for This Event"));

        let placeholder = std::fs::read_to_string(
            temp.path().join("event-details-registration/halloweekend-free-entrance/index.html"),
        )
        .unwrap();
        assert!(placeholder.contains("<h1>Halloweekend Free Entrance</h1>"));
        assert!(placeholder.contains("Contact Us About This Event"));
    }
}
