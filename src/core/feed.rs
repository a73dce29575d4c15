//! 從 js/products.js 產生 Facebook 商品目錄 (RSS 2.0 + g: 命名空間)

use crate::config::SiteConfig;
use crate::domain::model::{FieldValue, Product};
use crate::utils::error::{Result, SiteError};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::LazyLock;

static PRODUCTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)window\.PRODUCTS\s*=\s*(\{.*?\});").expect("products pattern")
});

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)'([^']+)':\s*\{((?:[^{}]|\{[^{}]*\})*)\}").expect("product entry pattern")
});

static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+):\s*(?:'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)"|(-?\d+(?:\.\d*)?))"#)
        .expect("product field pattern")
});

const GOOGLE_NS: &str = "http://base.google.com/ns/1.0";

fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// 解析 window.PRODUCTS 物件字面值，保留原始順序
pub fn parse_products(js: &str) -> Result<Vec<Product>> {
    let body = PRODUCTS_RE
        .captures(js)
        .and_then(|c| c.get(1))
        .ok_or_else(|| SiteError::FeedError {
            message: "Could not find window.PRODUCTS object in products.js".to_string(),
        })?
        .as_str();

    let mut products = Vec::new();
    for entry in ENTRY_RE.captures_iter(body) {
        let mut fields = BTreeMap::new();
        for field in FIELD_RE.captures_iter(&entry[2]) {
            let value = if let Some(single) = field.get(2) {
                FieldValue::Text(unescape_js(single.as_str()))
            } else if let Some(double) = field.get(3) {
                FieldValue::Text(unescape_js(double.as_str()))
            } else if let Some(number) = field.get(4) {
                match number.as_str().parse::<f64>() {
                    Ok(n) => FieldValue::Number(n),
                    Err(_) => FieldValue::Text(number.as_str().to_string()),
                }
            } else {
                continue;
            };
            fields.insert(field[1].to_string(), value);
        }
        products.push(Product {
            id: entry[1].to_string(),
            fields,
        });
    }

    Ok(products)
}

pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 缺值、零或負數都輸出 0.00 USD
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) if p.is_finite() && p > 0.0 => format!("{:.2} USD", p),
        _ => "0.00 USD".to_string(),
    }
}

pub fn product_description(product: &Product) -> String {
    let mut parts = vec![product.name().to_string()];
    if let Some(farm) = product.text("farm") {
        parts.push(format!("From {}", farm));
    }
    if let Some(shipment) = product.text("shipment") {
        parts.push(format!("Shipment {}", shipment));
    }

    let mut description = parts.join(". ");
    match product.text("category") {
        Some("retail") => description.push_str(". Available for direct purchase."),
        Some("wholesale") => description.push_str(". Contact us for wholesale pricing."),
        _ => {}
    }
    description
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn element(out: &mut String, indent: usize, tag: &str, text: &str) {
    let _ = writeln!(out, "{}<{}>{}</{}>", "  ".repeat(indent), tag, escape_xml(text), tag);
}

/// 組出完整的 XML 文件
pub fn render_feed(products: &[Product], config: &SiteConfig, built_at: DateTime<Utc>) -> String {
    let base = config.base_url();
    let brand = &config.site.brand;

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    let _ = writeln!(out, "<rss version=\"2.0\" xmlns:g=\"{}\">", GOOGLE_NS);
    out.push_str("  <channel>\n");
    element(&mut out, 2, "title", &format!("{} Shop Products", brand));
    element(&mut out, 2, "link", base);
    element(
        &mut out,
        2,
        "description",
        &format!("{} regenerative cacao products from Brazilian farms", brand),
    );
    element(
        &mut out,
        2,
        "lastBuildDate",
        &built_at.format("%a, %d %b %Y %H:%M:%S +0000").to_string(),
    );

    for product in products {
        out.push_str("    <item>\n");
        element(&mut out, 3, "g:id", &product.id);
        element(&mut out, 3, "g:title", product.name());
        element(&mut out, 3, "g:link", &format!("{}/product-page/{}/", base, product.id));
        if let Some(image) = product.text("image") {
            element(
                &mut out,
                3,
                "g:image_link",
                &format!("{}/{}", base, image.trim_start_matches('/')),
            );
        }
        element(&mut out, 3, "g:description", &product_description(product));
        element(&mut out, 3, "g:availability", "in stock");
        element(&mut out, 3, "g:price", &format_price(product.price()));
        element(&mut out, 3, "g:condition", "new");
        element(&mut out, 3, "g:brand", brand);
        if let Some(farm) = product.text("farm") {
            element(&mut out, 3, "g:custom_label_0", farm);
        }
        if let Some(shipment) = product.text("shipment") {
            element(&mut out, 3, "g:custom_label_1", shipment);
        }
        let category = product.text("category").unwrap_or("retail");
        element(&mut out, 3, "g:product_type", &title_case(category));
        element(
            &mut out,
            3,
            "g:google_product_category",
            &config.feed.google_product_category,
        );
        out.push_str("    </item>\n");
    }

    out.push_str("  </channel>\n</rss>\n");
    out
}

pub fn load_products(config: &SiteConfig) -> Result<Vec<Product>> {
    let source = config.site_path(&config.feed.products_js);
    tracing::info!("📖 Reading products from {}", source.display());
    let js = std::fs::read_to_string(&source)?;

    let products = parse_products(&js)?;
    tracing::info!("Found {} products", products.len());
    Ok(products)
}

/// 讀取 products.js 並寫出商品目錄，回傳商品數
pub fn generate_feed(config: &SiteConfig) -> Result<usize> {
    let products = load_products(config)?;

    let xml = render_feed(&products, config, Utc::now());
    let output = config.site_path(&config.feed.output);
    std::fs::write(&output, xml)?;
    tracing::info!("✅ Generated XML feed: {}", output.display());

    Ok(products.len())
}
