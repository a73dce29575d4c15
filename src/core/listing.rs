//! 由文章頁面產生 blog/index.html

use crate::config::SiteConfig;
use crate::core::html::{self, escape_html, relative_root};
use crate::core::site::section_pages;
use crate::domain::model::BlogPostMeta;
use crate::utils::error::Result;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use scraper::Html;
use std::path::Path;

const TEMPLATE: &str = include_str!("../../templates/blog_listing.html");
const DESCRIPTION_LIMIT: usize = 150;

fn parse_published(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc().fixed_offset());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn truncate_description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_LIMIT {
        let head: String = text.chars().take(DESCRIPTION_LIMIT - 3).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// 從文章頁面抽出列表需要的資訊
pub fn extract_post_meta(slug: &str, page_html: &str, brand: &str) -> Result<BlogPostMeta> {
    let doc = Html::parse_document(page_html);

    let suffix = Regex::new(&format!(r"(?i)\s*\|\s*{}\s*$", regex::escape(brand)))?;
    let title = html::first_text(&doc, "title")?
        .map(|t| suffix.replace(&t, "").trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let description = match html::first_attr(&doc, r#"meta[name="description"]"#, "content")? {
        Some(d) => d,
        None => html::meta_property(&doc, "og:description")?.unwrap_or_default(),
    };

    let published = html::meta_property(&doc, "article:published_time")?
        .as_deref()
        .and_then(parse_published);

    let author = html::meta_property(&doc, "article:author")?
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| format!("{} Team", brand));

    let featured_image = html::meta_property(&doc, "og:image")?.filter(|i| !i.trim().is_empty());

    Ok(BlogPostMeta {
        slug: slug.to_string(),
        title,
        description: truncate_description(description.trim()),
        published,
        author,
        featured_image,
    })
}

/// 有日期的依日期新到舊，沒日期的接在後面維持原順序
pub fn sort_posts(posts: &mut Vec<BlogPostMeta>) {
    let (mut dated, undated): (Vec<_>, Vec<_>) =
        posts.drain(..).partition(|p| p.published.is_some());
    dated.sort_by(|a, b| b.published.cmp(&a.published));
    posts.extend(dated);
    posts.extend(undated);
}

fn render_card(post: &BlogPostMeta, href: &str) -> String {
    let image = match &post.featured_image {
        Some(src) => format!(
            r#"<img src="{}" alt="{}" class="blog-card-image">"#,
            escape_html(src),
            escape_html(&post.title)
        ),
        None => r#"<div class="blog-card-image-placeholder">📝</div>"#.to_string(),
    };
    let date = post
        .published
        .map(|d| {
            format!(
                "\n                            <span class=\"blog-card-date\">{}</span>",
                d.format("%B %d, %Y")
            )
        })
        .unwrap_or_default();

    format!(
        r#"
            <article class="blog-card">
                <a href="{href}" class="blog-card-link">
                    <div class="blog-card-image-container">
                        {image}
                    </div>
                    <div class="blog-card-content">
                        <h2 class="blog-card-title">{title}</h2>
                        <p class="blog-card-description">{description}</p>
                        <div class="blog-card-meta">{date}
                            <span class="blog-card-author">By {author}</span>
                        </div>
                    </div>
                </a>
            </article>"#,
        href = href,
        image = image,
        title = escape_html(&post.title),
        description = escape_html(&post.description),
        date = date,
        author = escape_html(&post.author),
    )
}

/// 依排好的文章產生整頁 HTML
pub fn render_listing(posts: &[BlogPostMeta], config: &SiteConfig) -> String {
    let index = config.blog_index();
    let root = relative_root(&index);

    let cards: String = posts
        .iter()
        .map(|post| {
            let href = format!("{}{}/{}/", root, config.sections.posts, post.slug);
            render_card(post, &href)
        })
        .collect();

    TEMPLATE
        .replace("{{BRAND}}", &escape_html(&config.site.brand))
        .replace("{{BASE_URL}}", config.base_url())
        .replace("{{MEASUREMENT_ID}}", &config.analytics.measurement_id)
        .replace("{{ROOT}}", &root)
        .replace("{{POST_CARDS}}", cards.trim_start())
}

/// 讀取所有文章的 meta，依發佈時間新到舊排序
pub fn collect_posts(config: &SiteConfig) -> Result<Vec<BlogPostMeta>> {
    let mut posts = Vec::new();
    for page in section_pages(config, &config.sections.posts)? {
        let Some(slug) = page
            .parent()
            .and_then(Path::file_name)
            .and_then(|s| s.to_str())
        else {
            continue;
        };
        let content = match std::fs::read_to_string(config.site_path(&page)) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("⚠️ Could not read {}: {}", page.display(), e);
                continue;
            }
        };
        let meta = extract_post_meta(slug, &content, &config.site.brand)?;
        tracing::info!("✅ Found: {}", meta.title);
        posts.push(meta);
    }
    sort_posts(&mut posts);
    Ok(posts)
}

/// 寫出 blog/index.html，回傳文章數
pub fn generate_listing(config: &SiteConfig) -> Result<usize> {
    let posts = collect_posts(config)?;
    if posts.is_empty() {
        tracing::warn!("No blog posts found under {}", config.sections.posts);
        return Ok(0);
    }

    let output = config.site_path(config.blog_index());
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, render_listing(&posts, config))?;
    tracing::info!("📝 Created blog listing page with {} posts", posts.len());

    Ok(posts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ordering::blog_post_order;

    fn post_html(title: &str, published: Option<&str>, image: Option<&str>) -> String {
        let published = published
            .map(|p| format!(r#"<meta property="article:published_time" content="{}">"#, p))
            .unwrap_or_default();
        let image = image
            .map(|i| format!(r#"<meta property="og:image" content="{}">"#, i))
            .unwrap_or_default();
        format!(
            r#"<html><head><title>{} | Agroverse</title>
            <meta property="og:description" content="About cacao & farms">
            {}{}</head><body></body></html>"#,
            title, published, image
        )
    }

    #[test]
    fn test_extract_post_meta() {
        let html = post_html(
            "Cacao Journey",
            Some("2024-03-05T10:00:00Z"),
            Some("https://www.agroverse.shop/a.jpg"),
        );
        let meta = extract_post_meta("cacao-journey", &html, "Agroverse").unwrap();

        assert_eq!(meta.title, "Cacao Journey");
        assert_eq!(meta.description, "About cacao & farms");
        assert_eq!(meta.author, "Agroverse Team");
        assert_eq!(meta.featured_image.as_deref(), Some("https://www.agroverse.shop/a.jpg"));
        assert_eq!(
            meta.published.map(|d| d.format("%B %d, %Y").to_string()).as_deref(),
            Some("March 05, 2024")
        );
    }

    #[test]
    fn test_missing_title_and_long_description() {
        let long = "x".repeat(200);
        let html = format!(r#"<html><head><meta name="description" content="{}"></head></html>"#, long);
        let meta = extract_post_meta("s", &html, "Agroverse").unwrap();

        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.description.chars().count(), 150);
        assert!(meta.description.ends_with("..."));
        assert!(meta.published.is_none());
    }

    #[test]
    fn test_sort_and_render_roundtrip_with_ordering() {
        let brand = "Agroverse";
        let mut posts = vec![
            extract_post_meta("undated", &post_html("Undated", None, None), brand).unwrap(),
            extract_post_meta("older", &post_html("Older", Some("2023-01-01T00:00:00Z"), None), brand).unwrap(),
            extract_post_meta("newer", &post_html("Newer", Some("2024-06-01T00:00:00+02:00"), None), brand).unwrap(),
        ];
        sort_posts(&mut posts);
        assert_eq!(
            posts.iter().map(|p| p.slug.as_str()).collect::<Vec<_>>(),
            vec!["newer", "older", "undated"]
        );

        let config = SiteConfig::default();
        let html = render_listing(&posts, &config);

        assert!(html.contains(r#"<a href="../post/newer/" class="blog-card-link">"#));
        assert!(html.contains("blog-card-image-placeholder"));
        assert!(html.contains("About cacao &amp; farms"));
        assert!(html.contains("<title>Blog | Agroverse</title>"));
        assert!(!html.contains("{{"));
        assert_eq!(blog_post_order(&html).unwrap(), vec!["newer", "older", "undated"]);
    }
}
