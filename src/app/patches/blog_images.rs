use super::children;
use crate::config::SiteConfig;
use crate::core::events::title_from_slug;
use crate::core::html::{self, attr, escape_html, relative_root, ElementSpan};
use crate::core::site;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use regex::Regex;
use scraper::Html;
use std::collections::HashMap;
use std::path::Path;

const SKIP_WORDS: &[&str] = &["logo", "icon", "avatar", "wix", "facebook", "twitter", "instagram"];

/// 文章內第一張內容圖片，略過 logo、社群圖示等
pub fn first_content_image(post_html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(post_html);
    for css in [".blog-content img", "article img"] {
        let selector = html::selector(css)?;
        for img in doc.select(&selector) {
            let Some(src) = img.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            let alt = img.value().attr("alt").unwrap_or("");
            let haystack = format!("{} {}", src, alt).to_lowercase();
            if SKIP_WORDS.iter().any(|w| haystack.contains(w)) {
                continue;
            }
            return Ok(Some(src.to_string()));
        }
    }
    Ok(None)
}

/// 文章頁上的圖片路徑換成從 listing 頁看過去的路徑
pub fn resolve_from_listing(post_dir: &Path, src: &str, listing: &Path) -> String {
    if src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//") || src.starts_with("data:") {
        return src.to_string();
    }

    let joined = match src.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => format!("{}/{}", post_dir.to_string_lossy().replace('\\', "/"), src),
    };
    let mut parts: Vec<&str> = Vec::new();
    for part in joined.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            _ => parts.push(part),
        }
    }
    format!("{}{}", relative_root(listing), parts.join("/"))
}

/// listing 上沒有圖片的卡片改用文章內第一張圖片
pub struct BlogCardImagesPatch {
    images: HashMap<String, String>,
    slug_re: Regex,
}

impl BlogCardImagesPatch {
    pub fn new(posts_section: &str, images: HashMap<String, String>) -> Result<Self> {
        let slug_re = Regex::new(&format!(r"{}/([^/#?]+)", regex::escape(posts_section)))?;
        Ok(Self { images, slug_re })
    }

    /// 先讀過每一篇文章，記下各自的卡片圖片
    pub fn prepare(config: &SiteConfig) -> Result<Self> {
        let listing = config.blog_index();
        let mut images = HashMap::new();

        for rel in site::section_pages(config, &config.sections.posts)? {
            let Some(post_dir) = rel.parent() else {
                continue;
            };
            let slug = post_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let content = std::fs::read_to_string(config.site_path(&rel))?;
            match first_content_image(&content)? {
                Some(src) => {
                    let resolved = resolve_from_listing(post_dir, &src, &listing);
                    tracing::debug!("🖼️ {} -> {}", slug, resolved);
                    images.insert(slug, resolved);
                }
                None => tracing::debug!("No content image in {}", rel.display()),
            }
        }
        tracing::info!("📋 Found card images for {} post(s)", images.len());

        Self::new(&config.sections.posts, images)
    }

    fn card_slug(&self, open_tag: &str) -> Option<String> {
        let href = attr(open_tag, "href")?;
        Some(self.slug_re.captures(&href)?.get(1)?.as_str().to_string())
    }

    fn image_tag(src: &str, slug: &str) -> String {
        format!(
            r#"<img src="{}" alt="{}" class="blog-card-image" loading="lazy">"#,
            escape_html(src),
            escape_html(&title_from_slug(slug))
        )
    }

    fn update_card(&self, page_html: &str, card: &ElementSpan, slug: &str, src: &str) -> Result<Option<String>> {
        let Some(container) = children(page_html, card, "div")?
            .into_iter()
            .find(|d| html::has_class(d.open_tag(page_html), "blog-card-image-container"))
        else {
            return Ok(None);
        };

        let image = children(page_html, &container, "img")?
            .into_iter()
            .find(|img| html::has_class(img.open_tag(page_html), "blog-card-image"));
        if let Some(image) = image {
            if attr(image.open_tag(page_html), "src").as_deref() == Some(src) {
                return Ok(None);
            }
            return Ok(Some(html::set_attr(page_html, &image, "src", src)));
        }

        let tag = Self::image_tag(src, slug);
        let placeholder = children(page_html, &container, "div")?
            .into_iter()
            .find(|d| html::has_class(d.open_tag(page_html), "blog-card-image-placeholder"));
        Ok(Some(match placeholder {
            Some(placeholder) => {
                let mut out = page_html.to_string();
                out.replace_range(placeholder.outer(), &tag);
                out
            }
            None => html::insert_at(page_html, container.open_end, &tag),
        }))
    }
}

impl Patch for BlogCardImagesPatch {
    fn name(&self) -> &'static str {
        "blog-card-images"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let mut out = page.content.clone();
        let cards = html::find_elements(&out, "a", "blog-card-link")?;

        // 從後往前改，前面卡片的位置不受影響
        for card in cards.iter().rev() {
            let Some(slug) = self.card_slug(card.open_tag(&page.content)) else {
                continue;
            };
            let Some(src) = self.images.get(&slug) else {
                continue;
            };
            if let Some(updated) = self.update_card(&out, card, &slug, src)? {
                out = updated;
            }
        }
        Ok(Some(out))
    }
}
