//! 上一篇/下一篇導覽區塊

use crate::config::toml_config::SectionsConfig;
use crate::core::html::{self, escape_html};
use crate::utils::error::Result;
use regex::Regex;
use scraper::Html;

const NAV_CSS: &str = r#"

        /* Post Navigation */
        .post-navigation {
            display: flex;
            justify-content: space-between;
            align-items: center;
            margin: 3rem 0 2rem;
            padding: 2rem 0;
            border-top: 2px solid var(--color-bg-light);
            border-bottom: 2px solid var(--color-bg-light);
            gap: 2rem;
        }

        .nav-item {
            flex: 1;
        }

        .nav-item.nav-next {
            text-align: right;
        }

        .nav-link {
            display: inline-block;
            color: var(--color-secondary);
            text-decoration: none;
            font-weight: 500;
            font-size: 1rem;
            transition: color 0.3s;
            padding: 0.5rem 0;
        }

        .nav-link:hover {
            color: var(--color-primary);
        }

        .nav-label {
            font-weight: 600;
        }

        @media (max-width: 768px) {
            .post-navigation {
                flex-direction: column;
                gap: 1.5rem;
            }

            .nav-item.nav-next {
                text-align: left;
            }
        }"#;

const NAV_LABEL_CSS: &str = r#"

        .nav-label {
            font-weight: 600;
        }"#;

/// 只有這些字的 h1 不拿來當標題
const GENERIC_HEADINGS: &[&str] = &["blog", "farm", "farms", "shipment", "shipments"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Post,
    Farm,
    Shipment,
}

impl SectionKind {
    pub const ALL: [SectionKind; 3] = [SectionKind::Post, SectionKind::Farm, SectionKind::Shipment];

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Post => "posts",
            SectionKind::Farm => "farms",
            SectionKind::Shipment => "shipments",
        }
    }

    pub fn prev_label(&self) -> &'static str {
        match self {
            SectionKind::Post => "← Previous Post",
            SectionKind::Farm => "← Previous Farm",
            SectionKind::Shipment => "← Previous Shipment",
        }
    }

    pub fn next_label(&self) -> &'static str {
        match self {
            SectionKind::Post => "Next Post →",
            SectionKind::Farm => "Next Farm →",
            SectionKind::Shipment => "Next Shipment →",
        }
    }

    /// 該類頁面所在的站台目錄
    pub fn directory<'a>(&self, sections: &'a SectionsConfig) -> &'a str {
        match self {
            SectionKind::Post => &sections.posts,
            SectionKind::Farm => &sections.farms,
            SectionKind::Shipment => &sections.shipments,
        }
    }
}

/// 導覽連結的目標頁
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavTarget {
    pub slug: String,
    pub title: Option<String>,
}

impl NavTarget {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// 產生 nav.post-navigation；前後都沒有時回傳 None
pub fn render_nav(
    prev: Option<&NavTarget>,
    next: Option<&NavTarget>,
    kind: SectionKind,
) -> Option<String> {
    if prev.is_none() && next.is_none() {
        return None;
    }

    let mut out = String::from("<nav class=\"post-navigation\">\n");
    if let Some(target) = prev {
        let label = match &target.title {
            Some(title) => format!("← <span class=\"nav-label\">{}</span>", escape_html(title)),
            None => kind.prev_label().to_string(),
        };
        out.push_str(&format!(
            "    <div class=\"nav-item nav-prev\"><a class=\"nav-link\" href=\"../{}/\">{}</a></div>\n",
            target.slug, label
        ));
    }
    if let Some(target) = next {
        let label = match &target.title {
            Some(title) => format!("<span class=\"nav-label\">{}</span> →", escape_html(title)),
            None => kind.next_label().to_string(),
        };
        out.push_str(&format!(
            "    <div class=\"nav-item nav-next\"><a class=\"nav-link\" href=\"../{}/\">{}</a></div>\n",
            target.slug, label
        ));
    }
    out.push_str("</nav>");
    Some(out)
}

/// 頁面標題：優先用 h1，否則用 <title> 去掉 " | 品牌" 尾巴
pub fn page_title(page_html: &str, brand: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(page_html);

    if let Some(h1) = html::first_text(&doc, "h1")? {
        let lowered = h1.to_lowercase();
        if !h1.is_empty() && !GENERIC_HEADINGS.contains(&lowered.as_str()) {
            return Ok(Some(h1));
        }
    }

    let Some(title) = html::first_text(&doc, "title")? else {
        return Ok(None);
    };
    let suffix = Regex::new(&format!(r"(?i)\s*\|\s*{}.*$", regex::escape(brand)))?;
    let stripped = suffix.replace(&title, "").trim().to_string();
    Ok((!stripped.is_empty()).then_some(stripped))
}

/// 換掉頁面上的導覽區塊。找不到插入位置時回傳 None。
pub fn apply_nav(page_html: &str, nav: &str) -> Result<Option<String>> {
    let mut out = html::normalize_class_attrs(page_html);

    let existing = html::find_elements(&out, "nav", "post-navigation")?;
    if !existing.is_empty() {
        out = html::remove_spans(&out, &existing);
    }

    let position = if let Some(back) = html::find_first_with_class(&out, "a", "back-link")? {
        back.start
    } else if let Some(footer) = html::find_first(&out, "footer")? {
        footer.start
    } else if let Some(article) = html::find_first(&out, "article")? {
        article.close_start
    } else if let Some(main) = html::find_first(&out, "main")? {
        main.close_start
    } else {
        return Ok(None);
    };
    out = html::insert_at(&out, position, &format!("{}\n", nav));

    // 舊版樣式可能只有 .post-navigation，缺 .nav-label 時只補這一段
    let missing_css = match html::style_content(&out)? {
        Some(css) if css.contains(".post-navigation") && css.contains(".nav-label") => None,
        Some(css) if css.contains(".post-navigation") => Some(NAV_LABEL_CSS),
        Some(_) => Some(NAV_CSS),
        None => None,
    };
    if let Some(css) = missing_css {
        if let Some(with_css) = html::append_css(&out, css)? {
            out = with_css;
        }
    }

    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"<html>
<head>
    <title>Cacao Journey | Agroverse</title>
    <style>
        body { margin: 0; }
    </style>
</head>
<body>
<main>
<article>
    <h1>Cacao Journey</h1>
    <p>Story</p>
    <a href="../../blog/" class="back-link">← Back to Blog</a>
</article>
</main>
</body>
</html>"#;

    #[test]
    fn test_render_nav_omits_missing_side() {
        let prev = NavTarget::new("older");
        let nav = render_nav(Some(&prev), None, SectionKind::Farm).unwrap();

        assert!(nav.contains(r#"<a class="nav-link" href="../older/">← Previous Farm</a>"#));
        assert!(!nav.contains("nav-next"));
        assert!(render_nav(None, None, SectionKind::Post).is_none());
    }

    #[test]
    fn test_render_nav_with_titles() {
        let next = NavTarget::new("newer").with_title(Some("Fish & Chips".to_string()));
        let nav = render_nav(None, Some(&next), SectionKind::Post).unwrap();
        assert!(nav.contains(r#"<span class="nav-label">Fish &amp; Chips</span> →"#));
    }

    #[test]
    fn test_page_title_prefers_specific_h1() {
        assert_eq!(
            page_title(POST, "Agroverse").unwrap().as_deref(),
            Some("Cacao Journey")
        );

        let generic = "<html><head><title>Oscar's Farm | Agroverse Shop</title></head><body><h1>Farm</h1></body></html>";
        assert_eq!(
            page_title(generic, "Agroverse").unwrap().as_deref(),
            Some("Oscar's Farm")
        );

        assert_eq!(page_title("<p>nothing</p>", "Agroverse").unwrap(), None);
    }

    #[test]
    fn test_apply_nav_before_back_link_and_idempotent() {
        let nav = render_nav(
            Some(&NavTarget::new("older")),
            Some(&NavTarget::new("newer")),
            SectionKind::Post,
        )
        .unwrap();

        let first = apply_nav(POST, &nav).unwrap().unwrap();
        assert!(first.contains("</nav>\n<a href=\"../../blog/\" class=\"back-link\">"));
        assert!(first.contains(".post-navigation {"));

        let second = apply_nav(&first, &nav).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_apply_nav_adds_label_style_to_older_css() {
        let older = POST.replace(
            "body { margin: 0; }",
            "body { margin: 0; }\n        .post-navigation { display: flex; }",
        );
        let nav = render_nav(
            None,
            Some(&NavTarget::new("newer").with_title(Some("Newer".to_string()))),
            SectionKind::Post,
        )
        .unwrap();

        let out = apply_nav(&older, &nav).unwrap().unwrap();
        assert_eq!(out.matches(".post-navigation {").count(), 1);
        assert_eq!(out.matches(".nav-label {").count(), 1);
        assert_eq!(apply_nav(&out, &nav).unwrap().unwrap(), out);
    }

    #[test]
    fn test_apply_nav_replaces_stale_blocks() {
        let stale = POST.replace(
            "<a href=\"../../blog/\"",
            "<nav class_=\"post-navigation\"><a href=\"../gone/\">x</a></nav>\n<nav class=\"post-navigation\">y</nav>\n<a href=\"../../blog/\"",
        );
        let nav = render_nav(Some(&NavTarget::new("older")), None, SectionKind::Post).unwrap();

        let out = apply_nav(&stale, &nav).unwrap().unwrap();
        assert_eq!(out.matches("class=\"post-navigation\"").count(), 1);
        assert!(!out.contains("../gone/"));
    }

    #[test]
    fn test_apply_nav_falls_back_to_footer_then_main() {
        let nav = render_nav(Some(&NavTarget::new("a")), None, SectionKind::Farm).unwrap();

        let farm = "<main><section>x</section></main>\n<footer>f</footer>";
        let out = apply_nav(farm, &nav).unwrap().unwrap();
        assert!(out.contains("</nav>\n<footer>"));

        let bare = "<main><section>x</section></main>";
        let out = apply_nav(bare, &nav).unwrap().unwrap();
        assert!(out.ends_with("</nav>\n</main>"));

        assert!(apply_nav("<div>none</div>", &nav).unwrap().is_none());
    }
}
