use super::{css_rule_body, insert_declaration, replace_style};
use crate::core::html;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use regex::Regex;
use std::sync::LazyLock;

static HERO_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.event-hero\s*\{").expect("hero rule pattern"));
static BACKGROUND_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*['"]?([^'")]+)['"]?\s*\)"#).expect("background url pattern"));
static MIN_HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(min-height:\s*)\d+vh").expect("min-height pattern"));
static BACKGROUND_SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(background-size:\s*)contain").expect("background-size pattern"));
static BACKGROUND_POSITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(background-position:\s*)[^;]+").expect("background-position pattern")
});

const HERO_CHILDREN_RULE: &str = ".event-hero > *";

fn refined_hero(background_url: &str, with_children_rule: bool) -> String {
    let hero = format!(
        r#".event-hero {{
            background: linear-gradient(135deg, rgba(59, 51, 51, 0.6) 0%, rgba(77, 77, 77, 0.6) 100%), url('{}');
            background-size: cover;
            background-position: center center;
            background-repeat: no-repeat;
            background-attachment: scroll;
            background-blend-mode: overlay;
            color: white;
            padding: 5rem 2rem;
            text-align: center;
            min-height: 80vh;
            display: flex;
            flex-direction: column;
            justify-content: center;
            align-items: center;
            position: relative;
            overflow: hidden;
        }}"#,
        background_url
    );
    if with_children_rule {
        format!(
            "{}\n\n        {} {{\n            position: relative;\n            z-index: 1;\n        }}",
            hero, HERO_CHILDREN_RULE
        )
    } else {
        hero
    }
}

/// 活動頁背景圖：cover、置中、80vh，內容疊在遮罩上。
/// 只處理以 background url() 顯示封面的舊版活動頁，海報式的頁面不動。
pub struct EventHeroPatch;

impl EventHeroPatch {
    fn refine(css: &str) -> Option<String> {
        let rule = HERO_RULE_RE.find(css)?;
        let body = css_rule_body(css, rule.start())?;
        let text = &css[body.clone()];

        if text.contains("background-attachment") {
            let normalized = MIN_HEIGHT_RE.replace_all(text, "${1}80vh");
            let normalized = BACKGROUND_SIZE_RE.replace_all(&normalized, "${1}cover");
            let normalized = BACKGROUND_POSITION_RE.replace_all(&normalized, "${1}center center");
            if normalized == text {
                return None;
            }
            let mut out = css.to_string();
            out.replace_range(body, &normalized);
            return Some(out);
        }

        let url = BACKGROUND_URL_RE.captures(text)?.get(1)?.as_str().to_string();
        let hero = refined_hero(&url, !css.contains(HERO_CHILDREN_RULE));
        let mut out = css.to_string();
        out.replace_range(rule.start()..body.end + 1, &hero);
        Some(out)
    }
}

impl Patch for EventHeroPatch {
    fn name(&self) -> &'static str {
        "event-hero"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let Some(css) = html::style_content(&page.content)? else {
            return Ok(None);
        };
        match Self::refine(css) {
            Some(updated) => replace_style(&page.content, &updated),
            None => {
                tracing::debug!("No background hero in {}", page.display_path());
                Ok(None)
            }
        }
    }
}

/// 活動頁標題與說明段落置中，段落寬度限制在 800px
pub struct EventParagraphPatch;

impl EventParagraphPatch {
    const CONTENT_RULE: &'static str = ".event-hero-content {";
    const HEADING_RULE: &'static str = ".event-hero h1 {";
    const PARAGRAPH_RULE: &'static str = ".event-hero p {";

    const CENTERED_PARAGRAPH: &'static str = r#".event-hero-content p {
            font-size: 1.25rem;
            max-width: 800px;
            margin: 0 auto 1.5rem auto;
            opacity: 0.95;
            text-align: center;
        }"#;

    fn align(css: &str) -> String {
        let mut out = css.to_string();

        if let Some(at) = out.find(Self::CONTENT_RULE) {
            if let Some(body) = css_rule_body(&out, at) {
                if !out[body.clone()].contains("max-width") {
                    out = insert_declaration(
                        &out,
                        &body,
                        "margin-top",
                        "\n            max-width: 900px;\n            margin-left: auto;\n            margin-right: auto;",
                    );
                }
            }
        }

        if let Some(at) = out.find(Self::HEADING_RULE) {
            if let Some(body) = css_rule_body(&out, at) {
                if !out[body.clone()].contains("text-align") {
                    out = insert_declaration(&out, &body, "line-height", "\n            text-align: center;");
                }
            }
        }

        // 第一個是主要規則，換成置中版本；其餘（@media 內）只改選擇器
        if let Some(at) = out.find(Self::PARAGRAPH_RULE) {
            if let Some(body) = css_rule_body(&out, at) {
                out.replace_range(at..body.end + 1, Self::CENTERED_PARAGRAPH);
            }
        }
        out.replace(Self::PARAGRAPH_RULE, ".event-hero-content p {")
    }
}

impl Patch for EventParagraphPatch {
    fn name(&self) -> &'static str {
        "event-paragraphs"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let Some(css) = html::style_content(&page.content)? else {
            return Ok(None);
        };
        let aligned = Self::align(css);
        if aligned == css {
            return Ok(None);
        }
        replace_style(&page.content, &aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_page(css: &str) -> String {
        format!(
            "<html><head><style>\n{}\n    </style></head><body><section class=\"event-hero\"></section></body></html>",
            css
        )
    }

    const BACKGROUND_HERO: &str = r#"        .event-hero {
            background: linear-gradient(135deg, #3b3333 0%, #4d4d4d 100%), url('https://static.wixstatic.com/media/poster.jpg');
            background-size: contain;
            color: white;
        }

        .event-hero-content {
            margin-top: 2rem;
        }"#;

    #[test]
    fn test_background_hero_is_refined_once() {
        let page = Page::new("event-details-registration/a/index.html", event_page(BACKGROUND_HERO));
        let updated = EventHeroPatch.apply(&page).unwrap().unwrap();

        assert!(updated.contains("url('https://static.wixstatic.com/media/poster.jpg');\n            background-size: cover;"));
        assert!(updated.contains("min-height: 80vh;"));
        assert_eq!(updated.matches(".event-hero > * {").count(), 1);
        assert!(updated.contains(".event-hero-content {\n            margin-top: 2rem;"));

        let again = EventHeroPatch
            .apply(&Page::new("event-details-registration/a/index.html", updated))
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_earlier_refinement_is_normalised() {
        let css = r#"        .event-hero {
            background-size: contain;
            background-position: center top;
            background-attachment: scroll;
            min-height: 70vh;
        }"#;
        let page = Page::new("event-details-registration/a/index.html", event_page(css));
        let updated = EventHeroPatch.apply(&page).unwrap().unwrap();

        assert!(updated.contains("background-size: cover;"));
        assert!(updated.contains("background-position: center center;"));
        assert!(updated.contains("min-height: 80vh;"));
    }

    #[test]
    fn test_poster_hero_is_left_alone() {
        let css = "        .event-hero {\n            background: linear-gradient(135deg, #3b3333 0%, #4d4d4d 100%);\n        }";
        let page = Page::new("event-details-registration/a/index.html", event_page(css));
        assert!(EventHeroPatch.apply(&page).unwrap().is_none());
    }

    #[test]
    fn test_paragraphs_are_centered() {
        let css = r#"        .event-hero-content {
            margin-top: 2rem;
        }

        .event-hero h1 {
            font-size: 3rem;
            line-height: 1.2;
        }

        .event-hero p {
            font-size: 1.25rem;
            max-width: 800px;
            opacity: 0.95;
        }

        @media (max-width: 768px) {
            .event-hero p {
                font-size: 1rem;
            }
        }"#;
        let page = Page::new("event-details-registration/a/index.html", event_page(css));
        let updated = EventParagraphPatch.apply(&page).unwrap().unwrap();

        assert!(updated.contains(
            "margin-top: 2rem;\n            max-width: 900px;\n            margin-left: auto;\n            margin-right: auto;"
        ));
        assert!(updated.contains("line-height: 1.2;\n            text-align: center;"));
        assert!(updated.contains(".event-hero-content p {\n            font-size: 1.25rem;"));
        assert!(updated.contains("margin: 0 auto 1.5rem auto;"));

        assert!(updated.contains("            .event-hero-content p {\n                font-size: 1rem;"));
        assert!(!updated.contains(".event-hero p {"));

        let again = EventParagraphPatch
            .apply(&Page::new("event-details-registration/a/index.html", updated))
            .unwrap();
        assert!(again.is_none());
    }
}
