use super::{css_rule_body, replace_style};
use crate::core::html;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use regex::Regex;
use std::sync::LazyLock;

static MOBILE_MEDIA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@media\s*\(max-width:\s*768px\)\s*\{").expect("mobile media pattern"));

const HIDE_DESKTOP_LINKS: &str =
    "\n            .nav-links:not(.mobile-menu) {\n                display: none !important;\n            }";
const BODY_OVERFLOW: &str = "\n        body {\n            overflow-x: hidden;\n        }";
const VIEWPORT_META: &str = r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#;

/// 手機版只顯示漢堡選單：隱藏原本的 .nav-links、禁止橫向捲動、補上 viewport
pub struct MobileNavPatch;

impl MobileNavPatch {
    fn optimize_css(css: &str) -> Option<String> {
        let media = MOBILE_MEDIA_RE.find(css)?;
        let mut out = css.to_string();

        let body = css_rule_body(&out, media.start())?;
        if out.contains(".mobile-menu-toggle") && !out[body.clone()].contains(".nav-links:not(.mobile-menu)") {
            let position = out[body.clone()]
                .find(".mobile-menu-toggle")
                .and_then(|at| css_rule_body(&out, body.start + at))
                .map(|toggle| toggle.end + 1)
                .unwrap_or_else(|| body.start + out[body.clone()].trim_end().len());
            out = html::insert_at(&out, position, HIDE_DESKTOP_LINKS);
        }

        let body = css_rule_body(&out, media.start())?;
        if !out[body.clone()].contains("overflow-x: hidden") {
            out = html::insert_at(&out, body.start, BODY_OVERFLOW);
        }

        (out != css).then_some(out)
    }
}

impl Patch for MobileNavPatch {
    fn name(&self) -> &'static str {
        "mobile-nav"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let mut out = html::normalize_class_attrs(&page.content);
        if !out.contains("<nav") {
            return Ok(Some(out));
        }

        let Some(css) = html::style_content(&out)? else {
            return Ok(Some(out));
        };
        if !MOBILE_MEDIA_RE.is_match(css) {
            tracing::debug!("No mobile media query in {}", page.display_path());
            return Ok(Some(out));
        }
        if let Some(optimized) = Self::optimize_css(css) {
            if let Some(updated) = replace_style(&out, &optimized)? {
                out = updated;
            }
        }

        if !out.contains("name=\"viewport\"") {
            if let Some(head) = html::find_first(&out, "head")? {
                out = html::insert_at(&out, head.open_end, &format!("\n    {}", VIEWPORT_META));
            }
        }
        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
    <title>Farms</title>
    <style>
        .nav-links { display: flex; }

        @media (max-width: 768px) {
            .mobile-menu-toggle {
                display: flex;
            }

            .hero { padding: 1rem; }
        }
    </style>
</head>
<body><nav><ul class_="nav-links"><li>a</li></ul></nav></body></html>"#;

    #[test]
    fn test_mobile_rules_and_viewport_are_added_once() {
        let page = Page::new("farms/index.html", PAGE);
        let updated = MobileNavPatch.apply(&page).unwrap().unwrap();

        assert!(updated.contains(
            "            .mobile-menu-toggle {\n                display: flex;\n            }\n            .nav-links:not(.mobile-menu) {\n                display: none !important;\n            }"
        ));
        assert!(updated.contains("@media (max-width: 768px) {\n        body {\n            overflow-x: hidden;\n        }"));
        assert!(updated.contains("<head>\n    <meta name=\"viewport\""));
        assert!(updated.contains(r#"<ul class="nav-links">"#));

        let again = MobileNavPatch.apply(&Page::new("farms/index.html", updated.clone())).unwrap().unwrap();
        assert_eq!(again, updated);
    }

    #[test]
    fn test_hide_rule_goes_to_end_of_media_without_toggle_rule() {
        let css = "@media (max-width: 768px) {\n    .hero { padding: 1rem; }\n}\n.mobile-menu-toggle { display: none; }";
        let optimized = MobileNavPatch::optimize_css(css).unwrap();
        let media_end = optimized.find("\n}\n.mobile-menu-toggle").unwrap();
        let hide = optimized.find(".nav-links:not(.mobile-menu)").unwrap();
        assert!(hide < media_end);
    }

    #[test]
    fn test_pages_without_nav_only_get_class_fix() {
        let page = Page::new("x.html", "<div class_=\"a\"></div><style>@media (max-width: 768px) { a {} }</style>");
        let updated = MobileNavPatch.apply(&page).unwrap().unwrap();
        assert_eq!(updated, "<div class=\"a\"></div><style>@media (max-width: 768px) { a {} }</style>");
    }
}
