use crate::core::html;
use crate::core::{Page, Patch};
use crate::utils::error::Result;

const MENU_HIDE_CSS: &str = include_str!("../../../assets/snippets/menu_hide.css");
const SPACING_CSS: &str = include_str!("../../../assets/snippets/spacing.css");

const NAV_LINKS_RULE: &str = ".nav-links {";
const SPACING_MARKER: &str = ".blog-content > div";
const SPACING_ANCHORS: &[&str] = &[
    "@media (max-width: 768px)",
    "/* Mobile Menu Toggle */",
    "mobile-menu-toggle",
];

/// 桌面版隱藏 .nav-links.mobile-menu，接在第一個 .nav-links 規則之後
pub struct MenuHideCssPatch;

impl Patch for MenuHideCssPatch {
    fn name(&self) -> &'static str {
        "menu-hide-css"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let Some(css) = html::style_content(&page.content)? else {
            tracing::warn!("⚠️ No <style> block in {}", page.display_path());
            return Ok(None);
        };

        let before_media = css.split("@media").next().unwrap_or("");
        if before_media.contains(".nav-links.mobile-menu") && before_media.contains("display: none") {
            return Ok(None);
        }

        let Some(rule_start) = css.find(NAV_LINKS_RULE) else {
            tracing::warn!("⚠️ No .nav-links rule in {}", page.display_path());
            return Ok(None);
        };
        let Some(rule_len) = css[rule_start..].find('}') else {
            return Ok(None);
        };

        html::insert_css_at(&page.content, rule_start + rule_len + 1, MENU_HIDE_CSS.trim_end())
    }
}

/// 部落格文章標題與段落間距
pub struct SpacingCssPatch;

impl SpacingCssPatch {
    fn insertion_offset(css: &str) -> Option<usize> {
        SPACING_ANCHORS.iter().find_map(|anchor| {
            css.find(anchor)
                .map(|pos| css[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0))
        })
    }
}

impl Patch for SpacingCssPatch {
    fn name(&self) -> &'static str {
        "spacing-css"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let Some(css) = html::style_content(&page.content)? else {
            tracing::warn!("⚠️ No <style> block in {}", page.display_path());
            return Ok(None);
        };
        if css.contains(SPACING_MARKER) {
            return Ok(None);
        }

        match Self::insertion_offset(css) {
            Some(offset) => html::insert_css_at(&page.content, offset, SPACING_CSS),
            None => html::append_css(&page.content, &format!("\n\n{}", SPACING_CSS.trim_end())),
        }
    }
}
