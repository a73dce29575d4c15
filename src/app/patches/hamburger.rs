use super::{children, indent_at};
use crate::core::html::{self, has_class};
use crate::core::{Page, Patch};
use crate::utils::error::Result;

const HAMBURGER_CSS: &str = include_str!("../../../assets/snippets/hamburger.css");
const HAMBURGER_JS: &str = include_str!("../../../assets/snippets/hamburger.js");

const TOGGLE_BUTTON: &str = r#"<button class="mobile-menu-toggle" aria-label="Toggle navigation menu" aria-expanded="false">
    <span class="hamburger-line"></span>
    <span class="hamburger-line"></span>
    <span class="hamburger-line"></span>
</button>"#;

/// 手機版漢堡選單：按鈕、樣式、遮罩與切換腳本
pub struct HamburgerPatch;

impl Patch for HamburgerPatch {
    fn name(&self) -> &'static str {
        "hamburger"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let content = &page.content;
        if content.to_lowercase().contains("hamburger") || content.contains("mobile-menu-toggle") {
            return Ok(None);
        }

        let Some(nav) = html::find_first(content, "nav")? else {
            tracing::debug!("No <nav> in {}", page.display_path());
            return Ok(None);
        };
        let lists = children(content, &nav, "ul")?;
        let Some(list) = lists
            .iter()
            .find(|ul| has_class(ul.open_tag(content), "nav-links"))
            .or_else(|| lists.first())
            .copied()
        else {
            tracing::debug!("No menu list inside <nav> in {}", page.display_path());
            return Ok(None);
        };

        let mut out = html::add_class(content, &list, "mobile-menu");
        let indent = indent_at(&out, list.start).to_string();
        out = html::insert_at(&out, list.start, &format!("{}\n{}", TOGGLE_BUTTON, indent));

        let styled = html::style_content(&out)?.is_some_and(|css| css.contains("mobile-menu-toggle"));
        if !styled {
            if let Some(with_css) = html::append_css(&out, HAMBURGER_CSS.trim_end())? {
                out = with_css;
            }
        }

        let tail = format!(
            "<div class=\"mobile-menu-overlay\"></div>\n<script>\n{}</script>",
            HAMBURGER_JS
        );
        if let Some(with_tail) = html::insert_before_body_close(&out, &tail) {
            out = with_tail;
        }

        Ok(Some(out))
    }
}
