use crate::core::html;
use crate::core::{Page, Patch};
use crate::utils::error::Result;

const GTAG_TEMPLATE: &str = include_str!("../../../assets/snippets/gtag.html");
const GTAG_MARKER: &str = "googletagmanager.com/gtag/js";

/// 在 </head> 前加入 Google Analytics gtag.js
pub struct AnalyticsPatch {
    measurement_id: String,
    snippet: String,
}

impl AnalyticsPatch {
    pub fn new(measurement_id: impl Into<String>) -> Self {
        let measurement_id = measurement_id.into();
        let snippet = GTAG_TEMPLATE
            .replace("{{MEASUREMENT_ID}}", &measurement_id)
            .trim_end()
            .to_string();
        Self {
            measurement_id,
            snippet,
        }
    }

    pub fn has_analytics(&self, content: &str) -> bool {
        content.contains(&self.measurement_id) || content.contains(GTAG_MARKER)
    }
}

impl Patch for AnalyticsPatch {
    fn name(&self) -> &'static str {
        "analytics"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        if self.has_analytics(&page.content) {
            return Ok(None);
        }

        let updated = html::insert_before_head_close(&page.content, &self.snippet);
        if updated.is_none() {
            tracing::warn!("⚠️ No </head> tag found: {}", page.display_path());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inserts_once_before_head_close() {
        let patch = AnalyticsPatch::new("G-TEST123");
        let page = Page::new("index.html", "<html><head><title>x</title></HEAD><body></body></html>");

        let updated = patch.apply(&page).unwrap().unwrap();
        assert!(updated.contains("gtag/js?id=G-TEST123\"></script>"));
        assert!(updated.contains("gtag('config', 'G-TEST123');\n</script>\n</HEAD>"));
        assert!(updated.starts_with("<html><head><title>x</title>\n<!-- Google tag (gtag.js) -->"));

        let again = Page::new("index.html", updated);
        assert!(patch.apply(&again).unwrap().is_none());
    }

    #[test]
    fn test_skips_page_without_head_or_with_other_tag() {
        let patch = AnalyticsPatch::new("G-TEST123");
        assert!(patch.apply(&Page::new("a.html", "<p>fragment</p>")).unwrap().is_none());

        let tagged = Page::new(
            "b.html",
            r#"<head><script src="https://www.googletagmanager.com/gtag/js?id=G-OTHER"></script></head>"#,
        );
        assert!(patch.apply(&tagged).unwrap().is_none());
    }
}
