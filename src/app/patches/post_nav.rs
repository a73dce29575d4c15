use crate::config::SiteConfig;
use crate::core::navigation::{self, NavTarget, SectionKind};
use crate::core::ordering;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// 依區段順序加上上一篇/下一篇導覽
pub struct PostNavPatch {
    kind: SectionKind,
    directory: PathBuf,
    order: Vec<String>,
    titles: HashMap<String, String>,
}

impl PostNavPatch {
    pub fn new(kind: SectionKind, directory: impl Into<PathBuf>, order: Vec<String>) -> Self {
        Self {
            kind,
            directory: directory.into(),
            order,
            titles: HashMap::new(),
        }
    }

    pub fn with_titles(mut self, titles: HashMap<String, String>) -> Self {
        self.titles = titles;
        self
    }

    /// 從站台內容決定順序，必要時讀取每頁標題
    pub fn prepare(config: &SiteConfig, kind: SectionKind, with_titles: bool) -> Result<Self> {
        let directory = kind.directory(&config.sections).to_string();
        let section_dir = config.site_path(&directory);

        let order = match kind {
            SectionKind::Post => {
                let index = config.site_path(config.blog_index());
                if index.is_file() {
                    ordering::blog_post_order(&std::fs::read_to_string(&index)?)?
                } else {
                    tracing::warn!("⚠️ Blog index not found: {}", index.display());
                    Vec::new()
                }
            }
            SectionKind::Farm => ordering::farm_order(&section_dir)?,
            SectionKind::Shipment => ordering::shipment_order(&section_dir)?,
        };
        tracing::info!("📋 {} order: {} page(s)", kind.name(), order.len());

        let mut titles = HashMap::new();
        if with_titles {
            for slug in &order {
                let path = section_dir.join(slug).join("index.html");
                let Ok(content) = std::fs::read_to_string(&path) else {
                    tracing::debug!("No page for {} at {}", slug, path.display());
                    continue;
                };
                if let Some(title) = navigation::page_title(&content, &config.site.brand)? {
                    titles.insert(slug.clone(), title);
                }
            }
        }

        Ok(Self::new(kind, directory, order).with_titles(titles))
    }

    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    pub fn order(&self) -> &[String] {
        &self.order
    }

    fn target(&self, slug: &str) -> NavTarget {
        NavTarget::new(slug).with_title(self.titles.get(slug).cloned())
    }

    fn in_section(&self, page: &Page) -> bool {
        page.rel_path
            .parent()
            .and_then(Path::parent)
            .is_some_and(|dir| dir == self.directory.as_path())
    }
}

impl Patch for PostNavPatch {
    fn name(&self) -> &'static str {
        "post-nav"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        if !self.in_section(page) {
            return Ok(None);
        }
        let Some(slug) = page.slug() else {
            return Ok(None);
        };
        let Some((previous, next)) = ordering::neighbours(&self.order, slug) else {
            tracing::debug!("{} is not in the {} order", slug, self.kind.name());
            return Ok(None);
        };

        let previous = previous.map(|s| self.target(s));
        let next = next.map(|s| self.target(s));
        let Some(nav) = navigation::render_nav(previous.as_ref(), next.as_ref(), self.kind) else {
            return Ok(None);
        };

        let updated = navigation::apply_nav(&page.content, &nav)?;
        if updated.is_none() {
            tracing::warn!("⚠️ No place for navigation in {}", page.display_path());
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn page(slug: &str) -> String {
        format!(
            "<html><head><title>{0} | Agroverse</title><style>\n    body {{}}\n</style></head>\n<body>\n<article>\n<h1>{0}</h1>\n<a class=\"back-link\" href=\"../../blog/\">Back</a>\n</article>\n</body></html>",
            slug
        )
    }

    #[test]
    fn test_middle_page_gets_both_sides() {
        let patch = PostNavPatch::new(
            SectionKind::Post,
            "post",
            vec!["newest".into(), "middle".into(), "oldest".into()],
        );
        let out = patch
            .apply(&Page::new("post/middle/index.html", page("middle")))
            .unwrap()
            .unwrap();

        assert!(out.contains(r#"<div class="nav-item nav-prev"><a class="nav-link" href="../oldest/">← Previous Post</a></div>"#));
        assert!(out.contains(r#"<div class="nav-item nav-next"><a class="nav-link" href="../newest/">Next Post →</a></div>"#));

        let again = patch
            .apply(&Page::new("post/middle/index.html", out.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(again, out);
    }

    #[test]
    fn test_unknown_slug_and_other_section_are_skipped() {
        let patch = PostNavPatch::new(SectionKind::Post, "post", vec!["a".into(), "b".into()]);
        assert!(patch
            .apply(&Page::new("post/zzz/index.html", page("zzz")))
            .unwrap()
            .is_none());
        assert!(patch
            .apply(&Page::new("farms/a/index.html", page("a")))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_prepare_shipments_with_titles() {
        let temp = TempDir::new().unwrap();
        for slug in ["agl2", "agl10", "notes"] {
            let dir = temp.path().join("shipments").join(slug);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("index.html"), page(&slug.to_uppercase())).unwrap();
        }
        let config = SiteConfig::default().with_root(temp.path());

        let patch = PostNavPatch::prepare(&config, SectionKind::Shipment, true).unwrap();
        assert_eq!(patch.order(), ["agl10", "agl2"]);

        let out = patch
            .apply(&Page::new("shipments/agl10/index.html", page("AGL10")))
            .unwrap()
            .unwrap();
        assert!(out.contains(r#"href="../agl2/">← <span class="nav-label">AGL2</span></a>"#));
        assert!(!out.contains("nav-item nav-next"));
    }

    #[test]
    fn test_prepare_posts_without_index() {
        let temp = TempDir::new().unwrap();
        let config = SiteConfig::default().with_root(temp.path());
        let patch = PostNavPatch::prepare(&config, SectionKind::Post, false).unwrap();
        assert!(patch.order().is_empty());
    }
}
