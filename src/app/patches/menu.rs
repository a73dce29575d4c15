use super::{children, hrefs, insert_items_after};
use crate::core::html::{self, ElementSpan};
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use std::path::PathBuf;

/// 重複執行舊腳本留下的多組漢堡選單，只保留第一組
pub struct DedupeMenuPatch;

const SINGLETONS: &[(&str, &str)] = &[
    ("button", "mobile-menu-toggle"),
    ("ul", "mobile-menu"),
    ("div", "mobile-menu-overlay"),
];

impl Patch for DedupeMenuPatch {
    fn name(&self) -> &'static str {
        "dedupe-menu"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let mut out = html::normalize_class_attrs(&page.content);
        for (tag, class) in SINGLETONS {
            let found = html::find_elements(&out, tag, class)?;
            if found.len() > 1 {
                tracing::debug!(
                    "Removing {} duplicate {}.{} in {}",
                    found.len() - 1,
                    tag,
                    class,
                    page.display_path()
                );
                out = html::remove_spans(&out, &found[1..]);
            }
        }
        Ok(Some(out))
    }
}

fn menu_lists(page_html: &str) -> Result<Vec<ElementSpan>> {
    let mut lists: Vec<ElementSpan> = html::find_all(page_html, "ul")?
        .into_iter()
        .filter(|ul| {
            let open = ul.open_tag(page_html);
            html::has_class(open, "nav-links") || html::has_class(open, "footer-links")
        })
        .collect();
    lists.sort_by_key(|s| s.start);
    Ok(lists)
}

fn links_to_blog(href: &str) -> bool {
    let href = href.split('#').next().unwrap_or("");
    href == "blog/" || href.ends_with("/blog/") || href.ends_with("blog/index.html") || href == "/blog"
}

/// 在導覽與頁尾選單的 Shipments 後面加上 Blog 連結
pub struct BlogLinkPatch {
    blog_index: PathBuf,
}

impl BlogLinkPatch {
    pub fn new(blog_index: impl Into<PathBuf>) -> Self {
        Self {
            blog_index: blog_index.into(),
        }
    }
}

impl Patch for BlogLinkPatch {
    fn name(&self) -> &'static str {
        "blog-link"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        if page.rel_path == self.blog_index {
            return Ok(None);
        }

        let item = format!("<li><a href=\"{}blog/\">Blog</a></li>", page.root_prefix());
        let mut out = page.content.clone();

        // 由後往前插入，前面的位置不受影響
        for list in menu_lists(&page.content)?.iter().rev() {
            if hrefs(&out, list)?.iter().any(|h| links_to_blog(h)) {
                continue;
            }
            let items = children(&out, list, "li")?;
            let shipments = items.iter().find(|li| {
                html::find_all(&out[li.outer()], "a")
                    .map(|anchors| {
                        anchors.iter().any(|a| {
                            html::attr(a.open_tag(&out[li.outer()]), "href")
                                .is_some_and(|h| h.to_lowercase().contains("shipments"))
                        })
                    })
                    .unwrap_or(false)
            });
            if let Some(after) = shipments {
                out = insert_items_after(&out, after, std::slice::from_ref(&item));
            }
        }

        Ok(Some(out))
    }
}

/// 文章頁導覽列在 Blog 後面加上 Partners 與 Gatherings
pub struct PartnerLinksPatch;

impl Patch for PartnerLinksPatch {
    fn name(&self) -> &'static str {
        "partner-links"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let content = &page.content;
        let navs = html::find_all(content, "nav")?;
        let lists: Vec<ElementSpan> = html::find_elements(content, "ul", "nav-links")?
            .into_iter()
            .filter(|ul| navs.iter().any(|nav| ul.start >= nav.open_end && ul.end <= nav.close_start))
            .collect();
        if lists.is_empty() {
            tracing::debug!("No nav-links menu inside <nav> in {}", page.display_path());
            return Ok(None);
        }

        let prefix = page.root_prefix();
        let new_items = [
            format!("<li><a href=\"{}partners/index.html\">Partners</a></li>", prefix),
            format!("<li><a href=\"{}index.html#gatherings\">Gatherings</a></li>", prefix),
        ];

        let mut out = content.clone();
        for list in lists.iter().rev() {
            let existing = hrefs(&out, list)?;
            if existing.iter().any(|h| {
                let lower = h.to_lowercase();
                lower.contains("partner") || lower.contains("gathering")
            }) {
                continue;
            }

            let items = children(&out, list, "li")?;
            let blog = items.iter().find(|li| {
                let li_html = &out[li.outer()];
                html::find_all(li_html, "a")
                    .map(|anchors| {
                        anchors.iter().any(|a| {
                            html::attr(a.open_tag(li_html), "href")
                                .is_some_and(|h| h.to_lowercase().contains("blog"))
                        })
                    })
                    .unwrap_or(false)
            });
            match blog {
                Some(after) => out = insert_items_after(&out, after, &new_items),
                None => tracing::warn!("⚠️ No Blog link to follow in {}", page.display_path()),
            }
        }

        Ok(Some(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_keeps_first_of_each() {
        let page = Page::new(
            "post/a/index.html",
            "<nav>\n<button class_=\"mobile-menu-toggle\">1</button>\n<button class=\"mobile-menu-toggle\">2</button>\n<ul class=\"nav-links mobile-menu\"><li>a</li></ul>\n<ul class=\"mobile-menu\"><li>b</li></ul>\n</nav>\n<div class=\"mobile-menu-overlay\"></div>\n<div class=\"mobile-menu-overlay\"></div>\n",
        );
        let out = DedupeMenuPatch.apply(&page).unwrap().unwrap();
        assert_eq!(
            out,
            "<nav>\n<button class=\"mobile-menu-toggle\">1</button>\n<ul class=\"nav-links mobile-menu\"><li>a</li></ul>\n</nav>\n<div class=\"mobile-menu-overlay\"></div>\n"
        );
        let again = DedupeMenuPatch.apply(&Page::new("post/a/index.html", out.clone())).unwrap().unwrap();
        assert_eq!(again, out);
    }

    const MENU: &str = r#"<nav>
    <ul class="nav-links">
        <li><a href="../../index.html">Home</a></li>
        <li><a href="../../shipments/agl8/index.html">Shipments</a></li>
        <li><a href="mailto:community@agroverse.shop">Contact</a></li>
    </ul>
</nav>
<footer>
    <ul class="footer-links">
        <li><a href="../../shipments/agl8/index.html">Shipments</a></li>
    </ul>
</footer>"#;

    #[test]
    fn test_blog_link_after_shipments_in_both_menus() {
        let patch = BlogLinkPatch::new("blog/index.html");
        let out = patch.apply(&Page::new("post/a/index.html", MENU)).unwrap().unwrap();

        assert_eq!(out.matches(r#"<li><a href="../../blog/">Blog</a></li>"#).count(), 2);
        assert!(out.contains(
            "Shipments</a></li>\n        <li><a href=\"../../blog/\">Blog</a></li>\n        <li><a href=\"mailto:"
        ));

        let again = patch.apply(&Page::new("post/a/index.html", out.clone())).unwrap().unwrap();
        assert_eq!(again, out);
        assert!(patch.apply(&Page::new("blog/index.html", MENU)).unwrap().is_none());
    }

    #[test]
    fn test_partner_links_after_blog() {
        let with_blog = MENU.replace(
            "Shipments</a></li>\n        <li><a href=\"mailto",
            "Shipments</a></li>\n        <li><a href=\"../../blog/\">Blog</a></li>\n        <li><a href=\"mailto",
        );
        let out = PartnerLinksPatch
            .apply(&Page::new("post/a/index.html", with_blog.as_str()))
            .unwrap()
            .unwrap();

        assert!(out.contains(
            "Blog</a></li>\n        <li><a href=\"../../partners/index.html\">Partners</a></li>\n        <li><a href=\"../../index.html#gatherings\">Gatherings</a></li>"
        ));
        assert_eq!(out.matches("Partners</a>").count(), 1);

        let again = PartnerLinksPatch
            .apply(&Page::new("post/a/index.html", out.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(again, out);
    }
}
