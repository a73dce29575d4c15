use crate::core::meta;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use regex::Regex;

const SOCIAL_TAGS: &[(&str, &str)] = &[("og:image", "og:type"), ("twitter:image", "twitter:card")];

/// og:image 與 twitter:image 指向頁面主視覺
pub struct SocialMetaPatch {
    base_url: String,
}

impl SocialMetaPatch {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Patch for SocialMetaPatch {
    fn name(&self) -> &'static str {
        "social-meta"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let Some(image) = meta::hero_image(&page.content)? else {
            tracing::debug!("No hero image in {}", page.display_path());
            return Ok(None);
        };
        let url = meta::resolve_image_url(&self.base_url, &page.rel_path, &image)?;

        let mut out = page.content.clone();
        let mut changed = false;
        for (property, anchor) in SOCIAL_TAGS {
            match meta::upsert_meta(&out, property, &url, anchor)? {
                Some(updated) => {
                    out = updated;
                    changed = true;
                }
                None if meta::find_meta(&out, property)?.is_none() => {
                    tracing::warn!("⚠️ No {} or {} tag in {}", property, anchor, page.display_path());
                }
                None => {}
            }
        }

        Ok(changed.then_some(out))
    }
}

/// 修正 partners/<slug>/assets/partners/headers/ 這種多一層的圖片網址
pub struct PartnerImagesPatch {
    pattern: Regex,
    replacement: String,
}

impl PartnerImagesPatch {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = base_url.trim_end_matches('/');
        let pattern = Regex::new(&format!(
            r"^{}/partners/[^/]+/assets/partners/headers/(.+)$",
            regex::escape(base)
        ))?;
        Ok(Self {
            pattern,
            replacement: format!("{}/assets/partners/headers/", base),
        })
    }

    fn corrected(&self, value: &str) -> Option<String> {
        let caps = self.pattern.captures(value)?;
        Some(format!("{}{}", self.replacement, &caps[1]))
    }
}

impl Patch for PartnerImagesPatch {
    fn name(&self) -> &'static str {
        "partner-images"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        let mut out = page.content.clone();
        let mut changed = false;

        for (property, anchor) in SOCIAL_TAGS {
            let Some(current) = meta::meta_content(&out, property)? else {
                continue;
            };
            if let Some(fixed) = self.corrected(&current) {
                tracing::debug!("{}: {} -> {}", property, current, fixed);
                if let Some(updated) = meta::upsert_meta(&out, property, &fixed, anchor)? {
                    out = updated;
                    changed = true;
                }
            }
        }

        Ok(changed.then_some(out))
    }
}
