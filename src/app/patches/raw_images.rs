use crate::core::html::relative_root;
use crate::core::{Page, Patch};
use crate::utils::error::Result;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// img src、video poster、CSS url() 與 onerror 裡的 this.src
static REFERENCE_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r#"(?i)(\s(?:src|poster)\s*=\s*["'])([^"']*assets[/\\]raw[/\\][^"']*)(["'])"#)
            .expect("src attribute pattern"),
        Regex::new(r#"(url\(\s*(?:&quot;|["'])?)([^"')&]*assets[/\\]raw[/\\][^"')&]*)((?:&quot;|["'])?\s*\))"#)
            .expect("css url pattern"),
        Regex::new(r#"(this\.src\s*=\s*\\?['"])([^'"\\]*assets[/\\]raw[/\\][^'"\\]*)(\\?['"])"#)
            .expect("onerror pattern"),
    ]
});

static RAW_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"assets/raw/(.+)").expect("raw tail pattern"));

/// 把 assets/raw 裡的圖片複製到 assets/images/<類別>/，並改寫頁面上的引用。
/// 類別依頁面路徑決定：文章、活動、航運，其餘放在 assets/images。
pub struct RawImagesPatch {
    root: PathBuf,
    copy_files: bool,
}

impl RawImagesPatch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            copy_files: true,
        }
    }

    /// dry-run 時只改寫內容，不複製檔案
    pub fn with_copy(mut self, copy_files: bool) -> Self {
        self.copy_files = copy_files;
        self
    }

    fn target_dir(rel_path: &Path) -> &'static str {
        let path = rel_path.to_string_lossy();
        if path.contains("post") {
            "assets/images/blog-posts"
        } else if path.contains("event") {
            "assets/images/events"
        } else if path.contains("shipment") {
            "assets/images/shipments"
        } else {
            "assets/images"
        }
    }

    /// 同名但大小不同的檔案改用 name_1.ext、name_2.ext
    fn destination(&self, raw_file: &Path, target_dir: &str) -> Result<PathBuf> {
        let file_name = raw_file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = raw_file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = raw_file
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let size = fs::metadata(raw_file)?.len();

        let mut rel = Path::new(target_dir).join(&file_name);
        let mut counter = 1;
        while let Ok(existing) = fs::metadata(self.root.join(&rel)) {
            if existing.len() == size {
                break;
            }
            rel = Path::new(target_dir).join(format!("{}_{}{}", stem, counter, extension));
            counter += 1;
        }
        Ok(rel)
    }

    /// 回傳新的站台相對路徑，原始檔不存在時回傳 None
    fn relocate(&self, reference: &str, target_dir: &str) -> Result<Option<PathBuf>> {
        let normalized = reference.replace('\\', "/");
        let Some(tail) = RAW_TAIL_RE.captures(&normalized).and_then(|c| c.get(1)) else {
            return Ok(None);
        };
        let tail = tail.as_str().split(['?', '#']).next().unwrap_or("");
        let raw_file = self.root.join("assets/raw").join(tail);
        if !raw_file.is_file() {
            tracing::warn!("⚠️ File not found: {}", raw_file.display());
            return Ok(None);
        }

        let rel = self.destination(&raw_file, target_dir)?;
        let dest = self.root.join(&rel);
        if self.copy_files && !dest.exists() {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&raw_file, &dest)?;
            tracing::info!("📁 Copied: {} -> {}", tail, rel.display());
        }
        Ok(Some(rel))
    }
}

impl Patch for RawImagesPatch {
    fn name(&self) -> &'static str {
        "raw-images"
    }

    fn apply(&self, page: &Page) -> Result<Option<String>> {
        if !page.content.contains("assets/raw") && !page.content.contains("assets\\raw") {
            return Ok(None);
        }

        let target_dir = Self::target_dir(&page.rel_path);
        let root = relative_root(&page.rel_path);
        let mut out = page.content.clone();
        let mut first_error = None;

        for re in REFERENCE_RES.iter() {
            out = re
                .replace_all(&out, |caps: &Captures| match self.relocate(&caps[2], target_dir) {
                    Ok(Some(rel)) => {
                        let new_path = format!("{}{}", root, rel.to_string_lossy().replace('\\', "/"));
                        tracing::info!("  ✅ Updated: {} -> {}", &caps[2], new_path);
                        format!("{}{}{}", &caps[1], new_path, &caps[3])
                    }
                    Ok(None) => caps[0].to_string(),
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                        caps[0].to_string()
                    }
                })
                .into_owned();
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(Some(out))
    }
}
