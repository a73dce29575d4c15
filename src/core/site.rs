use crate::config::SiteConfig;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

fn to_rel(root: &Path, path: &Path) -> Option<PathBuf> {
    path.strip_prefix(root).ok().map(Path::to_path_buf)
}

fn rel_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn is_excluded(entry: &DirEntry, root: &Path, config: &SiteConfig) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    if entry.file_type().is_dir() {
        let name = entry.file_name().to_string_lossy();
        if config.site.exclude_dirs.iter().any(|d| d == name.as_ref()) {
            return true;
        }
    }
    match to_rel(root, entry.path()) {
        Some(rel) => {
            let rel = rel_string(&rel);
            config
                .site
                .exclude_paths
                .iter()
                .any(|prefix| rel == *prefix || rel.starts_with(&format!("{}/", prefix.trim_end_matches('/'))))
        }
        None => false,
    }
}

/// 站台內所有 .html 檔，回傳排序後的相對路徑
pub fn html_files(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let root = config.root();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_excluded(e, root, config));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "html") {
            if let Some(rel) = to_rel(root, entry.path()) {
                files.push(rel);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// section/<slug>/index.html，不含 section/index.html 本身
pub fn section_pages(config: &SiteConfig, section: &str) -> Result<Vec<PathBuf>> {
    let dir = config.site_path(section);
    if !dir.is_dir() {
        tracing::debug!("Section directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut pages = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let index = entry.path().join("index.html");
        if index.is_file() {
            pages.push(Path::new(section).join(entry.file_name()).join("index.html"));
        }
    }

    pages.sort();
    Ok(pages)
}

/// 子目錄名稱（排序）
pub fn subdirectories(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// 命令列指定的檔案轉成相對根目錄的路徑
pub fn explicit_targets(config: &SiteConfig, files: &[PathBuf]) -> Vec<PathBuf> {
    let root = config.root();
    files
        .iter()
        .map(|f| {
            f.strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| f.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<html></html>").unwrap();
    }

    #[test]
    fn test_html_files_respects_exclusions() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "index.html");
        touch(root, "post/a/index.html");
        touch(root, "assets/raw/wix_export.html");
        touch(root, "node_modules/pkg/readme.html");
        touch(root, "post/a/notes.txt");

        let config = SiteConfig::default().with_root(root);
        let files = html_files(&config).unwrap();

        assert_eq!(
            files,
            vec![PathBuf::from("index.html"), PathBuf::from("post/a/index.html")]
        );
    }

    #[test]
    fn test_section_pages_skip_section_index() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(root, "farms/index.html");
        touch(root, "farms/oscar/index.html");
        touch(root, "farms/capela-velha/index.html");
        fs::create_dir_all(root.join("farms/empty")).unwrap();

        let config = SiteConfig::default().with_root(root);
        let pages = section_pages(&config, "farms").unwrap();

        assert_eq!(
            pages,
            vec![
                PathBuf::from("farms/capela-velha/index.html"),
                PathBuf::from("farms/oscar/index.html"),
            ]
        );
        assert!(section_pages(&config, "missing").unwrap().is_empty());
    }
}
