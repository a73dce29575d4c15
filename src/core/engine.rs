use crate::core::{Page, Patch, Storage};
use crate::utils::error::{Result, SiteError};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.updated.len() + self.skipped + self.failed.len()
    }

    pub fn print(&self, patch: &str, dry_run: bool) {
        println!("{}", "=".repeat(60));
        println!("Summary ({}{}):", patch, if dry_run { ", dry run" } else { "" });
        let verb = if dry_run { "Would update" } else { "Updated" };
        println!("  ✅ {}: {}", verb, self.updated.len());
        println!("  ℹ️  Skipped: {}", self.skipped);
        if !self.failed.is_empty() {
            println!("  ❌ Errors: {}", self.failed.len());
            for (path, message) in &self.failed {
                println!("     {}: {}", path.display(), message);
            }
        }
        println!("  Total processed: {}", self.total());
    }
}

/// 逐檔套用修補，單一檔案失敗不會中斷整批
pub struct PatchEngine<S: Storage> {
    storage: S,
    dry_run: bool,
}

impl<S: Storage> PatchEngine<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub async fn run<P: Patch + ?Sized>(&self, patch: &P, targets: &[PathBuf]) -> RunSummary {
        tracing::info!(
            "🚀 Running '{}' on {} file(s){}",
            patch.name(),
            targets.len(),
            if self.dry_run { " (dry run)" } else { "" }
        );

        let mut summary = RunSummary::default();
        for target in targets {
            match self.process(patch, target).await {
                Ok(true) => {
                    tracing::info!("  ✅ {}", target.display());
                    summary.updated.push(target.clone());
                }
                Ok(false) => {
                    tracing::debug!("  ℹ️  Unchanged: {}", target.display());
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!("  ❌ {}: {}", target.display(), e);
                    summary.failed.push((target.clone(), e.to_string()));
                }
            }
        }

        tracing::info!(
            "📊 '{}' finished: {} updated, {} skipped, {} failed",
            patch.name(),
            summary.updated.len(),
            summary.skipped,
            summary.failed.len()
        );
        summary
    }

    async fn process<P: Patch + ?Sized>(&self, patch: &P, target: &Path) -> Result<bool> {
        let key = target.to_string_lossy().replace('\\', "/");
        let bytes = self.storage.read_file(&key).await?;
        let content = String::from_utf8(bytes).map_err(|e| SiteError::html(&key, e.to_string()))?;

        let page = Page::new(target, content);
        let Some(updated) = patch.apply(&page)? else {
            return Ok(false);
        };
        if updated == page.content {
            return Ok(false);
        }

        if !self.dry_run {
            self.storage.write_file(&key, updated.as_bytes()).await?;
        }
        Ok(true)
    }
}
