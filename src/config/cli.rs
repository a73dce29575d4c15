use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use crate::config::{credentials, SiteConfig, DEFAULT_CONFIG_FILE};
#[cfg(feature = "cli")]
use crate::utils::error::SiteError;
#[cfg(feature = "cli")]
use crate::utils::{logger, validation::Validate};

/// 以站台根目錄為基準讀寫檔案
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }
}

/// 三個執行檔共用的參數
#[cfg(feature = "cli")]
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Site root directory (overrides [site].root)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Show what would change without writing anything
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[cfg(feature = "cli")]
impl GlobalArgs {
    pub fn init_logging(&self) {
        logger::init(self.verbose, self.json_logs);
    }

    /// 設定檔所在目錄，相對路徑且沒有上層時為目前目錄
    fn config_dir(&self) -> PathBuf {
        match self.config.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// 先讀 .env（--root 或設定檔所在目錄），再解析 TOML，
    /// `${VAR}` 才能取得 .env 裡的值。接著套用 --root 並驗證。
    pub fn load_config(&self) -> Result<SiteConfig> {
        let env_dir = self.root.clone().unwrap_or_else(|| self.config_dir());
        credentials::load_dotenv(&env_dir);

        let mut config = SiteConfig::load_or_default(&self.config)?;
        match &self.root {
            Some(root) => config = config.with_root(root.clone()),
            // 站台根目錄的 .env 只補上尚未設定的變數
            None if config.root() != env_dir.as_path() => credentials::load_dotenv(config.root()),
            None => {}
        }
        config.validate()?;

        tracing::debug!("Site root: {}", config.root().display());
        Ok(config)
    }
}

/// 記錄錯誤並依嚴重程度結束程式
#[cfg(feature = "cli")]
pub fn exit_with(e: &SiteError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
    std::process::exit(e.exit_code())
}
