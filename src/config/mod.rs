pub mod cli;
pub mod credentials;
pub mod toml_config;

pub use cli::LocalStorage;
#[cfg(feature = "cli")]
pub use cli::{exit_with, GlobalArgs};
pub use toml_config::SiteConfig;

/// 預設設定檔名稱
pub const DEFAULT_CONFIG_FILE: &str = "site-maint.toml";
