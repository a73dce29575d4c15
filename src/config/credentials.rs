//! API 憑證只從環境變數或 .env 讀取，不寫進 site-maint.toml

use crate::utils::error::Result;
use crate::utils::validation::validate_required_env;
use std::env;
use std::path::Path;

/// 載入指定目錄下的 .env，已存在的環境變數不會被覆蓋
pub fn load_dotenv(root: &Path) {
    let path = root.join(".env");
    match dotenvy::from_path(&path) {
        Ok(()) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("⚠️ Could not read {}: {}", path.display(), e),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct NamecheapCredentials {
    pub api_user: String,
    pub api_key: String,
    pub client_ip: String,
}

impl NamecheapCredentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_user: validate_required_env("NAMECHEAP_API_USER", non_empty_var("NAMECHEAP_API_USER"))?,
            api_key: validate_required_env("NAMECHEAP_API_KEY", non_empty_var("NAMECHEAP_API_KEY"))?,
            client_ip: validate_required_env(
                "NAMECHEAP_CLIENT_IP",
                non_empty_var("NAMECHEAP_CLIENT_IP"),
            )?,
        })
    }
}

impl std::fmt::Debug for NamecheapCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamecheapCredentials")
            .field("api_user", &self.api_user)
            .field("api_key", &mask(&self.api_key))
            .field("client_ip", &self.client_ip)
            .finish()
    }
}

pub fn google_api_key() -> Option<String> {
    ["GOOGLE_PLACES_API_KEY", "GOOGLE_MAPS_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .find_map(|name| non_empty_var(name))
}

pub fn require_google_api_key() -> Result<String> {
    validate_required_env("GOOGLE_PLACES_API_KEY", google_api_key())
}

pub fn aws_region() -> String {
    non_empty_var("AWS_DEFAULT_REGION")
        .or_else(|| non_empty_var("AWS_REGION"))
        .unwrap_or_else(|| "us-east-1".to_string())
}

pub fn aws_static_credentials_present() -> bool {
    non_empty_var("AWS_ACCESS_KEY_ID").is_some() && non_empty_var("AWS_SECRET_ACCESS_KEY").is_some()
}

/// 只顯示前幾個字元
pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(6).collect();
    format!("{}...", visible)
}
