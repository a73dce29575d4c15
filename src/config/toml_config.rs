use crate::utils::error::{Result, SiteError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub sections: SectionsConfig,
    pub analytics: AnalyticsConfig,
    pub dns: DnsConfig,
    pub geocoding: GeocodingConfig,
    pub feed: FeedConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub root: PathBuf,
    pub base_url: String,
    pub brand: String,
    /// 以目錄名稱比對，不論深度
    pub exclude_dirs: Vec<String>,
    /// 以站台相對路徑前綴比對
    pub exclude_paths: Vec<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            base_url: "https://www.agroverse.shop".to_string(),
            brand: "Agroverse".to_string(),
            exclude_dirs: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "__pycache__".to_string(),
                "scripts".to_string(),
            ],
            exclude_paths: vec!["assets/raw".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionsConfig {
    pub posts: String,
    pub farms: String,
    pub shipments: String,
    pub partners: String,
    pub blog: String,
}

impl Default for SectionsConfig {
    fn default() -> Self {
        Self {
            posts: "post".to_string(),
            farms: "farms".to_string(),
            shipments: "shipments".to_string(),
            partners: "partners".to_string(),
            blog: "blog".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub measurement_id: String,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            measurement_id: "G-S6EP25EHF4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub domain: String,
    pub records_csv: PathBuf,
    pub default_ttl: u32,
    pub namecheap_endpoint: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            domain: "agroverse.shop".to_string(),
            records_csv: PathBuf::from("assets/raw/agroverse_wix_domains_parsed.csv"),
            default_ttl: 3600,
            namecheap_endpoint: "https://api.namecheap.com/xml.response".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub request_delay_ms: u64,
    pub user_agent: String,
    pub google_base_url: String,
    pub nominatim_base_url: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 500,
            user_agent: "Agroverse Partner Address Finder".to_string(),
            google_base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub products_js: PathBuf,
    pub output: PathBuf,
    pub google_product_category: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            products_js: PathBuf::from("js/products.js"),
            output: PathBuf::from("facebook_product_feed.xml"),
            google_product_category: "357".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Wix 匯出的活動頁面
    pub raw_dir: PathBuf,
    pub output_dir: String,
    /// 要產生的活動 slug；空白時每個匯出檔各產生一頁
    pub slugs: Vec<String>,
    /// 頁面裡找不到報名連結時使用
    pub rsvp: BTreeMap<String, String>,
    pub default_image: String,
    pub contact_email: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        let rsvp = [
            (
                "cacao-circle-at-okanogan-fall-barter-faire-2025",
                "https://lu.ma/32vl9dbd",
            ),
            (
                "cacao-circle-at-okanogan-family-faire-spring-barter-faire-2025",
                "https://www.eventbrite.com/e/northwest-nomads-2024-tickets-858149928537",
            ),
            (
                "cacao-circle-at-create-the-future-summit-2025",
                "https://lu.ma/createthefuture",
            ),
        ]
        .into_iter()
        .map(|(slug, url)| (slug.to_string(), url.to_string()))
        .collect();

        Self {
            raw_dir: PathBuf::from("assets/raw/gatherings"),
            output_dir: "event-details-registration".to_string(),
            slugs: Vec::new(),
            rsvp,
            default_image: "https://www.agroverse.shop/assets/images/hero/cacao-circles.jpg"
                .to_string(),
            contact_email: "community@agroverse.shop".to_string(),
        }
    }
}

impl SiteConfig {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SiteError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 檔案不存在時使用預設值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::debug!("Loading configuration from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("No {} found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content)?;

        toml::from_str(&processed).map_err(|e| SiteError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換 ${VAR} 形式的環境變數，找不到時保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn root(&self) -> &Path {
        &self.site.root
    }

    pub fn base_url(&self) -> &str {
        self.site.base_url.trim_end_matches('/')
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.site.root = root.into();
        self
    }

    /// 站台根目錄下的路徑
    pub fn site_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.site.root.join(relative)
    }

    pub fn blog_index(&self) -> PathBuf {
        Path::new(&self.sections.blog).join("index.html")
    }
}

impl Validate for SiteConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_no_placeholders(&serde_json::to_value(self)?)?;
        validation::validate_url("site.base_url", &self.site.base_url)?;
        validation::validate_non_empty_string("site.brand", &self.site.brand)?;
        validation::validate_path("site.root", &self.site.root.to_string_lossy())?;
        validation::validate_measurement_id(
            "analytics.measurement_id",
            &self.analytics.measurement_id,
        )?;
        validation::validate_domain("dns.domain", &self.dns.domain)?;
        validation::validate_range("dns.default_ttl", self.dns.default_ttl, 60, 172_800)?;
        validation::validate_url("dns.namecheap_endpoint", &self.dns.namecheap_endpoint)?;
        validation::validate_range(
            "geocoding.request_delay_ms",
            self.geocoding.request_delay_ms,
            0,
            60_000,
        )?;
        validation::validate_url("geocoding.google_base_url", &self.geocoding.google_base_url)?;
        validation::validate_url(
            "geocoding.nominatim_base_url",
            &self.geocoding.nominatim_base_url,
        )?;

        validation::validate_url("events.default_image", &self.events.default_image)?;
        validation::validate_non_empty_string("events.contact_email", &self.events.contact_email)?;
        for (slug, url) in &self.events.rsvp {
            validation::validate_url(&format!("events.rsvp.{}", slug), url)?;
        }

        for (field, value) in [
            ("events.output_dir", &self.events.output_dir),
            ("sections.posts", &self.sections.posts),
            ("sections.farms", &self.sections.farms),
            ("sections.shipments", &self.sections.shipments),
            ("sections.partners", &self.sections.partners),
            ("sections.blog", &self.sections.blog),
        ] {
            validation::validate_path(field, value)?;
        }

        Ok(())
    }
}
