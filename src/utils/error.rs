use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("HTML patch failed for {path}: {message}")]
    HtmlError { path: String, message: String },

    #[error("Feed parsing error: {message}")]
    FeedError { message: String },

    #[error("{provider} error: {message}")]
    DnsProviderError { provider: String, message: String },

    #[error("No hosted zone found for {domain}")]
    ZoneNotFoundError { domain: String },

    #[error("Geocoding returned {status}: {message}")]
    GeocodeError { status: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Operation cancelled by user")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    FileSystem,
    Provider,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl SiteError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SiteError::HttpError(_) => ErrorCategory::Network,
            SiteError::IoError(_) => ErrorCategory::FileSystem,
            SiteError::CsvError(_)
            | SiteError::SerializationError(_)
            | SiteError::HtmlError { .. }
            | SiteError::FeedError { .. }
            | SiteError::ProcessingError { .. } => ErrorCategory::Data,
            SiteError::PatternError(_)
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::MissingConfigError { .. }
            | SiteError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            SiteError::DnsProviderError { .. }
            | SiteError::ZoneNotFoundError { .. }
            | SiteError::GeocodeError { .. } => ErrorCategory::Provider,
            SiteError::Cancelled => ErrorCategory::User,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SiteError::Cancelled => ErrorSeverity::Low,
            SiteError::HttpError(_) | SiteError::GeocodeError { .. } => ErrorSeverity::Medium,
            SiteError::HtmlError { .. }
            | SiteError::FeedError { .. }
            | SiteError::CsvError(_)
            | SiteError::SerializationError(_)
            | SiteError::ProcessingError { .. }
            | SiteError::DnsProviderError { .. }
            | SiteError::ZoneNotFoundError { .. } => ErrorSeverity::High,
            SiteError::IoError(_)
            | SiteError::PatternError(_)
            | SiteError::InvalidConfigValueError { .. }
            | SiteError::MissingConfigError { .. }
            | SiteError::ConfigValidationError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SiteError::HttpError(_) => {
                "Check network connectivity and API rate limits, then run again".to_string()
            }
            SiteError::IoError(_) => {
                "Check that the site root exists and the files are writable".to_string()
            }
            SiteError::CsvError(_) => {
                "Make sure the CSV has a 'hostname,value,ttl' header".to_string()
            }
            SiteError::SerializationError(_) => "Check the JSON input file format".to_string(),
            SiteError::PatternError(_) => "Report this as a bug".to_string(),
            SiteError::InvalidConfigValueError { field, .. }
            | SiteError::ConfigValidationError { field, .. } => {
                format!("Fix '{}' in site-maint.toml", field)
            }
            SiteError::MissingConfigError { field } => {
                format!("Add {} to your .env file or export it", field)
            }
            SiteError::HtmlError { path, .. } => format!("Inspect {} by hand", path),
            SiteError::FeedError { .. } => {
                "Make sure products.js still defines window.PRODUCTS = { ... };".to_string()
            }
            SiteError::DnsProviderError { provider, .. } => {
                format!("Check {} credentials and API access (IP whitelist)", provider)
            }
            SiteError::ZoneNotFoundError { domain } => format!(
                "Create a hosted zone first: aws route53 create-hosted-zone --name {} --caller-reference $(date +%s)",
                domain
            ),
            SiteError::GeocodeError { .. } => {
                "Verify the Google API key and that the Places API is enabled".to_string()
            }
            SiteError::ProcessingError { .. } => "Check the input data".to_string(),
            SiteError::Cancelled => "Nothing was changed".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SiteError::MissingConfigError { field } => {
                format!("Missing credentials: {} is not set", field)
            }
            SiteError::ZoneNotFoundError { domain } => {
                format!("No Route53 hosted zone exists for {}", domain)
            }
            SiteError::Cancelled => "Cancelled.".to_string(),
            other => other.to_string(),
        }
    }

    /// 依嚴重程度決定結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn html(path: impl Into<String>, message: impl Into<String>) -> Self {
        SiteError::HtmlError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        SiteError::DnsProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SiteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_severity() {
        assert_eq!(SiteError::Cancelled.exit_code(), 0);
        assert_eq!(
            SiteError::MissingConfigError {
                field: "NAMECHEAP_API_KEY".to_string()
            }
            .exit_code(),
            3
        );
        assert_eq!(
            SiteError::ZoneNotFoundError {
                domain: "agroverse.shop".to_string()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_zone_not_found_suggests_create_command() {
        let err = SiteError::ZoneNotFoundError {
            domain: "agroverse.shop".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Provider);
        assert!(err
            .recovery_suggestion()
            .contains("create-hosted-zone --name agroverse.shop"));
    }
}
