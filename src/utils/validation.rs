use crate::utils::error::{Result, SiteError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(SiteError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 網域至少要有一個點，例如 agroverse.shop
pub fn validate_domain(field_name: &str, domain: &str) -> Result<()> {
    validate_non_empty_string(field_name, domain)?;
    let valid = domain.split('.').count() >= 2
        && domain
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    if !valid {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: domain.to_string(),
            reason: "Expected a domain name such as example.com".to_string(),
        });
    }
    Ok(())
}

/// GA4 評估 ID，例如 G-S6EP25EHF4
pub fn validate_measurement_id(field_name: &str, id: &str) -> Result<()> {
    let valid = id
        .strip_prefix("G-")
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    if !valid {
        return Err(SiteError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: id.to_string(),
            reason: "Expected a GA4 measurement ID such as G-S6EP25EHF4".to_string(),
        });
    }
    Ok(())
}

/// 找出仍是 ${VAR} 的字串值，回傳第一個欄位路徑與原值
pub fn find_unresolved_placeholder(prefix: &str, value: &serde_json::Value) -> Option<(String, String)> {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };
    match value {
        serde_json::Value::String(s) if s.contains("${") => Some((prefix.to_string(), s.clone())),
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .find_map(|(i, item)| find_unresolved_placeholder(&format!("{}[{}]", prefix, i), item)),
        serde_json::Value::Object(map) => map
            .iter()
            .find_map(|(key, item)| find_unresolved_placeholder(&join(key), item)),
        _ => None,
    }
}

pub fn validate_no_placeholders(value: &serde_json::Value) -> Result<()> {
    match find_unresolved_placeholder("", value) {
        Some((field, value)) => Err(SiteError::InvalidConfigValueError {
            field,
            value,
            reason: "Environment variable is not set (check .env or the shell environment)"
                .to_string(),
        }),
        None => Ok(()),
    }
}

pub fn validate_required_env(name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SiteError::MissingConfigError {
            field: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://www.agroverse.shop").is_ok());
        assert!(validate_url("base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "www.agroverse.shop").is_err());
        assert!(validate_url("base_url", "ftp://agroverse.shop").is_err());
    }

    #[test]
    fn test_validate_domain() {
        assert!(validate_domain("domain", "agroverse.shop").is_ok());
        assert!(validate_domain("domain", "example.co.uk").is_ok());
        assert!(validate_domain("domain", "localhost").is_err());
        assert!(validate_domain("domain", "bad..domain").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("request_delay_ms", 500u64, 0, 60_000).is_ok());
        assert!(validate_range("request_delay_ms", 90_000u64, 0, 60_000).is_err());
    }

    #[test]
    fn test_validate_measurement_id() {
        assert!(validate_measurement_id("analytics.measurement_id", "G-S6EP25EHF4").is_ok());
        assert!(validate_measurement_id("analytics.measurement_id", "G-").is_err());
        assert!(validate_measurement_id("analytics.measurement_id", "UA-12345-1").is_err());
        assert!(validate_measurement_id("analytics.measurement_id", "g-abc123").is_err());
        assert!(validate_measurement_id("analytics.measurement_id", "${GA_ID}").is_err());
    }

    #[test]
    fn test_find_unresolved_placeholder_reports_field_path() {
        let value = serde_json::json!({
            "site": {"base_url": "https://www.agroverse.shop", "exclude_dirs": ["scripts", "${EXTRA}"]},
            "dns": {"default_ttl": 3600}
        });
        assert_eq!(
            find_unresolved_placeholder("", &value),
            Some(("site.exclude_dirs[1]".to_string(), "${EXTRA}".to_string()))
        );
        assert!(validate_no_placeholders(&value).is_err());
        assert!(validate_no_placeholders(&serde_json::json!({"a": "$HOME"})).is_ok());
    }

    #[test]
    fn test_validate_required_env() {
        assert_eq!(
            validate_required_env("NAMECHEAP_API_USER", Some("gary".to_string())).unwrap(),
            "gary"
        );
        assert!(validate_required_env("NAMECHEAP_API_USER", Some("  ".to_string())).is_err());
        assert!(validate_required_env("NAMECHEAP_API_USER", None).is_err());
    }
}
