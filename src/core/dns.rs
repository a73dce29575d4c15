//! DNS 紀錄的推斷、轉換與搬遷計畫

use crate::domain::model::{DnsRecord, RecordType};
use crate::utils::error::{Result, SiteError};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("digits pattern"));

const HOSTNAME_KEYS: &[&str] = &["hostname", "host", "name", "record"];
const VALUE_KEYS: &[&str] = &["value", "data", "target", "content"];
const TTL_KEYS: &[&str] = &["ttl", "TTL", "ttl_seconds"];

fn is_ipv4(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()) && p.parse::<u8>().is_ok())
}

/// 依值的內容推斷紀錄型別，規則依序套用，都不符合時為 A
pub fn determine_record_type(_hostname: &str, value: &str) -> RecordType {
    let lower = value.to_lowercase();

    if lower.contains("aspmx") || (lower.contains("mail") && lower.contains("google")) {
        return RecordType::Mx;
    }

    if value.starts_with("v=")
        || value.contains("include:")
        || lower.contains("_dmarc")
        || lower.contains("google-site-verification")
    {
        return RecordType::Txt;
    }

    if lower.contains("ns")
        && (lower.contains("wixdns") || lower.contains(".net") || lower.contains(".com"))
    {
        return RecordType::Ns;
    }

    let all_numeric = value
        .split('.')
        .filter(|p| !p.is_empty())
        .all(|p| p.chars().all(|c| c.is_ascii_digit()));
    if !is_ipv4(value) && value.contains('.') && !all_numeric {
        return RecordType::Cname;
    }

    RecordType::A
}

/// "1 Hour" / "2 days" / "30 minutes" / "3600" 轉成秒數
pub fn convert_ttl_to_seconds(text: &str) -> Option<u32> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let multiplier = if text.contains("hour") {
        3600
    } else if text.contains("day") {
        86400
    } else if text.contains("minute") {
        60
    } else if text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok();
    } else {
        return None;
    };

    let amount: u32 = DIGITS_RE.captures(&text)?[1].parse().ok()?;
    amount.checked_mul(multiplier)
}

/// 依 (hostname, value) 去重，不分大小寫，保留第一筆
pub fn dedupe(records: Vec<DnsRecord>) -> Vec<DnsRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert((r.hostname.to_lowercase(), r.value.to_lowercase())))
        .collect()
}

fn first_string(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn json_ttl(map: &serde_json::Map<String, Value>) -> Option<u32> {
    TTL_KEYS.iter().find_map(|key| match map.get(*key) {
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => convert_ttl_to_seconds(s),
        _ => None,
    })
}

fn collect_records(value: &Value, out: &mut Vec<DnsRecord>) {
    match value {
        Value::Object(map) => {
            if HOSTNAME_KEYS.iter().any(|k| map.contains_key(*k)) {
                let hostname = first_string(map, HOSTNAME_KEYS).unwrap_or_default();
                let record_value = first_string(map, VALUE_KEYS).unwrap_or_default();
                if !hostname.is_empty() || !record_value.is_empty() {
                    out.push(DnsRecord::new(hostname, record_value, json_ttl(map)));
                }
            }
            for child in map.values() {
                collect_records(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_records(item, out);
            }
        }
        _ => {}
    }
}

/// 在任意結構的 JSON 中尋找看起來像 DNS 紀錄的物件
pub fn records_from_json(value: &Value) -> Vec<DnsRecord> {
    let mut records = Vec::new();
    collect_records(value, &mut records);
    records
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    ttl: Option<String>,
}

/// 讀取 hostname,value,ttl CSV；缺 hostname 或 value 的列略過
pub fn read_records_csv(path: &Path, default_ttl: u32) -> Result<Vec<DnsRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        if row.hostname.trim().is_empty() || row.value.trim().is_empty() {
            tracing::debug!("Skipping incomplete CSV row {}", index + 2);
            continue;
        }
        let ttl = row
            .ttl
            .as_deref()
            .and_then(convert_ttl_to_seconds)
            .unwrap_or(default_ttl);
        records.push(DnsRecord::new(row.hostname.trim(), row.value.trim(), Some(ttl)));
    }

    Ok(records)
}

pub fn write_records_csv(path: &Path, records: &[DnsRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["hostname", "value", "ttl"])?;
    for record in records {
        let ttl = record.ttl.map(|t| t.to_string()).unwrap_or_default();
        writer.write_record([record.hostname.as_str(), record.value.as_str(), ttl.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Route53 的一組紀錄（同名同型別）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: RecordType,
    pub ttl: u32,
    pub values: Vec<String>,
}

impl RecordSet {
    /// 名稱去掉結尾的點
    pub fn display_name(&self) -> &str {
        self.name.trim_end_matches('.')
    }

    /// 第一個值，多值時加上 "(+N more)"
    pub fn value_summary(&self) -> String {
        let first = self.values.first().cloned().unwrap_or_default();
        if self.values.len() > 1 {
            format!("{} (+{} more)", first, self.values.len() - 1)
        } else {
            first
        }
    }
}

/// alt 伺服器先比對，否則 alt1.aspmx.l... 也會被當成主伺服器
fn mx_priority(value: &str) -> u32 {
    if value.contains("alt1") {
        20
    } else if value.contains("alt2") {
        30
    } else if value.contains("alt3") {
        40
    } else if value.contains("alt4") {
        50
    } else {
        10
    }
}

fn route53_value(record_type: RecordType, value: &str) -> String {
    match record_type {
        RecordType::Mx => {
            let has_priority = value
                .split_whitespace()
                .next()
                .is_some_and(|first| first.chars().all(|c| c.is_ascii_digit()));
            if has_priority {
                value.to_string()
            } else {
                format!("{} {}", mx_priority(value), value)
            }
        }
        RecordType::Txt => {
            if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
                value.to_string()
            } else {
                format!("\"{}\"", value)
            }
        }
        _ => value.to_string(),
    }
}

/// 轉成 Route53 的紀錄組；NS 由 Route53 自行管理故略過
pub fn plan_route53(records: &[DnsRecord], default_ttl: u32) -> Vec<RecordSet> {
    let mut grouped: BTreeMap<(String, RecordType), RecordSet> = BTreeMap::new();

    for record in records {
        let record_type = determine_record_type(&record.hostname, &record.value);
        if record_type == RecordType::Ns {
            continue;
        }

        let name = format!("{}.", record.hostname.trim_end_matches('.'));
        let value = route53_value(record_type, &record.value);
        let ttl = record.ttl.unwrap_or(default_ttl);

        grouped
            .entry((name.clone(), record_type))
            .or_insert_with(|| RecordSet {
                name,
                record_type,
                ttl,
                values: Vec::new(),
            })
            .values
            .push(value);
    }

    grouped.into_values().collect()
}

/// Namecheap setHosts 的一筆
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamecheapHost {
    pub host_name: String,
    pub record_type: RecordType,
    pub address: String,
    pub ttl: u32,
    pub mx_pref: Option<u32>,
}

fn namecheap_host_name(hostname: &str, domain: &str) -> String {
    if hostname.eq_ignore_ascii_case(domain) {
        return "@".to_string();
    }
    let suffix = format!(".{}", domain);
    if hostname.len() > suffix.len() && hostname.to_lowercase().ends_with(&suffix.to_lowercase()) {
        return hostname[..hostname.len() - suffix.len()].to_string();
    }
    hostname.to_string()
}

pub fn plan_namecheap(records: &[DnsRecord], domain: &str, default_ttl: u32) -> Vec<NamecheapHost> {
    records
        .iter()
        .map(|record| {
            let record_type = determine_record_type(&record.hostname, &record.value);
            NamecheapHost {
                host_name: namecheap_host_name(&record.hostname, domain),
                record_type,
                address: record.value.clone(),
                ttl: record.ttl.unwrap_or(default_ttl),
                mx_pref: (record_type == RecordType::Mx).then_some(10),
            }
        })
        .collect()
}

/// 將網域拆成 SLD / TLD，以第一個點為界
pub fn split_domain(domain: &str) -> Result<(&str, &str)> {
    match domain.split_once('.') {
        Some((sld, tld)) if !sld.is_empty() && !tld.is_empty() => Ok((sld, tld)),
        _ => Err(SiteError::InvalidConfigValueError {
            field: "dns.domain".to_string(),
            value: domain.to_string(),
            reason: "Domain must look like <name>.<tld>".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_mx_priority_for_google_servers() {
        assert_eq!(mx_priority("aspmx.l.google.com"), 10);
        assert_eq!(mx_priority("alt1.aspmx.l.google.com"), 20);
        assert_eq!(mx_priority("alt2.aspmx.l.google.com"), 30);
        assert_eq!(mx_priority("alt3.aspmx.l.google.com"), 40);
        assert_eq!(mx_priority("alt4.aspmx.l.google.com"), 50);
        assert_eq!(mx_priority("mx.zoho.com"), 10);
    }

    #[test]
    fn test_determine_record_type() {
        assert_eq!(determine_record_type("foo.agroverse.shop", "192.0.2.1"), RecordType::A);
        assert_eq!(
            determine_record_type("agroverse.shop", "v=spf1 include:_spf.google.com ~all"),
            RecordType::Txt
        );
        assert_eq!(determine_record_type("agroverse.shop", "aspmx.l.google.com"), RecordType::Mx);
        assert_eq!(
            determine_record_type("agroverse.shop", "ns8.wixdns.net"),
            RecordType::Ns
        );
        assert_eq!(
            determine_record_type("www.agroverse.shop", "cdn1.wixdns.net"),
            RecordType::Ns
        );
        assert_eq!(
            determine_record_type("shop.agroverse.shop", "shops.myshopify.com"),
            RecordType::Cname
        );
        assert_eq!(
            determine_record_type("www.agroverse.shop", "pages.github.io"),
            RecordType::Cname
        );
        assert_eq!(determine_record_type("x", "300.1.1.1"), RecordType::A);
        assert_eq!(determine_record_type("x", "localhost"), RecordType::A);
    }

    #[test]
    fn test_convert_ttl_to_seconds() {
        assert_eq!(convert_ttl_to_seconds("1 Hour"), Some(3600));
        assert_eq!(convert_ttl_to_seconds("1 Day"), Some(86400));
        assert_eq!(convert_ttl_to_seconds("30 minutes"), Some(1800));
        assert_eq!(convert_ttl_to_seconds(" 300 "), Some(300));
        assert_eq!(convert_ttl_to_seconds("Hour"), None);
        assert_eq!(convert_ttl_to_seconds("forever"), None);
        assert_eq!(convert_ttl_to_seconds(""), None);
    }

    #[test]
    fn test_dedupe_ignores_case() {
        let records = vec![
            DnsRecord::new("WWW.agroverse.shop", "Example.com", Some(3600)),
            DnsRecord::new("www.agroverse.shop", "example.com", Some(60)),
            DnsRecord::new("www.agroverse.shop", "other.com", None),
        ];
        let unique = dedupe(records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].ttl, Some(3600));
    }

    #[test]
    fn test_records_from_nested_json() {
        let data = json!({
            "zone": "agroverse.shop",
            "records": [
                {"host": "www.agroverse.shop", "data": "pages.github.io", "TTL": 300},
                {"name": "agroverse.shop", "content": "192.0.2.1", "ttl": "1 Hour"},
                {"meta": {"record": "", "target": "aspmx.l.google.com"}},
                {"hostname": "", "value": ""}
            ]
        });

        let records = records_from_json(&data);
        assert_eq!(
            records,
            vec![
                DnsRecord::new("www.agroverse.shop", "pages.github.io", Some(300)),
                DnsRecord::new("agroverse.shop", "192.0.2.1", Some(3600)),
                DnsRecord::new("", "aspmx.l.google.com", None),
            ]
        );
    }

    #[test]
    fn test_csv_roundtrip_applies_default_ttl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out/records.csv");
        write_records_csv(
            &path,
            &[
                DnsRecord::new("agroverse.shop", "192.0.2.1", None),
                DnsRecord::new("www.agroverse.shop", "", Some(60)),
            ],
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("hostname,value,ttl\n"));

        let records = read_records_csv(&path, 3600).unwrap();
        assert_eq!(records, vec![DnsRecord::new("agroverse.shop", "192.0.2.1", Some(3600))]);
    }

    #[test]
    fn test_plan_route53_groups_and_formats() {
        let records = vec![
            DnsRecord::new("agroverse.shop", "aspmx.l.google.com", Some(3600)),
            DnsRecord::new("agroverse.shop", "alt1.aspmx.l.google.com", Some(60)),
            DnsRecord::new("agroverse.shop", "5 alt2.aspmx.l.google.com", Some(60)),
            DnsRecord::new("agroverse.shop", "v=spf1 include:_spf.google.com ~all", None),
            DnsRecord::new("agroverse.shop", "ns6.wixdns.net", Some(3600)),
            DnsRecord::new("www.agroverse.shop.", "pages.github.io", Some(300)),
        ];

        let plan = plan_route53(&records, 3600);
        assert_eq!(plan.len(), 3);

        let mx = plan.iter().find(|s| s.record_type == RecordType::Mx).unwrap();
        assert_eq!(mx.name, "agroverse.shop.");
        assert_eq!(mx.ttl, 3600);
        assert_eq!(
            mx.values,
            vec![
                "10 aspmx.l.google.com",
                "20 alt1.aspmx.l.google.com",
                "5 alt2.aspmx.l.google.com"
            ]
        );
        assert_eq!(mx.value_summary(), "10 aspmx.l.google.com (+2 more)");

        let txt = plan.iter().find(|s| s.record_type == RecordType::Txt).unwrap();
        assert_eq!(txt.values, vec!["\"v=spf1 include:_spf.google.com ~all\""]);

        let cname = plan.iter().find(|s| s.record_type == RecordType::Cname).unwrap();
        assert_eq!(cname.display_name(), "www.agroverse.shop");
    }

    #[test]
    fn test_plan_namecheap_host_names() {
        let records = vec![
            DnsRecord::new("agroverse.shop", "aspmx.l.google.com", None),
            DnsRecord::new("www.agroverse.shop", "pages.github.io", Some(300)),
            DnsRecord::new("other.example", "192.0.2.1", Some(60)),
        ];
        let hosts = plan_namecheap(&records, "agroverse.shop", 1800);

        assert_eq!(hosts[0].host_name, "@");
        assert_eq!(hosts[0].mx_pref, Some(10));
        assert_eq!(hosts[0].ttl, 1800);
        assert_eq!(hosts[1].host_name, "www");
        assert_eq!(hosts[1].mx_pref, None);
        assert_eq!(hosts[2].host_name, "other.example");
    }

    #[test]
    fn test_split_domain() {
        assert_eq!(split_domain("agroverse.shop").unwrap(), ("agroverse", "shop"));
        assert_eq!(split_domain("example.co.uk").unwrap(), ("example", "co.uk"));
        assert!(split_domain("localhost").is_err());
    }
}
