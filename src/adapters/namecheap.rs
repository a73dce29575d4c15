//! Namecheap XML API。回應只需要少數屬性，以 regex 擷取。

use crate::config::credentials::NamecheapCredentials;
use crate::core::dns::{split_domain, NamecheapHost};
use crate::core::html::attr;
use crate::utils::error::{Result, SiteError};
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;

pub const DEFAULT_ENDPOINT: &str = "https://api.namecheap.com/xml.response";
const PROVIDER: &str = "Namecheap";
const PAGE_SIZE: u32 = 100;

static HOST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<host\s[^>]*>").expect("host element pattern"));
static DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Domain\s[^>]*>").expect("domain element pattern"));
static PAGING_TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<TotalItems>\s*(\d+)\s*</TotalItems>").expect("paging pattern")
});
static ERROR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<Error(?:\s[^>]*)?>(.*?)</Error>").expect("error element pattern"));
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<ApiResponse[^>]*Status="([A-Za-z]+)""#).expect("status pattern"));

/// getHosts 回傳的一筆紀錄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostRecord {
    pub name: String,
    pub record_type: String,
    pub address: String,
    pub ttl: String,
    pub mx_pref: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainInfo {
    pub name: String,
    pub expires: String,
    pub is_expired: bool,
}

fn check_status(body: &str) -> Result<()> {
    let failed = STATUS_RE
        .captures(body)
        .is_some_and(|c| c[1].eq_ignore_ascii_case("ERROR"));
    if !failed {
        return Ok(());
    }
    let messages: Vec<String> = ERROR_RE
        .captures_iter(body)
        .map(|c| c[1].trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    Err(SiteError::provider(
        PROVIDER,
        if messages.is_empty() {
            "API returned Status=\"ERROR\"".to_string()
        } else {
            messages.join("; ")
        },
    ))
}

fn parse_hosts(body: &str) -> Vec<HostRecord> {
    HOST_RE
        .find_iter(body)
        .map(|m| {
            let tag = m.as_str();
            let get = |name: &str| attr(tag, name).unwrap_or_default();
            HostRecord {
                name: get("Name"),
                record_type: get("Type"),
                address: get("Address"),
                ttl: get("TTL"),
                mx_pref: get("MXPref"),
            }
        })
        .collect()
}

fn parse_domains(body: &str) -> Vec<DomainInfo> {
    DOMAIN_RE
        .find_iter(body)
        .map(|m| {
            let tag = m.as_str();
            DomainInfo {
                name: attr(tag, "Name").unwrap_or_default(),
                expires: attr(tag, "Expires").unwrap_or_default(),
                is_expired: attr(tag, "IsExpired").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            }
        })
        .collect()
}

/// 依 setHosts 格式展開成 HostNameN/RecordTypeN/... 參數
pub fn set_hosts_params(hosts: &[NamecheapHost]) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(hosts.len() * 5);
    for (i, host) in hosts.iter().enumerate() {
        let n = i + 1;
        params.push((format!("HostName{}", n), host.host_name.clone()));
        params.push((format!("RecordType{}", n), host.record_type.as_str().to_string()));
        params.push((format!("Address{}", n), host.address.clone()));
        params.push((format!("TTL{}", n), host.ttl.to_string()));
        if let Some(pref) = host.mx_pref {
            params.push((format!("MXPref{}", n), pref.to_string()));
        }
    }
    params
}

pub struct NamecheapClient {
    client: Client,
    endpoint: String,
    credentials: NamecheapCredentials,
}

impl NamecheapClient {
    pub fn new(credentials: NamecheapCredentials) -> Self {
        Self::with_endpoint(credentials, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(credentials: NamecheapCredentials, endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            credentials,
        }
    }

    fn base_params(&self, command: &str) -> Vec<(String, String)> {
        vec![
            ("ApiUser".to_string(), self.credentials.api_user.clone()),
            ("ApiKey".to_string(), self.credentials.api_key.clone()),
            ("UserName".to_string(), self.credentials.api_user.clone()),
            ("ClientIp".to_string(), self.credentials.client_ip.clone()),
            ("Command".to_string(), command.to_string()),
        ]
    }

    fn domain_params(&self, command: &str, domain: &str) -> Result<Vec<(String, String)>> {
        let (sld, tld) = split_domain(domain)?;
        let mut params = self.base_params(command);
        params.push(("SLD".to_string(), sld.to_string()));
        params.push(("TLD".to_string(), tld.to_string()));
        Ok(params)
    }

    async fn get(&self, params: &[(String, String)]) -> Result<String> {
        let body = self
            .client
            .get(&self.endpoint)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        check_status(&body)?;
        Ok(body)
    }

    pub async fn get_hosts(&self, domain: &str) -> Result<Vec<HostRecord>> {
        let params = self.domain_params("namecheap.domains.dns.getHosts", domain)?;
        let body = self.get(&params).await?;
        let hosts = parse_hosts(&body);
        tracing::debug!("Namecheap returned {} host(s) for {}", hosts.len(), domain);
        Ok(hosts)
    }

    /// 一次送出全部紀錄，Namecheap 會以此取代整個網域的設定
    pub async fn set_hosts(&self, domain: &str, hosts: &[NamecheapHost]) -> Result<()> {
        let mut params = self.domain_params("namecheap.domains.dns.setHosts", domain)?;
        params.extend(set_hosts_params(hosts));

        let body = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        check_status(&body)?;
        tracing::info!("✅ Namecheap accepted {} record(s) for {}", hosts.len(), domain);
        Ok(())
    }

    pub async fn list_domains(&self) -> Result<Vec<DomainInfo>> {
        let mut domains = Vec::new();
        let mut page = 1u32;
        loop {
            let mut params = self.base_params("namecheap.domains.getList");
            params.push(("PageSize".to_string(), PAGE_SIZE.to_string()));
            params.push(("Page".to_string(), page.to_string()));

            let body = self.get(&params).await?;
            let batch = parse_domains(&body);
            if batch.is_empty() {
                break;
            }
            domains.extend(batch);

            let total = PAGING_TOTAL_RE
                .captures(&body)
                .and_then(|c| c[1].parse::<usize>().ok())
                .unwrap_or(domains.len());
            if domains.len() >= total {
                break;
            }
            page += 1;
        }
        Ok(domains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RecordType;
    use httpmock::prelude::*;

    fn credentials() -> NamecheapCredentials {
        NamecheapCredentials {
            api_user: "gary".to_string(),
            api_key: "secret".to_string(),
            client_ip: "203.0.113.7".to_string(),
        }
    }

    const HOSTS_OK: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ApiResponse Status="OK" xmlns="http://api.namecheap.com/xml.response">
  <CommandResponse Type="namecheap.domains.dns.getHosts">
    <DomainDNSGetHostsResult Domain="agroverse.shop" IsUsingOurDNS="true">
      <host HostId="1" Name="@" Type="A" Address="192.0.2.1" MXPref="10" TTL="1800" />
      <host HostId="2" Name="www" Type="CNAME" Address="cdn.example.net." MXPref="10" TTL="3600" />
    </DomainDNSGetHostsResult>
  </CommandResponse>
</ApiResponse>"#;

    #[tokio::test]
    async fn test_get_hosts_parses_attributes() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/xml.response")
                .query_param("Command", "namecheap.domains.dns.getHosts")
                .query_param("SLD", "agroverse")
                .query_param("TLD", "shop")
                .query_param("ApiUser", "gary");
            then.status(200).body(HOSTS_OK);
        });

        let client = NamecheapClient::with_endpoint(credentials(), server.url("/xml.response"));
        let hosts = client.get_hosts("agroverse.shop").await.unwrap();

        mock.assert();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].name, "@");
        assert_eq!(hosts[0].ttl, "1800");
        assert_eq!(hosts[1].record_type, "CNAME");
        assert_eq!(hosts[1].address, "cdn.example.net.");
    }

    #[tokio::test]
    async fn test_error_status_becomes_provider_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/xml.response");
            then.status(200).body(
                r#"<ApiResponse Status="ERROR"><Errors><Error Number="1011150">Parameter RequestIP is invalid</Error></Errors></ApiResponse>"#,
            );
        });

        let client = NamecheapClient::with_endpoint(credentials(), server.url("/xml.response"));
        match client.list_domains().await {
            Err(SiteError::DnsProviderError { provider, message }) => {
                assert_eq!(provider, "Namecheap");
                assert_eq!(message, "Parameter RequestIP is invalid");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_domains() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).query_param("Command", "namecheap.domains.getList");
            then.status(200).body(
                r#"<ApiResponse Status="OK"><CommandResponse><DomainGetListResult>
<Domain ID="1" Name="agroverse.shop" Expires="03/01/2027" IsExpired="false" />
<Domain ID="2" Name="old.shop" Expires="01/01/2020" IsExpired="true" />
</DomainGetListResult><Paging><TotalItems>2</TotalItems><CurrentPage>1</CurrentPage></Paging></CommandResponse></ApiResponse>"#,
            );
        });

        let client = NamecheapClient::with_endpoint(credentials(), server.base_url());
        let domains = client.list_domains().await.unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[0].name, "agroverse.shop");
        assert!(!domains[0].is_expired);
        assert!(domains[1].is_expired);
    }

    #[test]
    fn test_set_hosts_params_numbering() {
        let hosts = vec![
            NamecheapHost {
                host_name: "@".to_string(),
                record_type: RecordType::Mx,
                address: "aspmx.l.google.com".to_string(),
                ttl: 3600,
                mx_pref: Some(10),
            },
            NamecheapHost {
                host_name: "www".to_string(),
                record_type: RecordType::Cname,
                address: "shops.myshopify.com".to_string(),
                ttl: 3600,
                mx_pref: None,
            },
        ];
        let params = set_hosts_params(&hosts);
        let has = |k: &str, v: &str| params.iter().any(|(pk, pv)| pk == k && pv == v);

        assert!(has("HostName1", "@"));
        assert!(has("RecordType1", "MX"));
        assert!(has("MXPref1", "10"));
        assert!(has("RecordType2", "CNAME"));
        assert!(has("TTL2", "3600"));
        assert!(!params.iter().any(|(k, _)| k == "MXPref2"));
    }

    #[tokio::test]
    async fn test_set_hosts_posts_form() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/xml.response")
                .x_www_form_urlencoded_tuple("Command", "namecheap.domains.dns.setHosts")
                .x_www_form_urlencoded_tuple("HostName1", "www");
            then.status(200)
                .body(r#"<ApiResponse Status="OK"><DomainDNSSetHostsResult IsSuccess="true" /></ApiResponse>"#);
        });

        let client = NamecheapClient::with_endpoint(credentials(), server.url("/xml.response"));
        let hosts = vec![NamecheapHost {
            host_name: "www".to_string(),
            record_type: RecordType::Cname,
            address: "shops.myshopify.com".to_string(),
            ttl: 3600,
            mx_pref: None,
        }];
        client.set_hosts("agroverse.shop", &hosts).await.unwrap();
        mock.assert();
    }
}
