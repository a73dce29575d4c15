use crate::config::credentials;
use crate::core::dns::RecordSet;
use crate::utils::error::{Result, SiteError};
use aws_config::BehaviorVersion;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client;

const PROVIDER: &str = "Route53";
const RECORD_PREVIEW: usize = 20;

fn aws_error(e: impl std::error::Error) -> SiteError {
    SiteError::provider(PROVIDER, DisplayErrorContext(e).to_string())
}

fn strip_zone_prefix(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

#[derive(Debug, Clone)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    pub record_count: i64,
    pub private: bool,
    pub name_servers: Vec<String>,
    pub records: Vec<RecordSummary>,
    pub total_records: usize,
}

#[derive(Debug, Clone)]
pub struct RecordSummary {
    pub name: String,
    pub record_type: String,
    pub values: String,
    pub ttl: String,
}

impl RecordSummary {
    /// 最多兩個值，其餘以 "(+N more)" 表示
    fn from_set(set: &ResourceRecordSet) -> Self {
        let mut values: Vec<String> = set
            .resource_records()
            .iter()
            .map(|r| r.value().to_string())
            .collect();
        if values.is_empty() {
            if let Some(alias) = set.alias_target() {
                values.push(alias.dns_name().to_string());
            }
        }

        let mut shown = values.iter().take(2).cloned().collect::<Vec<_>>().join(", ");
        if values.len() > 2 {
            shown.push_str(&format!(" (+{} more)", values.len() - 2));
        }

        Self {
            name: set.name().trim_end_matches('.').to_string(),
            record_type: set.r#type().as_str().to_string(),
            values: shown,
            ttl: set
                .ttl()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// UPSERT 結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Route53Client {
    client: Client,
}

impl Route53Client {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 依環境變數或 AWS CLI 設定建立 client
    pub async fn from_env() -> Self {
        let region = credentials::aws_region();
        if credentials::aws_static_credentials_present() {
            tracing::info!("✅ Using AWS credentials from environment");
        } else {
            tracing::info!("✅ Using AWS default credentials (AWS CLI or IAM role)");
        }
        tracing::info!("✅ Region: {}", region);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;
        Self::new(Client::new(&config))
    }

    pub async fn list_zones(&self, show_records: bool) -> Result<Vec<ZoneSummary>> {
        let response = self
            .client
            .list_hosted_zones()
            .send()
            .await
            .map_err(aws_error)?;

        let mut zones = Vec::new();
        for zone in response.hosted_zones() {
            let id = strip_zone_prefix(zone.id()).to_string();
            let record_count = zone.resource_record_set_count().unwrap_or(0);

            let name_servers = match self.client.get_hosted_zone().id(&id).send().await {
                Ok(info) => info
                    .delegation_set()
                    .map(|d| d.name_servers().to_vec())
                    .unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("⚠️ Could not fetch name servers for {}: {}", id, DisplayErrorContext(e));
                    Vec::new()
                }
            };

            let mut records = Vec::new();
            let mut total_records = 0;
            if show_records && record_count > 0 {
                match self
                    .client
                    .list_resource_record_sets()
                    .hosted_zone_id(&id)
                    .max_items(100)
                    .send()
                    .await
                {
                    Ok(output) => {
                        let sets = output.resource_record_sets();
                        total_records = sets.len();
                        records = sets.iter().take(RECORD_PREVIEW).map(RecordSummary::from_set).collect();
                    }
                    Err(e) => tracing::warn!("⚠️ Error fetching records for {}: {}", id, DisplayErrorContext(e)),
                }
            }

            zones.push(ZoneSummary {
                id,
                name: zone.name().trim_end_matches('.').to_string(),
                record_count,
                private: zone.config().is_some_and(|c| c.private_zone()),
                name_servers,
                records,
                total_records,
            });
        }
        Ok(zones)
    }

    pub async fn find_zone_id(&self, domain: &str) -> Result<String> {
        let wanted = format!("{}.", domain.trim_end_matches('.'));
        let response = self
            .client
            .list_hosted_zones()
            .send()
            .await
            .map_err(aws_error)?;

        response
            .hosted_zones()
            .iter()
            .find(|zone| zone.name().eq_ignore_ascii_case(&wanted))
            .map(|zone| strip_zone_prefix(zone.id()).to_string())
            .ok_or_else(|| SiteError::ZoneNotFoundError {
                domain: domain.to_string(),
            })
    }

    fn change_for(set: &RecordSet) -> Result<ChangeBatch> {
        let records = set
            .values
            .iter()
            .map(|value| ResourceRecord::builder().value(value).build().map_err(aws_error))
            .collect::<Result<Vec<_>>>()?;

        let record_set = ResourceRecordSet::builder()
            .name(&set.name)
            .r#type(RrType::from(set.record_type.as_str()))
            .ttl(i64::from(set.ttl))
            .set_resource_records(Some(records))
            .build()
            .map_err(aws_error)?;

        let change = Change::builder()
            .action(ChangeAction::Upsert)
            .resource_record_set(record_set)
            .build()
            .map_err(aws_error)?;

        ChangeBatch::builder()
            .changes(change)
            .comment(format!("Upsert {} {}", set.display_name(), set.record_type))
            .build()
            .map_err(aws_error)
    }

    /// 每組紀錄各自送一次 UPSERT，單組失敗不影響其他組
    pub async fn apply_plan(&self, zone_id: &str, plan: &[RecordSet]) -> Result<ApplyOutcome> {
        let mut outcome = ApplyOutcome::default();
        for set in plan {
            let batch = Self::change_for(set)?;
            match self
                .client
                .change_resource_record_sets()
                .hosted_zone_id(zone_id)
                .change_batch(batch)
                .send()
                .await
            {
                Ok(_) => {
                    tracing::info!("  ✅ {} {}", set.display_name(), set.record_type);
                    outcome.succeeded += 1;
                }
                Err(e) => {
                    tracing::error!(
                        "  ❌ {} {}: {}",
                        set.display_name(),
                        set.record_type,
                        DisplayErrorContext(e)
                    );
                    outcome.failed += 1;
                }
            }
        }
        Ok(outcome)
    }
}
