//! 合作夥伴地點查詢：partner_coordinates.json 與 partner_addresses.json

use crate::core::Geocoder;
use crate::domain::model::{PartnerCoordinates, PartnerLocation, PartnerQuery};
use crate::utils::error::{Result, SiteError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.is_file() {
        return Err(SiteError::ConfigValidationError {
            field: path.display().to_string(),
            message: "file not found".to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}

/// 以 "<name>, <location>" 查詢每個夥伴；查不到的座標留空
pub async fn geocode_partners(
    partners: &BTreeMap<String, PartnerLocation>,
    geocoder: &dyn Geocoder,
    delay: Duration,
) -> BTreeMap<String, PartnerCoordinates> {
    let mut coordinates = BTreeMap::new();

    for (i, (slug, partner)) in partners.iter().enumerate() {
        let query = format!("{}, {}", partner.name, partner.location);
        tracing::info!("📍 Geocoding: {} - {}", partner.name, partner.location);

        let entry = match geocoder.lookup(&query).await {
            Ok(Some(place)) if place.lat.is_some() && place.lng.is_some() => {
                tracing::info!("   ✅ Found: {}", place.formatted_address);
                PartnerCoordinates {
                    name: partner.name.clone(),
                    location: partner.location.clone(),
                    lat: place.lat,
                    lng: place.lng,
                    formatted_address: if place.formatted_address.is_empty() {
                        partner.location.clone()
                    } else {
                        place.formatted_address
                    },
                    place_id: place.place_id,
                }
            }
            Ok(_) => {
                tracing::warn!("   ⚠️ No result for {}", query);
                PartnerCoordinates::unresolved(partner)
            }
            Err(e) => {
                tracing::warn!("   ⚠️ {}", e);
                PartnerCoordinates::unresolved(partner)
            }
        };
        coordinates.insert(slug.clone(), entry);

        if i + 1 < partners.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    coordinates
}

pub fn resolved_count(coordinates: &BTreeMap<String, PartnerCoordinates>) -> usize {
    coordinates.values().filter(|c| c.is_resolved()).count()
}

/// 找到的地址與來源
#[derive(Debug, Clone, PartialEq)]
pub struct AddressMatch {
    pub query: String,
    pub formatted_address: String,
    pub source: &'static str,
    pub place_id: Option<String>,
}

/// 地址裡要出現 location 的任一個字才算相關
pub fn is_relevant(address: &str, location: &str) -> bool {
    let address = address.to_lowercase();
    location
        .to_lowercase()
        .split_whitespace()
        .any(|keyword| address.contains(keyword))
}

async fn find_one(
    partner: &PartnerQuery,
    primary: Option<&dyn Geocoder>,
    fallback: &dyn Geocoder,
) -> Option<AddressMatch> {
    for query in partner.effective_queries() {
        tracing::info!("  Trying: {}", query);

        if let Some(geocoder) = primary {
            match geocoder.lookup(&query).await {
                Ok(Some(place)) => {
                    tracing::info!("  ✓ Found ({}): {}", geocoder.source(), place.formatted_address);
                    return Some(AddressMatch {
                        query,
                        formatted_address: place.formatted_address,
                        source: geocoder.source(),
                        place_id: place.place_id,
                    });
                }
                Ok(None) => tracing::debug!("  {}: no results", geocoder.source()),
                Err(SiteError::GeocodeError { status, .. }) if status == "REQUEST_DENIED" => {}
                Err(e) => tracing::info!("  {}: {}", geocoder.source(), e),
            }
        }

        match fallback.lookup(&query).await {
            Ok(Some(place)) if is_relevant(&place.formatted_address, &partner.location) => {
                tracing::info!("  ✓ Found ({}): {}", fallback.source(), place.formatted_address);
                return Some(AddressMatch {
                    query,
                    formatted_address: place.formatted_address,
                    source: fallback.source(),
                    place_id: place.place_id,
                });
            }
            Ok(Some(place)) => {
                tracing::info!("  ? Found but may not be relevant: {}", place.formatted_address);
            }
            Ok(None) => tracing::debug!("  {}: no results", fallback.source()),
            Err(e) => tracing::info!("  {}: {}", fallback.source(), e),
        }
    }
    None
}

/// 逐一嘗試每個查詢字串，先用 primary（Google），再退回 fallback（Nominatim）
pub async fn find_addresses(
    partners: &[PartnerQuery],
    primary: Option<&dyn Geocoder>,
    fallback: &dyn Geocoder,
    delay: Duration,
) -> BTreeMap<String, Option<AddressMatch>> {
    let mut results = BTreeMap::new();

    for (i, partner) in partners.iter().enumerate() {
        tracing::info!("[{}/{}] Searching for: {}", i + 1, partners.len(), partner.name);

        let found = find_one(partner, primary, fallback).await;
        if found.is_none() {
            tracing::warn!("  ✗ Not found with any query");
        }
        results.insert(partner.name.clone(), found);

        if i + 1 < partners.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    results
}

/// {name: address | null}
pub fn addresses_json(results: &BTreeMap<String, Option<AddressMatch>>) -> BTreeMap<String, Option<String>> {
    results
        .iter()
        .map(|(name, found)| (name.clone(), found.as_ref().map(|m| m.formatted_address.clone())))
        .collect()
}
