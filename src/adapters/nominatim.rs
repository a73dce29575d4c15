use crate::core::Geocoder;
use crate::domain::model::PlaceMatch;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    display_name: String,
    lat: Option<String>,
    lon: Option<String>,
    place_id: Option<serde_json::Value>,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
}

impl Address {
    /// 門牌 + 路名、城鎮、州、郵遞區號、國家
    fn format(&self) -> Option<String> {
        let mut parts = Vec::new();
        match (&self.house_number, &self.road) {
            (Some(number), Some(road)) => parts.push(format!("{} {}", number, road)),
            (None, Some(road)) => parts.push(road.clone()),
            _ => {}
        }
        if let Some(place) = self.city.as_ref().or(self.town.as_ref()).or(self.village.as_ref()) {
            parts.push(place.clone());
        }
        parts.extend(
            [&self.state, &self.postcode, &self.country]
                .into_iter()
                .flatten()
                .cloned(),
        );
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

/// OpenStreetMap Nominatim，不需要 API key
pub struct Nominatim {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl Nominatim {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    fn source(&self) -> &'static str {
        "Nominatim"
    }

    async fn lookup(&self, query: &str) -> Result<Option<PlaceMatch>> {
        let url = format!("{}/search", self.base_url);
        tracing::debug!("Nominatim search: {}", query);

        let results: Vec<SearchResult> = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(results.into_iter().next().map(|result| PlaceMatch {
            name: None,
            formatted_address: result.address.format().unwrap_or(result.display_name),
            place_id: result.place_id.map(|id| match id {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            }),
            lat: result.lat.and_then(|v| v.parse().ok()),
            lng: result.lon.and_then(|v| v.parse().ok()),
        }))
    }
}
