use crate::core::Geocoder;
use crate::domain::model::PlaceMatch;
use crate::utils::error::{Result, SiteError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const DETAIL_FIELDS: &str = "formatted_address,formatted_phone_number,website,opening_hours";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    name: Option<String>,
    formatted_address: Option<String>,
    place_id: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

/// Place Details 回傳的聯絡資訊
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    pub formatted_address: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_text: Vec<String>,
}

/// Google Places Text Search / Details
pub struct GooglePlaces {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GooglePlaces {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn status_error(status: String, message: Option<String>) -> SiteError {
        SiteError::GeocodeError {
            status,
            message: message.unwrap_or_else(|| "No results found".to_string()),
        }
    }

    /// Text Search 的第一筆結果
    pub async fn text_search(&self, query: &str) -> Result<Option<PlaceMatch>> {
        let url = format!("{}/textsearch/json", self.base_url);
        tracing::debug!("Google text search: {}", query);

        let response: TextSearchResponse = self
            .client
            .get(&url)
            .query(&[("query", query), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(Self::status_error(response.status, response.error_message));
        }

        Ok(response.results.into_iter().next().map(|place| {
            let (lat, lng) = place
                .geometry
                .map(|g| (Some(g.location.lat), Some(g.location.lng)))
                .unwrap_or((None, None));
            PlaceMatch {
                name: place.name,
                formatted_address: place.formatted_address.unwrap_or_default(),
                place_id: place.place_id,
                lat,
                lng,
            }
        }))
    }

    pub async fn details(&self, place_id: &str) -> Result<PlaceDetails> {
        let url = format!("{}/details/json", self.base_url);
        let response: DetailsResponse = self
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(Self::status_error(response.status, response.error_message));
        }
        Ok(response.result.unwrap_or_default())
    }
}

#[async_trait]
impl Geocoder for GooglePlaces {
    fn source(&self) -> &'static str {
        "Google"
    }

    async fn lookup(&self, query: &str) -> Result<Option<PlaceMatch>> {
        self.text_search(query).await
    }
}
