use httpmock::prelude::*;
use site_maint::adapters::{GooglePlaces, Nominatim};
use site_maint::app::geo;
use site_maint::domain::model::{PartnerLocation, PartnerQuery};
use site_maint::Geocoder;
use std::collections::BTreeMap;
use std::time::Duration;
use tempfile::TempDir;

#[tokio::test]
async fn test_geocode_partner_locations_file() {
    let server = MockServer::start();
    let found = server.mock(|when, then| {
        when.method(GET)
            .path("/textsearch/json")
            .query_param("query", "Green Gulch Farm, Muir Beach, California");
        then.status(200).json_body(serde_json::json!({
            "status": "OK",
            "results": [{
                "name": "Green Gulch Farm Zen Center",
                "formatted_address": "1601 Shoreline Hwy, Muir Beach, CA 94965, USA",
                "place_id": "gg-1",
                "geometry": {"location": {"lat": 37.8613, "lng": -122.5674}}
            }]
        }));
    });
    let missing = server.mock(|when, then| {
        when.method(GET)
            .path("/textsearch/json")
            .query_param("query", "Closed Cafe, Nowhere");
        then.status(200)
            .json_body(serde_json::json!({"status": "ZERO_RESULTS", "results": []}));
    });

    let temp = TempDir::new().unwrap();
    let input = temp.path().join("partner_locations.json");
    std::fs::write(
        &input,
        r#"{
  "green-gulch": {"name": "Green Gulch Farm", "location": "Muir Beach, California"},
  "closed-cafe": {"name": "Closed Cafe", "location": "Nowhere"}
}"#,
    )
    .unwrap();

    let partners: BTreeMap<String, PartnerLocation> = geo::read_json(&input).unwrap();
    let google = GooglePlaces::new(server.base_url(), "test-key");
    let coordinates = geo::geocode_partners(&partners, &google, Duration::ZERO).await;

    found.assert();
    missing.assert();
    assert_eq!(geo::resolved_count(&coordinates), 1);

    let output = temp.path().join("partner_coordinates.json");
    geo::write_json(&output, &coordinates).unwrap();
    let written: serde_json::Value = geo::read_json(&output).unwrap();

    assert_eq!(written["green-gulch"]["lat"], 37.8613);
    assert_eq!(written["green-gulch"]["place_id"], "gg-1");
    assert!(written["closed-cafe"]["lat"].is_null());
    assert_eq!(written["closed-cafe"]["formatted_address"], "Nowhere");
}

#[tokio::test]
async fn test_find_addresses_falls_back_to_nominatim() {
    let google_server = MockServer::start();
    let denied = google_server.mock(|when, then| {
        when.method(GET).path("/textsearch/json");
        then.status(200).json_body(serde_json::json!({
            "status": "REQUEST_DENIED",
            "results": [],
            "error_message": "This API project is not authorized to use this API."
        }));
    });

    let osm_server = MockServer::start();
    osm_server.mock(|when, then| {
        when.method(GET)
            .path("/search")
            .query_param("q", "Peace on Fifth Dayton Ohio")
            .header("user-agent", "Agroverse Partner Address Finder");
        then.status(200).json_body(serde_json::json!([{
            "display_name": "Peace on Fifth, 5th Street, Dayton, Ohio, United States",
            "place_id": 123456,
            "lat": "39.75",
            "lon": "-84.18",
            "address": {
                "house_number": "500",
                "road": "East 5th Street",
                "city": "Dayton",
                "state": "Ohio",
                "postcode": "45402",
                "country": "United States"
            }
        }]));
    });
    osm_server.mock(|when, then| {
        when.method(GET).path("/search").query_param("q", "Heierling Ski");
        then.status(200).json_body(serde_json::json!([{
            "display_name": "Heierling, Bavaria, Germany",
            "place_id": 99,
            "lat": "47.5",
            "lon": "11.1",
            "address": {"state": "Bavaria", "country": "Germany"}
        }]));
    });

    let partners: Vec<PartnerQuery> = serde_json::from_value(serde_json::json!([
        {"name": "Peace on Fifth", "location": "Dayton, Ohio", "queries": ["Peace on Fifth Dayton Ohio"]},
        {"name": "Heierling Ski", "location": "Davos, Switzerland", "queries": ["Heierling Ski"]}
    ]))
    .unwrap();

    let google = GooglePlaces::new(google_server.base_url(), "test-key");
    let nominatim = Nominatim::new(osm_server.base_url(), "Agroverse Partner Address Finder");
    let results = geo::find_addresses(
        &partners,
        Some(&google as &dyn Geocoder),
        &nominatim,
        Duration::ZERO,
    )
    .await;

    denied.assert_hits(2);
    let peace = results["Peace on Fifth"].as_ref().unwrap();
    assert_eq!(peace.source, "Nominatim");
    assert_eq!(peace.place_id.as_deref(), Some("123456"));

    let json = geo::addresses_json(&results);
    assert_eq!(
        json["Peace on Fifth"].as_deref(),
        Some("500 East 5th Street, Dayton, Ohio, 45402, United States")
    );
    assert_eq!(json["Heierling Ski"], None);
}
