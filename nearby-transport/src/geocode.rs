use anyhow::bail;
use log::debug;
use reqwest::Url;
use serde::Deserialize;

use nearby_logic::{Coordinates, Geocoder, prelude::*};

const GEOCODE_JSON_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
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

impl GeocodeResponse {
    fn into_coordinates(self) -> Result<Coordinates> {
        if self.status != "OK" {
            match self.error_message {
                Some(msg) => bail!("Geocoder returned {}: {msg}", self.status),
                None => bail!("Geocoder returned {}", self.status),
            }
        }

        let first = self
            .results
            .into_iter()
            .next()
            .context("Geocoder returned no results")?;

        let LatLng { lat, lng } = first.geometry.location;
        Ok(Coordinates::new(lat, lng))
    }
}

/// [Geocoder] backed by the Google Maps geocoding API
pub struct GoogleGeocoder {
    api_key: String,
    client: reqwest::Client,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.into(),
            client,
        })
    }

    fn request_url(&self, address: &str) -> Result<Url> {
        Url::parse_with_params(
            GEOCODE_JSON_URL,
            &[("address", address), ("key", self.api_key.as_str())],
        )
        .context("Failed to build geocode URL")
    }
}

impl Geocoder for GoogleGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates> {
        let url = self.request_url(address)?;
        debug!("Geocoding {address:?}");
        self.client
            .get(url)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Geocoder returned error")?
            .json::<GeocodeResponse>()
            .await
            .context("Failed to decode geocoder response")?
            .into_coordinates()
    }
}
