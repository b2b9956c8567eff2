use std::fmt;

use anyhow::{anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Mean earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6372.797560856;

/// Identifier the backend assigns to a location on its first create
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// A point on the globe, in degrees
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Wire order used by the backend and the nearby feed
    pub fn to_lon_lat(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    pub fn from_lon_lat([longitude, latitude]: [f64; 2]) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Haversine distance to another point in kilometers
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

/// Search distance around a location, always finite and positive
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Radius(f64);

impl Radius {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            bail!("Radius must be a finite number, got {value}");
        } else if value <= 0.0 {
            bail!("Radius must be positive, got {value}");
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Radius {
    fn default() -> Self {
        Self(20.0)
    }
}

impl TryFrom<f64> for Radius {
    type Error = anyhow::Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Radius> for f64 {
    fn from(value: Radius) -> Self {
        value.0
    }
}

impl fmt::Display for Radius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// The operator is filling in the form
    #[default]
    Editing,
    /// The operator is watching the nearby feed
    Observing,
}

/// Body sent to the backend on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPayload {
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

/// The location the operator is registering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    id: Option<LocationId>,
    pub name: String,
    pub address: String,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    coordinates: Option<Coordinates>,
    pub radius: Radius,
    pub mode: Mode,
}

impl Location {
    pub fn new(radius: Radius) -> Self {
        Self {
            radius,
            ..Default::default()
        }
    }

    pub fn id(&self) -> Option<&LocationId> {
        self.id.as_ref()
    }

    /// Record the backend identifier, this can only ever happen once
    pub fn assign_id(&mut self, id: LocationId) -> Result {
        if let Some(existing) = &self.id {
            Err(anyhow!(
                "Location already has id {existing}, refusing to replace it with {id}"
            ))
        } else {
            self.id = Some(id);
            Ok(())
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn set_coordinates(&mut self, coords: Coordinates) {
        self.coordinates = Some(coords);
    }

    /// Compact single-line address used for geocoding, empty fields are skipped
    pub fn address_summary(&self) -> String {
        let region_postal = match (self.region.is_empty(), self.postal_code.is_empty()) {
            (false, false) => format!("{} {}", self.region, self.postal_code),
            (false, true) => self.region.clone(),
            (true, false) => self.postal_code.clone(),
            (true, true) => String::new(),
        };

        [self.address.as_str(), self.city.as_str(), &region_postal]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Build the backend body, `None` until the location has been geocoded
    pub fn payload(&self) -> Option<LocationPayload> {
        self.coordinates.map(|coords| LocationPayload {
            name: self.name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            province: self.region.clone(),
            postal_code: self.postal_code.clone(),
            coordinates: coords.to_lon_lat(),
        })
    }
}
