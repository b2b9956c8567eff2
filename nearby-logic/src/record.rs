use serde::{Deserialize, Serialize};

use crate::{location::Coordinates, prelude::*};

/// Another location reported by the nearby feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyRecord {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

/// Shape of a single feed frame, the server sends the whole stored location so anything
/// beyond these fields is ignored
#[derive(Debug, Deserialize)]
struct NearbyFrame {
    name: Option<String>,
    coordinates: [f64; 2],
}

impl NearbyRecord {
    pub fn from_frame(text: &str) -> Result<Self> {
        let frame: NearbyFrame =
            serde_json::from_str(text).context("Failed to decode nearby frame")?;
        let [longitude, latitude] = frame.coordinates;
        Ok(Self {
            name: frame.name.unwrap_or_default(),
            longitude,
            latitude,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}
