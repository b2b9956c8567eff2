use log::debug;
use serde::Deserialize;

use nearby_logic::{LocationId, LocationPayload, PersistenceClient, Radius, prelude::*};

use crate::server::ServerEndpoint;

#[derive(Debug, Deserialize)]
struct CreatedLocation {
    id: LocationId,
}

/// [PersistenceClient] talking to the location REST API
pub struct HttpPersistence {
    endpoint: ServerEndpoint,
    client: reqwest::Client,
}

impl HttpPersistence {
    pub fn new(endpoint: ServerEndpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { endpoint, client })
    }

    fn update_url(&self, id: &LocationId, distance: Option<Radius>) -> String {
        let path = if let Some(distance) = distance {
            format!("/location/{id}?distance={distance}")
        } else {
            format!("/location/{id}")
        };
        self.endpoint.http_url(&path)
    }
}

impl PersistenceClient for HttpPersistence {
    async fn create(&self, payload: &LocationPayload) -> Result<LocationId> {
        let url = self.endpoint.http_url("/location");
        debug!("POST {url}");
        let created = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Server returned error")?
            .json::<CreatedLocation>()
            .await
            .context("Server response didn't contain an id")?;
        Ok(created.id)
    }

    async fn update(
        &self,
        id: &LocationId,
        payload: &LocationPayload,
        distance: Option<Radius>,
    ) -> Result {
        let url = self.update_url(id, distance);
        debug!("PUT {url}");
        self.client
            .put(url)
            .json(payload)
            .send()
            .await
            .context("Could not send request")?
            .error_for_status()
            .context("Server returned error")?;
        Ok(())
    }
}
