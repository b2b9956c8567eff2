use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{Mutex, RwLock};

use crate::{
    debounce::Debouncer,
    feed::FeedTransport,
    geocode::Geocoder,
    location::{Location, LocationId, Mode, Radius},
    overlay::OverlayManager,
    persistence::PersistenceClient,
    prelude::*,
    record::NearbyRecord,
    settings::ControllerSettings,
    stream::{NearbyStream, StreamState},
};

/// Notified every time the location or the nearby session changes
pub trait StateUpdateSender: Send + Sync {
    fn send_update(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The address couldn't be resolved, nothing was changed
    GeocodeFailed,
    /// The location was stored for the first time and the nearby feed started
    Created(LocationId),
    /// An already stored location was updated
    Updated(LocationId),
}

/// Ties the location form, the backend and the nearby feed together.
///
/// Submitting geocodes the address and then creates or updates the location depending on
/// whether the backend has assigned it an id yet. The first create starts the nearby feed,
/// after that radius changes restart it (debounced).
pub struct LocationController<G, P, F, O, S>
where
    G: Geocoder,
    P: PersistenceClient,
    F: FeedTransport,
    O: OverlayManager,
    S: StateUpdateSender,
{
    location: RwLock<Location>,
    geocoder: G,
    persistence: P,
    stream: Arc<NearbyStream<F, O>>,
    debouncer: Debouncer,
    settings: ControllerSettings,
    state_update_sender: S,
    submitting: Mutex<()>,
}

impl<G, P, F, O, S> LocationController<G, P, F, O, S>
where
    G: Geocoder + 'static,
    P: PersistenceClient + 'static,
    F: FeedTransport,
    O: OverlayManager,
    S: StateUpdateSender + 'static,
{
    pub fn new(
        settings: ControllerSettings,
        geocoder: G,
        persistence: P,
        transport: Arc<F>,
        overlays: O,
        state_update_sender: S,
    ) -> Arc<Self> {
        let stream = NearbyStream::new(transport, overlays, settings.retry, settings.max_retries);

        Arc::new(Self {
            location: RwLock::new(Location::new(settings.initial_radius)),
            geocoder,
            persistence,
            stream,
            debouncer: Debouncer::new(settings.debounce),
            settings,
            state_update_sender,
            submitting: Mutex::new(()),
        })
    }

    fn emit_state_update(&self) {
        self.state_update_sender.send_update();
    }

    async fn edit(&self, f: impl FnOnce(&mut Location)) {
        let mut location = self.location.write().await;
        f(&mut *location);
        drop(location);
        self.emit_state_update();
    }

    pub async fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.edit(|loc| loc.name = name).await;
    }

    pub async fn set_address(&self, address: impl Into<String>) {
        let address = address.into();
        self.edit(|loc| loc.address = address).await;
    }

    pub async fn set_city(&self, city: impl Into<String>) {
        let city = city.into();
        self.edit(|loc| loc.city = city).await;
    }

    pub async fn set_region(&self, region: impl Into<String>) {
        let region = region.into();
        self.edit(|loc| loc.region = region).await;
    }

    pub async fn set_postal_code(&self, postal_code: impl Into<String>) {
        let postal_code = postal_code.into();
        self.edit(|loc| loc.postal_code = postal_code).await;
    }

    pub async fn snapshot(&self) -> Location {
        self.location.read().await.clone()
    }

    pub async fn nearby(&self) -> Vec<NearbyRecord> {
        self.stream.records().await
    }

    pub async fn stream_state(&self) -> StreamState {
        self.stream.state().await
    }

    /// Geocode the current address then create or update the location.
    ///
    /// A failed geocode leaves everything untouched and resolves to
    /// [SubmitOutcome::GeocodeFailed]. Backend failures are returned as errors, nothing is
    /// retried.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let _submitting = self.submitting.lock().await;

        let summary = self.location.read().await.address_summary();
        debug!("Geocoding {summary:?}");

        let coords = match self.geocoder.geocode(&summary).await {
            Ok(coords) => coords,
            Err(why) => {
                warn!("Couldn't geocode {summary:?}: {why:?}");
                return Ok(SubmitOutcome::GeocodeFailed);
            }
        };

        let mut location = self.location.write().await;
        location.set_coordinates(coords);
        let payload = location
            .payload()
            .context("Location has no coordinates after geocoding")?;
        let id = location.id().cloned();
        let radius = location.radius;
        drop(location);
        self.emit_state_update();

        if let Some(id) = id {
            let distance = self.settings.send_distance_on_update.then_some(radius);
            self.persistence
                .update(&id, &payload, distance)
                .await
                .with_context(|| format!("Failed to update location {id}"))?;
            info!("Updated location {id}");
            Ok(SubmitOutcome::Updated(id))
        } else {
            let id = self
                .persistence
                .create(&payload)
                .await
                .context("Failed to create location")?;
            info!("Created location {id}");

            let mut location = self.location.write().await;
            location.assign_id(id.clone())?;
            location.mode = Mode::Observing;
            let radius = location.radius;
            drop(location);

            self.stream.start_session(id.clone(), radius).await;
            self.emit_state_update();

            Ok(SubmitOutcome::Created(id))
        }
    }

    /// Store a new search radius and restart the nearby feed once changes settle
    pub async fn on_radius_changed(self: &Arc<Self>, value: f64) -> Result {
        let radius = Radius::new(value)?;
        self.edit(|loc| loc.radius = radius).await;

        let controller = self.clone();
        self.debouncer
            .trigger(async move {
                controller.restart_stream().await;
            })
            .await;

        Ok(())
    }

    async fn restart_stream(&self) {
        let mut location = self.location.write().await;
        let Some(id) = location.id().cloned() else {
            debug!("Radius changed before the location was created, not starting a feed");
            return;
        };
        let radius = location.radius;
        location.mode = Mode::Observing;
        drop(location);

        self.stream.start_session(id, radius).await;
        self.emit_state_update();
    }

    /// Switch to watching the nearby feed, starting it if the location exists
    pub async fn enter_observing(&self) {
        let mut location = self.location.write().await;
        location.mode = Mode::Observing;
        let session = location.id().cloned().map(|id| (id, location.radius));
        drop(location);

        if let Some((id, radius)) = session {
            self.stream.start_session(id, radius).await;
        }
        self.emit_state_update();
    }

    /// Switch back to the form, the nearby feed is closed
    pub async fn enter_editing(&self) {
        self.location.write().await.mode = Mode::Editing;
        self.debouncer.cancel().await;
        self.stream.cancel().await;
        self.emit_state_update();
    }

    /// Drop any pending restart and close the feed
    pub async fn shutdown(&self) {
        self.debouncer.cancel().await;
        self.stream.cancel().await;
    }
}
