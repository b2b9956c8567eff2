mod controller;
mod debounce;
mod feed;
mod geocode;
mod location;
mod overlay;
mod persistence;
mod record;
mod retry;
mod settings;
mod stream;
#[cfg(test)]
mod tests;

pub use controller::{LocationController, StateUpdateSender, SubmitOutcome};
pub use debounce::Debouncer;
pub use feed::{FeedConnection, FeedTransport, nearby_path};
pub use geocode::{CachingGeocoder, Geocoder};
pub use location::{Coordinates, Location, LocationId, LocationPayload, Mode, Radius};
pub use overlay::OverlayManager;
pub use persistence::PersistenceClient;
pub use record::NearbyRecord;
pub use retry::RetryPolicy;
pub use settings::ControllerSettings;
pub use stream::{NearbyStream, StreamEvent, StreamState};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
