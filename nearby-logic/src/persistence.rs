use crate::{
    location::{LocationId, LocationPayload, Radius},
    prelude::*,
};

/// Backend location resource
pub trait PersistenceClient: Send + Sync {
    /// Store a new location, returns the id the backend assigned
    fn create(
        &self,
        payload: &LocationPayload,
    ) -> impl Future<Output = Result<LocationId>> + Send;

    /// Overwrite an existing location, `distance` is forwarded as a query parameter
    fn update(
        &self,
        id: &LocationId,
        payload: &LocationPayload,
        distance: Option<Radius>,
    ) -> impl Future<Output = Result> + Send;
}
