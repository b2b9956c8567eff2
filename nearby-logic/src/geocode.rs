use std::collections::HashMap;

use log::debug;
use tokio::sync::Mutex;

use crate::{location::Coordinates, prelude::*};

/// Resolves free-text addresses to coordinates.
///
/// Any `Err` is treated as a non-success status, callers don't look any deeper than that.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> impl Future<Output = Result<Coordinates>> + Send;
}

/// Wraps another [Geocoder] and remembers successful lookups, failures are never cached
pub struct CachingGeocoder<G: Geocoder> {
    inner: G,
    cache: Mutex<HashMap<String, Coordinates>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cache_key(address: &str) -> String {
        address.trim().to_lowercase()
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Coordinates> {
        let key = Self::cache_key(address);

        if let Some(coords) = self.cache.lock().await.get(&key).copied() {
            debug!("Geocode cache hit for {address:?}");
            return Ok(coords);
        }

        let coords = self.inner.geocode(address).await?;
        self.cache.lock().await.insert(key, coords);
        Ok(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MockGeocoder;

    #[tokio::test]
    async fn test_cache_hits_skip_inner() {
        let inner = MockGeocoder::succeeding(Coordinates::new(1.0, 2.0));
        let geocoder = CachingGeocoder::new(inner);

        let first = geocoder.geocode("1 Elm St, Austin").await.unwrap();
        let second = geocoder.geocode("  1 ELM ST, austin ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(geocoder.inner.calls().await.len(), 1, "Second lookup hit inner");
        assert_eq!(geocoder.cached_len().await, 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let inner = MockGeocoder::failing();
        let geocoder = CachingGeocoder::new(inner);

        assert!(geocoder.geocode("Nowhere").await.is_err());
        assert!(geocoder.geocode("Nowhere").await.is_err());

        assert_eq!(geocoder.inner.calls().await.len(), 2);
        assert_eq!(geocoder.cached_len().await, 0);
    }
}
