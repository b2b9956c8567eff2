use crate::record::NearbyRecord;

/// Draws markers for nearby records, the core never renders anything itself.
pub trait OverlayManager: Send + Sync + 'static {
    /// Opaque reference to a placed marker
    type Handle: Send + 'static;

    /// Place a marker for a record
    fn place(&self, record: &NearbyRecord) -> Self::Handle;
    /// Remove a single marker
    fn remove(&self, handle: Self::Handle);
    /// Remove every marker this manager has placed
    fn clear_all(&self);
}
