use log::{debug, info};
use nearby_logic::{NearbyRecord, OverlayManager, StateUpdateSender};
use uuid::Uuid;

/// Stands in for a map, markers are just logged
pub struct LogOverlay;

impl OverlayManager for LogOverlay {
    type Handle = Uuid;

    fn place(&self, record: &NearbyRecord) -> Uuid {
        let id = Uuid::new_v4();
        info!(
            "Nearby: {} at ({:.5}, {:.5})",
            record.name, record.latitude, record.longitude
        );
        debug!("Placed marker {id}");
        id
    }

    fn remove(&self, handle: Uuid) {
        debug!("Removed marker {handle}");
    }

    fn clear_all(&self) {
        debug!("Cleared all markers");
    }
}

pub struct LogUpdates;

impl StateUpdateSender for LogUpdates {
    fn send_update(&self) {
        debug!("Location state changed");
    }
}
