use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{location::Radius, retry::RetryPolicy};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Tunables for a [crate::LocationController]
pub struct ControllerSettings {
    /// Radius a fresh location starts with
    pub initial_radius: Radius,
    /// Quiet period after the last radius change before the feed is restarted
    pub debounce: Duration,
    /// Wait between reconnect attempts of a dropped feed
    pub retry: RetryPolicy,
    /// Give up reconnecting after this many consecutive failures, `None` retries forever
    pub max_retries: Option<u32>,
    /// Send the current radius as `distance` when updating an existing location
    pub send_distance_on_update: bool,
}

impl ControllerSettings {
    /// Fixed one second retries, matching the original web client
    pub fn legacy() -> Self {
        Self {
            retry: RetryPolicy::LEGACY,
            ..Default::default()
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            initial_radius: Radius::default(),
            debounce: Duration::from_millis(1000),
            retry: RetryPolicy::default(),
            max_retries: None,
            send_distance_on_update: true,
        }
    }
}
