mod builder;
mod region;

pub use builder::*;
pub use region::*;

use serde::{Deserialize, Serialize};

use crate::MAX_ZOOM;

/// Configuration for the tile loader and geometry pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where the local plane coordinate system is anchored
    pub origin: Origin,
    /// Slippy-map zoom level used for tile bookkeeping
    pub zoom: u8,
    /// Loading radius around the viewpoint in meters (0 disables dynamic loading)
    pub radius_m: f64,
    /// Maximum timeout for fetch requests (in seconds)
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            origin: Origin::point(52.52, 13.41),
            zoom: 17,
            radius_m: 500.0,
            timeout_seconds: 30,
        }
    }
}

impl EngineConfig {
    /// Create a configuration anchored at explicit coordinates
    pub fn at(lat: f64, lon: f64) -> Self {
        Self {
            origin: Origin::point(lat, lon),
            ..Default::default()
        }
    }

    /// Create a configuration anchored at a named place (geocoded by the provider)
    pub fn for_place(name: impl Into<String>) -> Self {
        Self {
            origin: Origin::place(name),
            ..Default::default()
        }
    }

    /// Set the tile zoom level, clamped to [`MAX_ZOOM`]
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom.min(MAX_ZOOM);
        self
    }

    /// Set the loading radius in meters
    pub fn with_radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Create a builder for more complex configuration
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }
}
