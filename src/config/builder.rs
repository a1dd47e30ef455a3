use super::{EngineConfig, Origin};
use crate::MAX_ZOOM;

/// Builder for creating engine configurations with a fluent API
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    origin: Option<Origin>,
    zoom: Option<u8>,
    radius_m: Option<f64>,
    timeout_seconds: Option<u64>,
}

impl EngineConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            origin: None,
            zoom: None,
            radius_m: None,
            timeout_seconds: None,
        }
    }

    /// Set the origin
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Anchor the plane at explicit coordinates
    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.origin = Some(Origin::point(lat, lon));
        self
    }

    /// Anchor the plane at a named place
    pub fn place(mut self, name: impl Into<String>) -> Self {
        self.origin = Some(Origin::place(name));
        self
    }

    /// Set the tile zoom level
    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Set the loading radius in meters
    pub fn radius_m(mut self, radius_m: f64) -> Self {
        self.radius_m = Some(radius_m);
        self
    }

    /// Set the timeout
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the final configuration
    ///
    /// Unset fields fall back to defaults, zoom clamps to [`MAX_ZOOM`].
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            origin: self.origin.unwrap_or_else(|| Origin::point(52.52, 13.41)),
            zoom: self.zoom.unwrap_or(17).min(MAX_ZOOM),
            radius_m: self.radius_m.unwrap_or(500.0),
            timeout_seconds: self.timeout_seconds.unwrap_or(30),
        }
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience methods for common configurations
impl EngineConfigBuilder {
    /// Walkable city-block loading: fine tiles, short radius
    pub fn for_pedestrian() -> Self {
        Self::new().zoom(17).radius_m(300.0)
    }

    /// Flight-style loading: coarser tiles, wide radius
    pub fn for_overflight() -> Self {
        Self::new().zoom(15).radius_m(2000.0).timeout(60)
    }

    /// Static scene: one initial load, no dynamic tracking
    pub fn for_static_scene() -> Self {
        Self::new().radius_m(0.0)
    }
}
