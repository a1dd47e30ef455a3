//! Incremental loading of buildings around a moving viewpoint

mod registry;
mod tracker;

pub use registry::*;
pub use tracker::*;


use std::time::Instant;

use crate::{
    Building3D, EngineConfig, Feature, FeatureProvider, GeoPoint, MAX_ZOOM, Origin,
    OsmBuildingsError, PlanePoint, Projector, Result, geo_to_fractional_tile, reconcile_batch,
    tile_width_meters,
};

/// Per-origin bookkeeping, rebuilt whenever the origin changes
struct LoaderState {
    base: GeoPoint,
    projector: Projector,
    base_tile: (f64, f64),
    tile_width_m: f64,
    tracker: TileTracker,
    registry: FeatureRegistry,
}

/// Streams 3D buildings around a viewpoint moving over a local plane
///
/// The loader resolves the configured origin once, anchors a projection
/// plane there, then fetches features tile by tile as the viewpoint
/// moves. Tiles are requested at most once per origin and features are
/// deduplicated across overlapping responses, so every call returns
/// only buildings the caller has not seen before.
pub struct WorldLoader {
    config: EngineConfig,
    provider: Box<dyn FeatureProvider>,
    state: Option<LoaderState>,
}

impl WorldLoader {
    /// Create a loader over the given provider
    pub fn new(config: EngineConfig, provider: impl FeatureProvider + 'static) -> Self {
        Self::from_boxed(config, Box::new(provider))
    }

    /// Create a loader over an already boxed provider
    pub fn from_boxed(config: EngineConfig, mut provider: Box<dyn FeatureProvider>) -> Self {
        provider.apply_config(&config);
        Self {
            config,
            provider,
            state: None,
        }
    }

    /// Resolve the origin and load the first batch of buildings
    ///
    /// Must be called once before [`tick`](Self::tick). Origin
    /// resolution failures propagate; fetch failures inside the load
    /// are logged and yield an empty batch.
    pub async fn initial_load(&mut self) -> Result<Vec<Building3D>> {
        let started = Instant::now();
        tracing::info!(
            "Starting world load via '{}' provider",
            self.provider.provider_type()
        );

        let base = self.provider.resolve_origin(&self.config.origin).await?;
        let zoom = self.config.zoom.min(MAX_ZOOM);

        self.state = Some(LoaderState {
            base,
            projector: Projector::new(base),
            base_tile: geo_to_fractional_tile(base, zoom),
            tile_width_m: tile_width_meters(base.lat, zoom),
            tracker: TileTracker::new(zoom),
            registry: FeatureRegistry::new(),
        });

        let buildings = self.load_around(PlanePoint::new(0.0, 0.0)).await?;

        tracing::info!(
            "Initial load at ({:.5}, {:.5}) finished in {}ms with {} buildings",
            base.lat,
            base.lon,
            started.elapsed().as_millis(),
            buildings.len()
        );

        Ok(buildings)
    }

    /// Load whatever the viewpoint's surroundings still miss
    ///
    /// Plane coordinates are meters relative to the origin. Returns
    /// only buildings from freshly claimed tiles; an empty vector means
    /// the area was already covered.
    pub async fn tick(&mut self, viewpoint: PlanePoint) -> Result<Vec<Building3D>> {
        if self.state.is_none() {
            return Err(OsmBuildingsError::Config(
                "initial_load must run before tick".to_string(),
            ));
        }
        if self.config.radius_m <= 0.0 {
            return Ok(Vec::new());
        }
        self.load_around(viewpoint).await
    }

    /// Move to a new origin, dropping all per-origin state
    pub async fn reset_origin(&mut self, origin: Origin) -> Result<Vec<Building3D>> {
        tracing::info!("Resetting origin to {:?}", origin);
        self.config.origin = origin;
        self.state = None;
        self.initial_load().await
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The resolved origin, once `initial_load` has run
    pub fn origin(&self) -> Option<GeoPoint> {
        self.state.as_ref().map(|state| state.base)
    }

    /// Number of tiles claimed for the current origin
    pub fn loaded_tile_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.tracker.len())
    }

    /// Number of distinct features processed for the current origin
    pub fn seen_feature_count(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.registry.len())
    }

    pub fn provider(&self) -> &dyn FeatureProvider {
        self.provider.as_ref()
    }

    async fn load_around(&mut self, viewpoint: PlanePoint) -> Result<Vec<Building3D>> {
        let radius_m = self.config.radius_m;
        let state = self.state.as_mut().ok_or_else(|| {
            OsmBuildingsError::Config("loader has no resolved origin".to_string())
        })?;

        // Tile y grows southward, plane y grows northward
        let fx = state.base_tile.0 + viewpoint.x / state.tile_width_m;
        let fy = state.base_tile.1 - viewpoint.y / state.tile_width_m;
        let radius_tiles = radius_m / state.tile_width_m;

        let bbox = match state.tracker.claim_region(fx, fy, radius_tiles) {
            Some(bbox) => bbox,
            None => return Ok(Vec::new()),
        };

        let batch = match self.provider.fetch_features(&bbox).await {
            Ok(batch) => batch,
            Err(e) => {
                // Claimed tiles stay claimed; a flaky provider must not
                // stall the caller or trigger re-fetch storms
                tracing::warn!("Feature fetch failed, skipping region: {}", e);
                return Ok(Vec::new());
            }
        };

        let fetched = batch.features.len();
        let fresh: Vec<Feature> = batch
            .features
            .into_iter()
            .filter(|feature| !state.registry.contains(feature.id))
            .collect();
        let fresh_count = fresh.len();

        let outcome = reconcile_batch(fresh, &state.projector);
        for id in outcome.classified_ids() {
            state.registry.mark(id);
        }

        let mut buildings = Vec::new();
        for classified in outcome.kept {
            let id = classified.feature.id;
            match Building3D::from_classified(classified) {
                Ok(Some(building)) => buildings.push(building),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping footprint {}: {}", id, e),
            }
        }

        tracing::info!(
            "Materialized {} buildings from {} new of {} fetched features ({} tiles claimed)",
            buildings.len(),
            fresh_count,
            fetched,
            state.tracker.len()
        );

        Ok(buildings)
    }
}
