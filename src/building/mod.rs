mod height;
mod reconcile;
mod solid;

pub use height::*;
pub use reconcile::*;
pub use solid::*;

use serde::{Deserialize, Serialize};

use crate::{PlanePoint, Result};

/// A building ready for rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building3D {
    /// Id of the source feature
    pub id: i64,
    /// Outer footprint ring in plane coordinates
    pub outline: Vec<PlanePoint>,
    /// Hole rings in plane coordinates
    pub holes: Vec<Vec<PlanePoint>>,
    /// Top of the solid in meters above ground
    pub height_m: f64,
    /// Bottom of the solid in meters above ground
    pub min_height_m: f64,
    /// Facade color (CSS color string)
    pub color: String,
    /// Shape the mesh was built with
    pub shape: BuildingShape,
    /// Render-ready mesh
    pub mesh: MeshBuffers,
}

impl Building3D {
    /// Materialize the render model for a classified footprint
    ///
    /// Returns `Ok(None)` for footprints that should not produce
    /// geometry: a resolved height of exactly 0 (the building is fully
    /// replaced by its parts) or no vertical extent above `min_height`.
    /// Degenerate footprints fail with a geometry error.
    pub fn from_classified(classified: ClassifiedFeature) -> Result<Option<Self>> {
        let height_m = classified.render_height();
        let min_height_m = classified.profile.min_height_m;

        if height_m <= 0.0 {
            tracing::debug!("Footprint {} has zero height, skipping", classified.feature.id);
            return Ok(None);
        }
        if height_m <= min_height_m {
            tracing::debug!(
                "Footprint {} has no vertical extent ({}..{} m), skipping",
                classified.feature.id,
                min_height_m,
                height_m
            );
            return Ok(None);
        }

        let mesh = match classified.profile.shape {
            BuildingShape::Extruded => extrude_solid(
                &classified.outline,
                &classified.holes,
                min_height_m,
                height_m,
            )?,
            BuildingShape::Dome => dome_solid(&classified.bounds, min_height_m, height_m)?,
        };

        Ok(Some(Self {
            id: classified.feature.id,
            outline: classified.outline,
            holes: classified.holes,
            height_m,
            min_height_m,
            color: classified.profile.color,
            shape: classified.profile.shape,
            mesh,
        }))
    }
}
