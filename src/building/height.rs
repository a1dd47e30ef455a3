use serde::{Deserialize, Serialize};

use crate::{PlanePoint, Tags};

/// Assumed height of one building level in meters
pub const METERS_PER_LEVEL: f64 = 3.0;

/// Facade color applied when a footprint carries no color tag
pub const DEFAULT_BUILDING_COLOR: &str = "#d9d0c9";

/// How a footprint is turned into a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingShape {
    /// Straight extrusion of the footprint
    Extruded,
    /// Hemisphere spanning the footprint's bounding box
    Dome,
}

/// Vertical extent and appearance resolved from a footprint's tags
///
/// `height_m` is `None` when no tag gave a usable height; callers decide
/// between skipping the feature and falling back to [`estimated_height`].
/// A height of exactly 0 means the footprint is fully replaced by its
/// parts and must not be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightProfile {
    /// Resolved height in meters, if any tag matched
    pub height_m: Option<f64>,
    /// Lower edge of the solid in meters above ground
    pub min_height_m: f64,
    /// Facade color (CSS color string)
    pub color: String,
    /// Solid shape selected by the tags
    pub shape: BuildingShape,
}

impl HeightProfile {
    /// Resolve a profile from raw tags
    ///
    /// Height is taken from the first match of: `height`, `roof:height`,
    /// `building:levels` × 3 m, or a per-type default. The minimum height
    /// comes from `min_height` or `building:min_level` × 3 m.
    pub fn from_tags(tags: &Tags) -> Self {
        let height_m = tags
            .meters("height")
            .or_else(|| tags.meters("roof:height"))
            .or_else(|| tags.number("building:levels").map(|l| l * METERS_PER_LEVEL))
            .or_else(|| typed_default_height(tags));

        let min_height_m = tags
            .meters("min_height")
            .or_else(|| tags.number("building:min_level").map(|l| l * METERS_PER_LEVEL))
            .unwrap_or(0.0);

        let color = tags
            .get("building:colour")
            .unwrap_or(DEFAULT_BUILDING_COLOR)
            .to_string();

        let shape = if tags.is_value("building:shape", "dome")
            || tags.is_value("roof:shape", "dome")
        {
            BuildingShape::Dome
        } else {
            BuildingShape::Extruded
        };

        Self {
            height_m,
            min_height_m,
            color,
            shape,
        }
    }

    /// Height the footprint renders at: the resolved height, or the
    /// perimeter estimate when no tag matched
    pub fn render_height(&self, outline: &[PlanePoint]) -> f64 {
        self.height_m.unwrap_or_else(|| estimated_height(outline))
    }
}

/// Height guessed for untagged footprints: a fifth of the outline
/// perimeter, capped at 6 m
pub fn estimated_height(outline: &[PlanePoint]) -> f64 {
    (ring_perimeter(outline) / 5.0).min(6.0)
}

/// Default height by structure type, keyed by `building` or `man_made`
fn typed_default_height(tags: &Tags) -> Option<f64> {
    let candidates = [tags.get("building"), tags.get("man_made")];
    candidates.into_iter().flatten().find_map(|value| {
        match value {
            // Landmarks with a tall default silhouette
            "church" | "water_tower" => Some(20.0),
            // Single-level structures
            "barn" | "boathouse" | "bungalow" | "cabin" | "carport" | "garage" | "garages"
            | "greenhouse" | "houseboat" | "hut" | "kiosk" | "service" | "shed" | "shelter"
            | "stable" | "static_caravan" | "sty" | "toilets" => Some(METERS_PER_LEVEL),
            _ => None,
        }
    })
}

/// Length of the closed ring through all points, in meters
fn ring_perimeter(ring: &[PlanePoint]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }

    let mut length = 0.0;
    for i in 0..ring.len() {
        let a = &ring[i];
        let b = &ring[(i + 1) % ring.len()];
        length += ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
    }
    length
}
