mod parser;
mod tags;

pub use parser::*;
pub use tags::*;

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Shape class of a feature's geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}

/// Ring-based feature geometry
///
/// The first ring is the outer boundary; subsequent rings are holes.
/// Multipolygon relations are reduced to their first outer ring plus all
/// inner rings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureGeometry {
    pub kind: GeometryKind,
    pub rings: Vec<Vec<GeoPoint>>,
}

impl FeatureGeometry {
    /// Whether this geometry encloses an area
    pub fn is_area(&self) -> bool {
        matches!(self.kind, GeometryKind::Polygon | GeometryKind::MultiPolygon)
    }

    /// The outer boundary ring, if any
    pub fn outer(&self) -> Option<&[GeoPoint]> {
        self.rings.first().map(|r| r.as_slice())
    }

    /// The hole rings (empty slice if there are none)
    pub fn holes(&self) -> &[Vec<GeoPoint>] {
        if self.rings.len() > 1 {
            &self.rings[1..]
        } else {
            &[]
        }
    }
}

/// A parsed map feature: one OSM way, relation, or node with its tags
///
/// Relation-derived features carry negated ids, keeping them disjoint
/// from way ids within a single `i64` id space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub tags: Tags,
    pub geometry: FeatureGeometry,
}

impl Feature {
    /// Carries a `building` tag
    pub fn is_building(&self) -> bool {
        self.tags.has("building")
    }

    /// Carries a `building:part` tag (possibly alongside `building`)
    pub fn is_building_part(&self) -> bool {
        self.tags.has("building:part")
    }

    /// Tagged as a roof-only part
    pub fn is_roof_part(&self) -> bool {
        self.tags.is_value("building:part", "roof")
    }
}
