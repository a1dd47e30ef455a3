use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Earth circumference along the equator in meters
pub const EQUATOR_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Earth circumference through the poles in meters
pub const POLAR_CIRCUMFERENCE_M: f64 = 40_007_863.0;

/// A point on the local ground plane, in meters relative to the origin
///
/// `x` grows east, `y` grows north. Valid only near the origin the
/// projector was built with; the equirectangular approximation drifts
/// with distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

impl PlanePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounds of a footprint in plane coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl PlaneBounds {
    /// Compute the bounds of a ring; `None` if the ring is empty
    pub fn of_ring(ring: &[PlanePoint]) -> Option<Self> {
        let first = ring.first()?;
        let mut bounds = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };
        for point in &ring[1..] {
            bounds.min_x = bounds.min_x.min(point.x);
            bounds.min_y = bounds.min_y.min(point.y);
            bounds.max_x = bounds.max_x.max(point.x);
            bounds.max_y = bounds.max_y.max(point.y);
        }
        Some(bounds)
    }

    /// Whether this box fully contains another box
    pub fn contains(&self, other: &PlaneBounds) -> bool {
        other.min_x >= self.min_x
            && other.min_y >= self.min_y
            && other.max_x <= self.max_x
            && other.max_y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.depth()
    }

    pub fn center(&self) -> PlanePoint {
        PlanePoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Converts geocoordinates to local plane coordinates around a fixed origin
///
/// Longitude deltas are scaled by the circumference of the origin's
/// latitude circle, latitude deltas by the polar circumference. The
/// per-degree factors are computed once at construction.
#[derive(Debug, Clone)]
pub struct Projector {
    base: GeoPoint,
    meters_per_deg_lon: f64,
    meters_per_deg_lat: f64,
}

impl Projector {
    /// Create a projector anchored at the given origin
    pub fn new(base: GeoPoint) -> Self {
        Self {
            base,
            meters_per_deg_lon: EQUATOR_CIRCUMFERENCE_M * base.lat.to_radians().cos() / 360.0,
            meters_per_deg_lat: POLAR_CIRCUMFERENCE_M / 360.0,
        }
    }

    /// The origin this projector is anchored at
    pub fn base(&self) -> GeoPoint {
        self.base
    }

    /// Project a single geographic point onto the plane
    pub fn to_plane(&self, point: GeoPoint) -> PlanePoint {
        PlanePoint::new(
            (point.lon - self.base.lon) * self.meters_per_deg_lon,
            (point.lat - self.base.lat) * self.meters_per_deg_lat,
        )
    }

    /// Project a whole ring onto the plane
    pub fn ring_to_plane(&self, ring: &[GeoPoint]) -> Vec<PlanePoint> {
        ring.iter().map(|p| self.to_plane(*p)).collect()
    }
}
