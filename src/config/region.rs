use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north
    pub lat: f64,
    /// Longitude in degrees, positive east
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Represents a geographic bounding box for feature requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Southern latitude boundary
    pub south: f64,
    /// Western longitude boundary
    pub west: f64,
    /// Northern latitude boundary
    pub north: f64,
    /// Eastern longitude boundary
    pub east: f64,
}

impl BoundingBox {
    /// Create a new bounding box from coordinates
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Get the width of the bounding box in degrees longitude
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Get the height of the bounding box in degrees latitude
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Get the approximate area in square kilometers using geographic calculations
    pub fn area_km2(&self) -> f64 {
        let center = self.center();

        let width_km = {
            let west_point = Point::new(self.west, center.lat);
            let east_point = Point::new(self.east, center.lat);
            Haversine.distance(west_point, east_point) / 1000.0
        };

        let height_km = {
            let south_point = Point::new(center.lon, self.south);
            let north_point = Point::new(center.lon, self.north);
            Haversine.distance(south_point, north_point) / 1000.0
        };

        width_km * height_km
    }

    /// Check if this bounding box contains a point
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }

    /// Smallest bounding box covering both this box and another
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.south.min(other.south),
            self.west.min(other.west),
            self.north.max(other.north),
            self.east.max(other.east),
        )
    }
}

/// Where the local coordinate origin sits on the globe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Origin {
    /// An explicit coordinate pair
    Point { lat: f64, lon: f64 },
    /// A named place that will be geocoded by the provider
    Place { name: String },
}

impl Origin {
    /// Create an origin from explicit coordinates
    pub fn point(lat: f64, lon: f64) -> Self {
        Self::Point { lat, lon }
    }

    /// Create an origin from a place name
    pub fn place(name: impl Into<String>) -> Self {
        Self::Place { name: name.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_creation() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);
        assert_eq!(bbox.south, 52.0);
        assert_eq!(bbox.west, 13.0);
        assert_eq!(bbox.north, 53.0);
        assert_eq!(bbox.east, 14.0);
    }

    #[test]
    fn test_bounding_box_center() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);
        let center = bbox.center();
        assert_eq!(center, GeoPoint::new(52.5, 13.5));

        // Non-symmetric box
        let bbox2 = BoundingBox::new(50.0, 10.0, 52.0, 15.0);
        let center2 = bbox2.center();
        assert_eq!(center2, GeoPoint::new(51.0, 12.5));
    }

    #[test]
    fn test_bounding_box_dimensions() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);
        assert_eq!(bbox.width(), 1.0);
        assert_eq!(bbox.height(), 1.0);

        let bbox2 = BoundingBox::new(50.0, 10.0, 52.5, 15.5);
        assert_eq!(bbox2.width(), 5.5);
        assert_eq!(bbox2.height(), 2.5);
    }

    #[test]
    fn test_bounding_box_contains() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);

        // Points inside
        assert!(bbox.contains(52.5, 13.5)); // Center
        assert!(bbox.contains(52.0, 13.0)); // Southwest corner
        assert!(bbox.contains(53.0, 14.0)); // Northeast corner

        // Points outside
        assert!(!bbox.contains(51.9, 13.5)); // Too far south
        assert!(!bbox.contains(52.5, 12.9)); // Too far west
        assert!(!bbox.contains(53.1, 13.5)); // Too far north
        assert!(!bbox.contains(52.5, 14.1)); // Too far east
    }

    #[test]
    fn test_bounding_box_area() {
        // Small box around Berlin
        let bbox = BoundingBox::new(52.4, 13.3, 52.6, 13.5);
        let area = bbox.area_km2();

        // Should be roughly 22km x 14km = ~308 km²
        assert!(
            area > 250.0 && area < 350.0,
            "Area should be around 308 km², got {}",
            area
        );
    }

    #[test]
    fn test_bounding_box_union() {
        let a = BoundingBox::new(52.0, 13.0, 52.5, 13.5);
        let b = BoundingBox::new(52.3, 13.3, 53.0, 14.0);
        let merged = a.union(&b);

        assert_eq!(merged.south, 52.0);
        assert_eq!(merged.west, 13.0);
        assert_eq!(merged.north, 53.0);
        assert_eq!(merged.east, 14.0);

        // Union contains both inputs
        assert!(merged.contains(a.south, a.west));
        assert!(merged.contains(b.north, b.east));
    }

    #[test]
    fn test_bounding_box_union_disjoint() {
        let a = BoundingBox::new(52.0, 13.0, 52.1, 13.1);
        let b = BoundingBox::new(52.5, 13.5, 52.6, 13.6);
        let merged = a.union(&b);

        // Union spans the gap between the inputs
        assert_eq!(merged.south, 52.0);
        assert_eq!(merged.north, 52.6);
        assert!(merged.contains(52.3, 13.3));
    }

    #[test]
    fn test_origin_creation() {
        let origin = Origin::point(52.52, 13.41);
        match origin {
            Origin::Point { lat, lon } => {
                assert_eq!(lat, 52.52);
                assert_eq!(lon, 13.41);
            }
            _ => panic!("Expected Point variant"),
        }

        let origin2 = Origin::place("Berlin");
        match origin2 {
            Origin::Place { name } => assert_eq!(name, "Berlin"),
            _ => panic!("Expected Place variant"),
        }
    }

    #[test]
    fn test_bounding_box_serialization() {
        let bbox = BoundingBox::new(52.0, 13.0, 53.0, 14.0);

        let json = serde_json::to_string(&bbox).expect("Failed to serialize");
        let deserialized: BoundingBox = serde_json::from_str(&json).expect("Failed to deserialize");

        assert_eq!(bbox, deserialized);
    }

    #[test]
    fn test_origin_serialization() {
        let origins = vec![Origin::point(52.52, 13.41), Origin::place("Berlin")];

        for origin in origins {
            let json = serde_json::to_string(&origin).expect("Failed to serialize");
            let deserialized: Origin = serde_json::from_str(&json).expect("Failed to deserialize");

            // Compare by debug representation since Origin doesn't implement PartialEq
            assert_eq!(format!("{:?}", origin), format!("{:?}", deserialized));
        }
    }

    #[test]
    fn test_bounding_box_edge_cases() {
        // Very small box
        let tiny_bbox = BoundingBox::new(52.5, 13.4, 52.5001, 13.4001);
        let area = tiny_bbox.area_km2();
        assert!(
            area > 0.0 && area < 0.01,
            "Tiny area should be very small but positive"
        );

        // Box crossing the prime meridian
        let cross_meridian = BoundingBox::new(51.0, -1.0, 52.0, 1.0);
        assert_eq!(cross_meridian.width(), 2.0);
        assert!(cross_meridian.contains(51.5, 0.0));

        // Box crossing the equator
        let cross_equator = BoundingBox::new(-1.0, 10.0, 1.0, 11.0);
        assert_eq!(cross_equator.height(), 2.0);
        assert!(cross_equator.contains(0.0, 10.5));
    }
}
