use std::f64::consts::PI;

use super::EQUATOR_CIRCUMFERENCE_M;
use crate::{BoundingBox, GeoPoint};

/// Highest supported tile zoom level
///
/// Slippy-map servers top out around this level, and tile indices must
/// stay well inside the 32-bit halves of [`TileId::key`]. Configuration
/// setters clamp to it.
pub const MAX_ZOOM: u8 = 22;

/// Ground width of one tile in meters at the given latitude
///
/// Degenerates to ~0 at the poles; origins must stay away from ±90°.
pub fn tile_width_meters(lat: f64, zoom: u8) -> f64 {
    EQUATOR_CIRCUMFERENCE_M * lat.to_radians().cos() / (1u64 << zoom) as f64
}

/// Convert a geographic point to fractional slippy-tile coordinates
///
/// Integer part is the tile index, fraction the position within the tile.
pub fn geo_to_fractional_tile(point: GeoPoint, zoom: u8) -> (f64, f64) {
    let n = (1u64 << zoom) as f64;
    let lat_rad = point.lat.to_radians();

    let x = n * (point.lon + 180.0) / 360.0;
    let y = n * (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
    (x, y)
}

/// A slippy-map tile index at a fixed zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileId {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Build a tile index from possibly out-of-range coordinates
    ///
    /// `x` wraps around the date line (modulo `2^zoom`); `y` clamps to the
    /// valid row range, there is no pole wraparound.
    pub fn wrapped(x: i64, y: i64, zoom: u8) -> Self {
        let n = 1i64 << zoom;
        Self {
            x: x.rem_euclid(n) as u32,
            y: y.clamp(0, n - 1) as u32,
            zoom,
        }
    }

    /// The tile containing the given fractional tile coordinates
    pub fn from_fractional(fx: f64, fy: f64, zoom: u8) -> Self {
        Self::wrapped(fx.floor() as i64, fy.floor() as i64, zoom)
    }

    /// Single-integer packing of `(x, y)` for set membership checks
    ///
    /// Only meaningful within one zoom level; the loader never mixes zooms.
    pub fn key(&self) -> u64 {
        ((self.y as u64) << 32) | self.x as u64
    }

    /// Geographic bounds of this tile as `[south, west, north, east]`
    pub fn bounds(&self) -> BoundingBox {
        let n = (1u64 << self.zoom) as f64;

        let row_lat = |y: f64| (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
        let col_lon = |x: f64| x / n * 360.0 - 180.0;

        BoundingBox::new(
            row_lat(self.y as f64 + 1.0),
            col_lon(self.x as f64),
            row_lat(self.y as f64),
            col_lon(self.x as f64 + 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_tile_known_values() {
        // lon 0 / lat 0 sits exactly on the tile grid center
        let (x, y) = geo_to_fractional_tile(GeoPoint::new(0.0, 0.0), 1);
        assert!((x - 1.0).abs() < 1e-12);
        assert!((y - 1.0).abs() < 1e-12);

        // Zoom 0 maps the whole world into tile (0,0)
        let (x, y) = geo_to_fractional_tile(GeoPoint::new(52.52, 13.41), 0);
        assert!(x >= 0.0 && x < 1.0);
        assert!(y >= 0.0 && y < 1.0);
    }

    #[test]
    fn test_tile_roundtrip() {
        let cases = [
            (0u32, 0u32, 1u8),
            (5, 9, 4),
            (550, 335, 10),
            (70406, 42987, 17),
        ];

        for (x, y, zoom) in cases {
            let bounds = TileId::new(x, y, zoom).bounds();

            // Northwest corner recovers (x, y)
            let (fx, fy) = geo_to_fractional_tile(GeoPoint::new(bounds.north, bounds.west), zoom);
            assert!(
                (fx - x as f64).abs() < 1e-9,
                "x mismatch for ({},{},{}): {}",
                x,
                y,
                zoom,
                fx
            );
            assert!(
                (fy - y as f64).abs() < 1e-9,
                "y mismatch for ({},{},{}): {}",
                x,
                y,
                zoom,
                fy
            );

            // Southeast corner recovers (x+1, y+1)
            let (fx, fy) = geo_to_fractional_tile(GeoPoint::new(bounds.south, bounds.east), zoom);
            assert!((fx - (x + 1) as f64).abs() < 1e-9);
            assert!((fy - (y + 1) as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tile_bounds_orientation() {
        let bounds = TileId::new(550, 335, 10).bounds();
        assert!(bounds.north > bounds.south);
        assert!(bounds.east > bounds.west);
    }

    #[test]
    fn test_tile_width() {
        // Zoom 0 at the equator is the full circumference
        let width = tile_width_meters(0.0, 0);
        assert!((width - EQUATOR_CIRCUMFERENCE_M).abs() < 1e-6);

        // Berlin at zoom 17 is ~186m per tile
        let width = tile_width_meters(52.52, 17);
        assert!(
            (width - 186.0).abs() < 1.0,
            "Expected ~186m tiles, got {}",
            width
        );

        // Degenerate at the pole
        let width = tile_width_meters(90.0, 10);
        assert!(width.abs() < 1e-6);
    }

    #[test]
    fn test_wrapped_x() {
        // Date-line crossing wraps instead of going negative
        assert_eq!(TileId::wrapped(-1, 5, 4).x, 15);
        assert_eq!(TileId::wrapped(-2, 5, 4).x, 14);
        assert_eq!(TileId::wrapped(16, 5, 4).x, 0);
        assert_eq!(TileId::wrapped(17, 5, 4).x, 1);
        assert_eq!(TileId::wrapped(3, 5, 4).x, 3);
    }

    #[test]
    fn test_clamped_y() {
        // No pole wraparound: rows clamp
        assert_eq!(TileId::wrapped(3, -2, 4).y, 0);
        assert_eq!(TileId::wrapped(3, 99, 4).y, 15);
        assert_eq!(TileId::wrapped(3, 7, 4).y, 7);
    }

    #[test]
    fn test_from_fractional() {
        let tile = TileId::from_fractional(0.7, 0.3, 1);
        assert_eq!(tile, TileId::new(0, 0, 1));

        let tile = TileId::from_fractional(-0.2, 1.5, 1);
        assert_eq!(tile.x, 1); // Wrapped
        assert_eq!(tile.y, 1);
    }

    #[test]
    fn test_max_zoom_stays_in_range() {
        // The deepest supported level still wraps and packs cleanly
        let n = 1i64 << MAX_ZOOM;
        let tile = TileId::wrapped(-1, n, MAX_ZOOM);
        assert_eq!(tile.x, (n - 1) as u32);
        assert_eq!(tile.y, (n - 1) as u32);

        let bounds = tile.bounds();
        assert!(bounds.north > bounds.south);
        assert!(tile_width_meters(52.52, MAX_ZOOM) > 0.0);
    }

    #[test]
    fn test_key_distinctness() {
        let a = TileId::new(1, 2, 17).key();
        let b = TileId::new(2, 1, 17).key();
        assert_ne!(a, b);

        // Neighbors get distinct keys
        assert_ne!(TileId::new(5, 5, 17).key(), TileId::new(6, 5, 17).key());
        assert_ne!(TileId::new(5, 5, 17).key(), TileId::new(5, 6, 17).key());

        // Same coordinates give the same key
        assert_eq!(TileId::new(5, 5, 17).key(), TileId::new(5, 5, 17).key());
    }
}
