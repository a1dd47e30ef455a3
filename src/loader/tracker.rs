use std::collections::HashSet;

use crate::{BoundingBox, TileId};

/// Bookkeeping of which tiles have been requested
///
/// A tile is marked the moment it is claimed, before any fetch happens,
/// so every tile is requested at most once regardless of how the fetch
/// turns out.
#[derive(Debug)]
pub struct TileTracker {
    zoom: u8,
    loaded: HashSet<u64>,
}

impl TileTracker {
    /// Create an empty tracker for one zoom level
    pub fn new(zoom: u8) -> Self {
        Self {
            zoom,
            loaded: HashSet::new(),
        }
    }

    /// The zoom level this tracker operates at
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Whether the tile has already been claimed
    pub fn is_loaded(&self, tile: TileId) -> bool {
        self.loaded.contains(&tile.key())
    }

    /// Claim a single tile; true if it was not claimed before
    pub fn mark(&mut self, tile: TileId) -> bool {
        self.loaded.insert(tile.key())
    }

    /// Number of claimed tiles
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Whether no tile has been claimed yet
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Claim every unclaimed tile in the rectangle covering the given
    /// radius around a fractional tile position
    ///
    /// Returns the union of the newly claimed tiles' geographic bounds,
    /// or `None` when the rectangle was already fully claimed. Columns
    /// wrap around the date line; rows clamp at the poles.
    pub fn claim_region(
        &mut self,
        center_x: f64,
        center_y: f64,
        radius_tiles: f64,
    ) -> Option<BoundingBox> {
        let n = 1i64 << self.zoom;

        let x_min = (center_x - radius_tiles).floor() as i64;
        let mut x_max = (center_x + radius_tiles).floor() as i64;
        if x_max - x_min + 1 > n {
            // The rectangle circles the globe; one pass is enough
            x_max = x_min + n - 1;
        }

        let y_min = ((center_y - radius_tiles).floor() as i64).max(0);
        let y_max = ((center_y + radius_tiles).floor() as i64).min(n - 1);

        let mut union: Option<BoundingBox> = None;
        let mut claimed = 0usize;

        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let tile = TileId::wrapped(x, y, self.zoom);
                if !self.mark(tile) {
                    continue;
                }
                claimed += 1;
                let bounds = tile.bounds();
                union = Some(match union {
                    Some(current) => current.union(&bounds),
                    None => bounds,
                });
            }
        }

        if claimed > 0 {
            tracing::debug!(
                "Claimed {} new tiles around ({:.2}, {:.2}) at zoom {}",
                claimed,
                center_x,
                center_y,
                self.zoom
            );
        }

        union
    }
}
