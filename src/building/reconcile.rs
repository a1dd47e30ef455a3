use std::collections::{HashMap, HashSet};

use super::HeightProfile;
use crate::{Feature, PlaneBounds, PlanePoint, Projector};

/// A footprint that passed classification, with its projected geometry
/// and resolved profile cached for the rest of the batch
#[derive(Debug, Clone)]
pub struct ClassifiedFeature {
    /// The source feature
    pub feature: Feature,
    /// Outer ring in plane coordinates
    pub outline: Vec<PlanePoint>,
    /// Hole rings in plane coordinates
    pub holes: Vec<Vec<PlanePoint>>,
    /// Axis-aligned bounds of the outline
    pub bounds: PlaneBounds,
    /// Height and appearance resolved from the tags
    pub profile: HeightProfile,
}

impl ClassifiedFeature {
    /// Height the footprint renders at, estimate included
    pub fn render_height(&self) -> f64 {
        self.profile.render_height(&self.outline)
    }

    /// Counts as a whole building during reconciliation
    fn is_base_building(&self) -> bool {
        self.feature.is_building()
    }

    fn classify(feature: Feature, projector: &Projector) -> Option<Self> {
        if !feature.is_building() && !feature.is_building_part() {
            return None;
        }
        if !feature.geometry.is_area() {
            return None;
        }

        let outer = feature.geometry.outer()?;
        if outer.len() < 3 {
            tracing::debug!(
                "Skipping malformed footprint {}: outer ring has {} points",
                feature.id,
                outer.len()
            );
            return None;
        }

        let outline = projector.ring_to_plane(outer);
        let bounds = PlaneBounds::of_ring(&outline)?;
        let holes = feature
            .geometry
            .holes()
            .iter()
            .map(|ring| projector.ring_to_plane(ring))
            .collect();
        let profile = HeightProfile::from_tags(&feature.tags);

        Some(Self {
            feature,
            outline,
            holes,
            bounds,
            profile,
        })
    }
}

/// Result of reconciling one batch of features
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Footprints that should be materialized
    pub kept: Vec<ClassifiedFeature>,
    /// Buildings dropped because their parts replace them
    pub suppressed_ids: Vec<i64>,
}

impl ReconcileOutcome {
    /// Ids of every classified footprint, kept or suppressed
    pub fn classified_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.kept
            .iter()
            .map(|c| c.feature.id)
            .chain(self.suppressed_ids.iter().copied())
    }
}

/// Reconcile buildings against their `building:part` children
///
/// Parts are matched to the smallest building whose bounds contain them
/// (roof-only parts never match). A building with at least two matched
/// parts is suppressed unless every part floats at or above the
/// building's own render height.
pub fn reconcile_batch(features: Vec<Feature>, projector: &Projector) -> ReconcileOutcome {
    let classified: Vec<ClassifiedFeature> = features
        .into_iter()
        .filter_map(|feature| ClassifiedFeature::classify(feature, projector))
        .collect();

    let building_count = classified.iter().filter(|c| c.is_base_building()).count();
    let part_count = classified.len() - building_count;

    // Attach each part to its base building
    let mut parts_by_building: HashMap<usize, Vec<usize>> = HashMap::new();
    for (part_index, part) in classified.iter().enumerate() {
        if part.is_base_building() || part.feature.is_roof_part() {
            continue;
        }

        let base = classified
            .iter()
            .enumerate()
            .filter(|(_, candidate)| {
                candidate.is_base_building() && candidate.bounds.contains(&part.bounds)
            })
            .min_by(|(_, a), (_, b)| a.bounds.area().total_cmp(&b.bounds.area()));

        if let Some((building_index, _)) = base {
            parts_by_building
                .entry(building_index)
                .or_default()
                .push(part_index);
        }
    }

    // A single part decorates its building; two or more replace it,
    // unless they all sit above the roofline
    let mut suppressed: HashSet<i64> = HashSet::new();
    for (&building_index, part_indices) in &parts_by_building {
        if part_indices.len() < 2 {
            continue;
        }

        let building = &classified[building_index];
        let roofline = building.render_height();
        let replaced = part_indices
            .iter()
            .any(|&i| classified[i].profile.min_height_m < roofline);

        if replaced {
            tracing::debug!(
                "Suppressing building {}: replaced by {} parts",
                building.feature.id,
                part_indices.len()
            );
            suppressed.insert(building.feature.id);
        }
    }

    let kept: Vec<ClassifiedFeature> = classified
        .into_iter()
        .filter(|c| !suppressed.contains(&c.feature.id))
        .collect();

    let mut suppressed_ids: Vec<i64> = suppressed.into_iter().collect();
    suppressed_ids.sort_unstable();

    tracing::debug!(
        "Reconciled batch: {} buildings, {} parts, {} suppressed",
        building_count,
        part_count,
        suppressed_ids.len()
    );

    ReconcileOutcome {
        kept,
        suppressed_ids,
    }
}
