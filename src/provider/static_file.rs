use async_trait::async_trait;
use std::path::Path;

use super::{FeatureBatch, FeatureProvider, FetchMetadata, ProviderCapabilities};
use crate::{BoundingBox, Feature, FeatureParser, GeoPoint, Origin, OsmBuildingsError, Result};

/// Provider serving a local GeoJSON or Overpass JSON document
///
/// The document is read and parsed once at construction and the same
/// features are served for every requested bounding box. The format is
/// detected from the document content.
pub struct StaticFileProvider {
    /// Where the data came from (path or label)
    source: String,
    /// Parsed features from the document
    features: Vec<Feature>,
    /// Optional bounding box override
    known_bbox: Option<BoundingBox>,
    /// Envelope of the document's geometry, if any
    envelope: Option<BoundingBox>,
}

impl StaticFileProvider {
    /// Load and parse a document from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OsmBuildingsError::Config(format!("Failed to read file '{}': {}", path.display(), e))
        })?;

        Self::from_document(path.display().to_string(), &raw)
    }

    /// Parse an in-memory document, labelled with its source
    pub fn from_document(source: impl Into<String>, raw: &str) -> Result<Self> {
        let source = source.into();
        let features = FeatureParser.parse(raw)?;
        let envelope = Self::envelope_of(&features);

        tracing::debug!(
            "Loaded {} features from static document '{}'",
            features.len(),
            source
        );

        Ok(Self {
            source,
            features,
            known_bbox: None,
            envelope,
        })
    }

    /// Set a known bounding box for the document data
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.known_bbox = Some(bbox);
        self
    }

    /// Number of features in the document
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Envelope of all feature geometry in the document
    fn envelope_of(features: &[Feature]) -> Option<BoundingBox> {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;

        for feature in features {
            for ring in &feature.geometry.rings {
                for point in ring {
                    min_lat = min_lat.min(point.lat);
                    max_lat = max_lat.max(point.lat);
                    min_lon = min_lon.min(point.lon);
                    max_lon = max_lon.max(point.lon);
                }
            }
        }

        if min_lat.is_finite() {
            Some(BoundingBox::new(min_lat, min_lon, max_lat, max_lon))
        } else {
            None
        }
    }

    fn served_bbox(&self, requested: &BoundingBox) -> BoundingBox {
        self.known_bbox
            .clone()
            .or_else(|| self.envelope.clone())
            .unwrap_or_else(|| requested.clone())
    }
}

#[async_trait]
impl FeatureProvider for StaticFileProvider {
    fn provider_type(&self) -> &'static str {
        "static-file"
    }

    async fn fetch_features(&self, bbox: &BoundingBox) -> Result<FeatureBatch> {
        let metadata = FetchMetadata::new(&self.source, self.provider_type())
            .with_element_count(self.features.len() as u32)
            .with_extra("static", "true");

        tracing::debug!(
            "Static provider serving {} features for bbox {},{},{},{}",
            self.features.len(),
            bbox.south,
            bbox.west,
            bbox.north,
            bbox.east
        );

        Ok(FeatureBatch {
            features: self.features.clone(),
            bounding_box: self.served_bbox(bbox),
            metadata,
        })
    }

    /// Resolve an origin against the document
    ///
    /// Explicit coordinates pass through. Place names cannot be geocoded
    /// offline, so they anchor at the center of the document's geometry.
    async fn resolve_origin(&self, origin: &Origin) -> Result<GeoPoint> {
        match origin {
            Origin::Point { lat, lon } => Ok(GeoPoint::new(*lat, *lon)),
            Origin::Place { name } => {
                let envelope = self.known_bbox.clone().or_else(|| self.envelope.clone());
                match envelope {
                    Some(bbox) => {
                        tracing::debug!(
                            "Static provider cannot geocode '{}', anchoring at document center",
                            name
                        );
                        Ok(bbox.center())
                    }
                    None => Err(OsmBuildingsError::Geographic(format!(
                        "Cannot resolve '{}': document '{}' contains no geometry",
                        name, self.source
                    ))),
                }
            }
        }
    }

    async fn test_availability(&self) -> Result<()> {
        tracing::debug!("Static provider data is already in memory");
        Ok(())
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_real_time: false,
            requires_network: false,
            supports_geocoding: false,
            max_area_km2: None,
            rate_limit_rpm: None,
            notes: Some("Local file-based building data".to_string()),
        }
    }
}
