use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{FeatureBatch, FeatureProvider, FetchMetadata, ProviderCapabilities};
use crate::{
    BoundingBox, EngineConfig, FeatureParser, GeoPoint, Origin, OsmBuildingsError, Result,
};

/// Mock provider for testing and development
///
/// Serves predefined Overpass-style JSON regardless of the requested
/// bounding box. Clones share the fetch counter and the adopted timeout,
/// so a test can keep a handle while the loader owns the provider.
#[derive(Clone)]
pub struct MockProvider {
    /// Predefined data to return
    mock_data: String,
    /// Simulated delay for network requests
    simulated_delay: Option<Duration>,
    /// Whether to simulate failures
    simulate_failure: bool,
    /// Number of fetch_features calls served or failed
    fetch_calls: Arc<AtomicUsize>,
    /// Timeout adopted from the loader configuration (0 = none yet)
    applied_timeout: Arc<AtomicU64>,
}

impl MockProvider {
    /// Create a new mock provider with default test data
    pub fn new() -> Self {
        Self::with_data(Self::default_test_data())
    }

    /// Create a mock provider with custom data
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            mock_data: data.into(),
            simulated_delay: None,
            simulate_failure: false,
            fetch_calls: Arc::new(AtomicUsize::new(0)),
            applied_timeout: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Add a simulated network delay (useful for testing loading states)
    ///
    /// Sleeping needs an async timer, so the delay only takes effect
    /// when the `tokio` feature is enabled; otherwise it is skipped.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = Some(delay);
        self
    }

    /// Configure the provider to simulate failures
    pub fn with_failure(mut self) -> Self {
        self.simulate_failure = true;
        self
    }

    /// How many times fetch_features has been called
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// The timeout adopted through apply_config, once a loader has run it
    pub fn applied_timeout_seconds(&self) -> Option<u64> {
        match self.applied_timeout.load(Ordering::SeqCst) {
            0 => None,
            seconds => Some(seconds),
        }
    }

    /// Get default test data: one building, one road, one point of interest
    fn default_test_data() -> String {
        r#"{
  "version": 0.6,
  "generator": "Mock Provider v1.0",
  "elements": [
    {
      "type": "way",
      "id": 123456789,
      "nodes": [1001, 1002, 1003, 1004, 1001],
      "tags": {
        "building": "residential",
        "height": "12",
        "addr:street": "Mock Street",
        "addr:housenumber": "42"
      },
      "geometry": [
        {"lat": 52.5200, "lon": 13.4050},
        {"lat": 52.5205, "lon": 13.4050},
        {"lat": 52.5205, "lon": 13.4058},
        {"lat": 52.5200, "lon": 13.4058},
        {"lat": 52.5200, "lon": 13.4050}
      ]
    },
    {
      "type": "way",
      "id": 987654321,
      "nodes": [2001, 2002],
      "tags": {
        "highway": "residential",
        "name": "Mock Street"
      },
      "geometry": [
        {"lat": 52.5198, "lon": 13.4045},
        {"lat": 52.5208, "lon": 13.4062}
      ]
    },
    {
      "type": "node",
      "id": 4001,
      "lat": 52.5202,
      "lon": 13.4054,
      "tags": {
        "amenity": "cafe",
        "name": "Mock Cafe"
      }
    }
  ]
}"#
        .to_string()
    }
}

#[async_trait]
impl FeatureProvider for MockProvider {
    fn provider_type(&self) -> &'static str {
        "mock"
    }

    fn apply_config(&mut self, config: &EngineConfig) {
        self.applied_timeout
            .store(config.timeout_seconds, Ordering::SeqCst);
    }

    async fn fetch_features(&self, bbox: &BoundingBox) -> Result<FeatureBatch> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.simulated_delay {
            tracing::debug!("Simulating network delay: {:?}", delay);
            #[cfg(feature = "tokio")]
            tokio::time::sleep(delay).await;
        }

        if self.simulate_failure {
            return Err(OsmBuildingsError::Network(crate::NetworkError::Connection {
                message: "Simulated network failure".to_string(),
            }));
        }

        let features = FeatureParser.parse(&self.mock_data)?;

        let metadata = FetchMetadata::new("mock-provider", self.provider_type())
            .with_element_count(features.len() as u32)
            .with_processing_time(
                self.simulated_delay
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(1),
            )
            .with_extra("simulated", "true")
            .with_extra("test_data", "true");

        tracing::debug!(
            "Mock provider returning {} features for bbox {},{},{},{}",
            features.len(),
            bbox.south,
            bbox.west,
            bbox.north,
            bbox.east
        );

        Ok(FeatureBatch {
            features,
            bounding_box: bbox.clone(),
            metadata,
        })
    }

    async fn resolve_origin(&self, origin: &Origin) -> Result<GeoPoint> {
        match origin {
            Origin::Point { lat, lon } => Ok(GeoPoint::new(*lat, *lon)),
            Origin::Place { name } => {
                // Mock geocoding for common test places
                let point = match name.to_lowercase().as_str() {
                    "berlin" => GeoPoint::new(52.52, 13.405),
                    "munich" | "münchen" => GeoPoint::new(48.137, 11.575),
                    "hamburg" => GeoPoint::new(53.551, 9.994),
                    "test" | "testcity" | "mock" => GeoPoint::new(52.52, 13.405),
                    _ => {
                        return Err(OsmBuildingsError::Geographic(format!(
                            "Mock provider doesn't know place: '{}'. Try: berlin, munich, hamburg, or test",
                            name
                        )));
                    }
                };
                Ok(point)
            }
        }
    }

    async fn test_availability(&self) -> Result<()> {
        if self.simulate_failure {
            Err(OsmBuildingsError::Geographic(
                "Mock failure enabled".to_string(),
            ))
        } else {
            tracing::debug!("Mock provider is always available");
            Ok(())
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_real_time: false,
            requires_network: false,
            supports_geocoding: true,
            max_area_km2: None, // No limits for mock data
            rate_limit_rpm: None,
            notes: Some("Mock provider for testing, serves canned data".to_string()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}
