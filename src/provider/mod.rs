mod mock;
#[cfg(feature = "overpass")]
mod overpass;
mod static_file;

pub use mock::*;
#[cfg(feature = "overpass")]
pub use overpass::*;
pub use static_file::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BoundingBox, EngineConfig, Feature, GeoPoint, Origin, Result};

/// A batch of parsed map features returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureBatch {
    /// Parsed features, unfiltered
    pub features: Vec<Feature>,
    /// The bounding box that was actually fetched
    pub bounding_box: BoundingBox,
    /// Metadata about the request
    pub metadata: FetchMetadata,
}

/// Metadata about a feature fetch request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchMetadata {
    /// Timestamp when data was fetched
    pub timestamp: String,
    /// Data source (e.g., "overpass-api.de", "mock")
    pub source: String,
    /// Provider type identifier
    pub provider_type: String,
    /// Number of raw elements returned
    pub element_count: Option<u32>,
    /// Processing time in milliseconds
    pub processing_time_ms: Option<u64>,
    /// Additional metadata from the API/source
    pub extra: HashMap<String, String>,
}

impl FetchMetadata {
    /// Create new metadata with basic information
    pub fn new(source: impl Into<String>, provider_type: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: source.into(),
            provider_type: provider_type.into(),
            element_count: None,
            processing_time_ms: None,
            extra: HashMap::new(),
        }
    }

    /// Set the number of raw elements
    pub fn with_element_count(mut self, count: u32) -> Self {
        self.element_count = Some(count);
        self
    }

    /// Set the processing time
    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = Some(ms);
        self
    }

    /// Add extra metadata
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Trait for providing building footprint data from various sources
///
/// This trait abstracts the data source, allowing for different implementations
/// such as HTTP APIs, local files, or mock data for testing.
#[async_trait]
pub trait FeatureProvider: Send + Sync {
    /// Get the provider type identifier (e.g., "overpass", "mock")
    fn provider_type(&self) -> &'static str;

    /// Adopt engine-level settings the provider cares about
    ///
    /// The loader calls this once when it takes ownership of the
    /// provider. The default implementation ignores the configuration;
    /// network providers pick up the request timeout from it.
    fn apply_config(&mut self, _config: &EngineConfig) {}

    /// Fetch all building-relevant features inside the given bounding box
    ///
    /// Implementations should:
    /// - Make appropriate API calls or retrieve cached data
    /// - Parse raw responses into `Feature` values
    /// - Return the batch with proper metadata
    async fn fetch_features(&self, bbox: &BoundingBox) -> Result<FeatureBatch>;

    /// Resolve an origin to a concrete coordinate pair
    ///
    /// Explicit coordinates pass through unchanged; place names typically
    /// involve geocoding.
    async fn resolve_origin(&self, origin: &Origin) -> Result<GeoPoint>;

    /// Test connectivity/availability of the data source
    ///
    /// This might ping an API, check file presence, or validate configuration
    async fn test_availability(&self) -> Result<()>;

    /// Get provider-specific capabilities and limitations
    fn capabilities(&self) -> ProviderCapabilities;
}

/// Describes the capabilities and limitations of a feature provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCapabilities {
    /// Whether this provider supports real-time data fetching
    pub supports_real_time: bool,
    /// Whether this provider requires internet connectivity
    pub requires_network: bool,
    /// Whether this provider supports geocoding (place name resolution)
    pub supports_geocoding: bool,
    /// Maximum recommended bounding box area in square kilometers
    pub max_area_km2: Option<f64>,
    /// Rate limiting information (requests per minute)
    pub rate_limit_rpm: Option<u32>,
    /// Additional notes about the provider
    pub notes: Option<String>,
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self {
            supports_real_time: false,
            requires_network: false,
            supports_geocoding: false,
            max_area_km2: None,
            rate_limit_rpm: None,
            notes: None,
        }
    }
}

/// Provider factory for creating different types of feature providers
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create an Overpass API provider with default settings
    #[cfg(feature = "overpass")]
    pub fn overpass() -> OverpassProvider {
        OverpassProvider::new()
    }

    /// Create an Overpass API provider with custom endpoint
    #[cfg(feature = "overpass")]
    pub fn overpass_with_url(url: impl Into<String>) -> OverpassProvider {
        OverpassProvider::with_base_url(url)
    }

    /// Create a mock provider for testing
    pub fn mock() -> MockProvider {
        MockProvider::new()
    }

    /// Create a mock provider with predefined data
    pub fn mock_with_data(data: impl Into<String>) -> MockProvider {
        MockProvider::with_data(data)
    }

    /// Create a provider serving a local GeoJSON or Overpass JSON document
    pub fn static_file(path: impl AsRef<std::path::Path>) -> Result<StaticFileProvider> {
        StaticFileProvider::open(path)
    }

    /// Get a list of provider types constructible by name
    pub fn available_providers() -> Vec<&'static str> {
        let mut providers = vec!["mock"];
        #[cfg(feature = "overpass")]
        providers.insert(0, "overpass");
        providers
    }

    /// Create a provider by name with default settings
    pub fn create_provider(name: &str) -> Result<Box<dyn FeatureProvider>> {
        match name {
            #[cfg(feature = "overpass")]
            "overpass" => Ok(Box::new(Self::overpass())),
            "mock" => Ok(Box::new(Self::mock())),
            _ => Err(crate::OsmBuildingsError::Config(format!(
                "Unknown provider: '{}'. Available providers: {:?}",
                name,
                Self::available_providers()
            ))),
        }
    }
}
