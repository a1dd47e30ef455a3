use async_trait::async_trait;
use std::time::Instant;

use super::{FeatureBatch, FeatureProvider, FetchMetadata, ProviderCapabilities};
use crate::{
    BoundingBox, EngineConfig, FeatureParser, GeoPoint, NetworkError, Origin, OsmBuildingsError,
    Result,
};

/// Default request timeout when none is configured
const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Tag keys fetched for the building pipeline
const BUILDING_KEYS: [&str; 2] = ["building", "building:part"];

/// HTTP-based provider using the Overpass API
///
/// Fetches building footprints (ways and multipolygon relations tagged
/// `building` or `building:part`) with inline geometry from an Overpass
/// API endpoint.
pub struct OverpassProvider {
    /// Base URL for the Overpass API
    pub base_url: String,
    /// HTTP client for making requests
    client: reqwest::Client,
    /// User agent string for requests
    user_agent: String,
    /// Custom timeout override
    custom_timeout: Option<std::time::Duration>,
}

impl OverpassProvider {
    /// Create a new Overpass API provider with default endpoint
    ///
    /// Uses the main Overpass API instance, but you can also use:
    /// - https://lz4.overpass-api.de/api/interpreter (LZ4 compressed)
    /// - https://z.overpass-api.de/api/interpreter (Gzip compressed)
    pub fn new() -> Self {
        Self::with_base_url("https://overpass-api.de/api/interpreter")
    }

    /// Create a new provider with a custom Overpass API endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
            user_agent: format!("osm-building-tiles/{}", env!("CARGO_PKG_VERSION")),
            custom_timeout: None,
        }
    }

    /// Set a custom timeout for requests
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.custom_timeout = Some(timeout);
        self
    }

    /// Set a custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn request_timeout(&self) -> std::time::Duration {
        self.custom_timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Build an Overpass QL query for buildings inside the given bounding box
    fn build_query(&self, bbox: &BoundingBox) -> String {
        let bbox_str = format!("{},{},{},{}", bbox.south, bbox.west, bbox.north, bbox.east);
        let timeout = self.request_timeout().as_secs();

        let mut query = format!("[out:json][timeout:{}];\n(\n", timeout);

        for key in BUILDING_KEYS {
            // Footprints come from closed ways and multipolygon relations
            query.push_str(&format!("  way[\"{}\"]({});\n", key, bbox_str));
            query.push_str(&format!("  relation[\"{}\"]({});\n", key, bbox_str));
        }

        query.push_str(");\nout geom;");
        query
    }

    /// Parse element count from an Overpass JSON response
    fn parse_element_count(json_data: &str) -> Option<u32> {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_data) {
            if let Some(elements) = value.get("elements").and_then(|e| e.as_array()) {
                return Some(elements.len() as u32);
            }
        }
        None
    }
}

#[async_trait]
impl FeatureProvider for OverpassProvider {
    fn provider_type(&self) -> &'static str {
        "overpass"
    }

    fn apply_config(&mut self, config: &EngineConfig) {
        // An explicit with_timeout wins over the configured value
        if self.custom_timeout.is_none() {
            self.custom_timeout = Some(std::time::Duration::from_secs(config.timeout_seconds));
        }
    }

    async fn fetch_features(&self, bbox: &BoundingBox) -> Result<FeatureBatch> {
        let start_time = Instant::now();

        tracing::info!(
            "Fetching buildings via Overpass API for bbox: {},{},{},{}",
            bbox.south,
            bbox.west,
            bbox.north,
            bbox.east
        );

        // Validate bounding box size for Overpass API limits
        let area_km2 = bbox.area_km2();
        if area_km2 > 1000.0 {
            tracing::warn!(
                "Large area requested: {:.2} km² - this may take a while or fail",
                area_km2
            );
        }
        if area_km2 > 5000.0 {
            return Err(OsmBuildingsError::Config(format!(
                "Area too large: {:.2} km². Overpass API typically limits requests to ~1000 km²",
                area_km2
            )));
        }

        let query = self.build_query(bbox);
        tracing::debug!("Overpass query: {}", query);

        let timeout = self.request_timeout();

        let response = self
            .client
            .post(&self.base_url)
            .header("User-Agent", &self.user_agent)
            .form(&[("data", query)])
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NetworkError::Timeout {
                        seconds: timeout.as_secs(),
                    }
                } else if e.is_connect() {
                    NetworkError::Connection {
                        message: format!("Failed to connect to Overpass API: {}", e),
                    }
                } else {
                    NetworkError::Connection {
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OsmBuildingsError::Network(NetworkError::HttpError {
                status: status.as_u16(),
            }));
        }

        let raw_data = response
            .text()
            .await
            .map_err(|e| NetworkError::Connection {
                message: format!("Failed to read response: {}", e),
            })?;

        let element_count = Self::parse_element_count(&raw_data);
        let features = FeatureParser.parse(&raw_data)?;
        let processing_time = start_time.elapsed().as_millis() as u64;

        let mut metadata = FetchMetadata::new(&self.base_url, self.provider_type())
            .with_processing_time(processing_time);

        if let Some(count) = element_count {
            metadata = metadata.with_element_count(count);
        }

        metadata = metadata
            .with_extra("response_size", raw_data.len().to_string())
            .with_extra("area_km2", format!("{:.2}", area_km2))
            .with_extra(
                "bbox",
                format!("{},{},{},{}", bbox.south, bbox.west, bbox.north, bbox.east),
            );

        tracing::info!(
            "Successfully fetched {} features from {} elements, {:.2} KB, {:.1}s",
            features.len(),
            element_count.unwrap_or(0),
            raw_data.len() as f64 / 1024.0,
            processing_time as f64 / 1000.0
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
                tracing::debug!("Geocoding place: {}", name);

                let nominatim_url = format!(
                    "https://nominatim.openstreetmap.org/search?q={}&format=json&limit=1",
                    urlencoding::encode(name)
                );

                let response = self
                    .client
                    .get(&nominatim_url)
                    .header("User-Agent", &self.user_agent)
                    .send()
                    .await
                    .map_err(|e| NetworkError::Connection {
                        message: format!("Geocoding failed: {}", e),
                    })?;

                let geocode_results: Vec<serde_json::Value> =
                    response.json().await.map_err(|e| {
                        OsmBuildingsError::Parse(format!(
                            "Failed to parse geocoding response: {}",
                            e
                        ))
                    })?;

                if geocode_results.is_empty() {
                    return Err(OsmBuildingsError::Geographic(format!(
                        "Could not find place: {}",
                        name
                    )));
                }

                let result = &geocode_results[0];
                let parse_coord = |key: &str| -> Result<f64> {
                    result[key]
                        .as_str()
                        .ok_or_else(|| OsmBuildingsError::Parse(format!("Invalid {}", key)))?
                        .parse()
                        .map_err(|_| OsmBuildingsError::Parse(format!("Invalid {} format", key)))
                };

                let lat = parse_coord("lat")?;
                let lon = parse_coord("lon")?;

                tracing::debug!("Geocoded '{}' to {},{}", name, lat, lon);
                Ok(GeoPoint::new(lat, lon))
            }
        }
    }

    async fn test_availability(&self) -> Result<()> {
        tracing::debug!("Testing Overpass API availability");

        let test_query = "[out:json][timeout:5];\nnode(0,0,0.001,0.001);\nout;";

        let response = self
            .client
            .post(&self.base_url)
            .header("User-Agent", &self.user_agent)
            .form(&[("data", test_query)])
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| NetworkError::Connection {
                message: format!("Overpass API test failed: {}", e),
            })?;

        if response.status().is_success() {
            tracing::debug!("Overpass API is available");
            Ok(())
        } else {
            Err(OsmBuildingsError::Network(NetworkError::HttpError {
                status: response.status().as_u16(),
            }))
        }
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            supports_real_time: true,
            requires_network: true,
            supports_geocoding: true,
            max_area_km2: Some(1000.0), // Conservative limit for Overpass API
            rate_limit_rpm: Some(60),   // Conservative estimate
            notes: Some("Real-time building footprints via the Overpass API".to_string()),
        }
    }
}

impl Default for OverpassProvider {
    fn default() -> Self {
        Self::new()
    }
}
