use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber;

use osm_building_tiles::{
    Building3D, EngineConfig, FeatureProvider, MockProvider, PlanePoint, ProviderFactory,
    WorldLoader,
};

#[derive(Parser)]
#[command(name = "osm-city-dump")]
#[command(about = "Load OSM buildings around an origin and dump their 3D geometry")]
struct Args {
    /// Place name to load buildings for (geocoded by the provider)
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    place: Option<String>,

    /// Origin latitude in degrees
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Origin longitude in degrees
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Data provider: overpass, mock, static-file
    #[arg(long, default_value = "overpass")]
    provider: String,

    /// OSM document to serve when using the static-file provider
    #[arg(short, long)]
    file: Option<String>,

    /// Tile zoom level
    #[arg(short, long, default_value = "17")]
    zoom: u8,

    /// Streaming radius around the viewpoint in meters
    #[arg(short, long, default_value = "500")]
    radius: f64,

    /// Fetch timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Walk this many meters east after the initial load, streaming as we go
    #[arg(short, long)]
    walk: Option<f64>,

    /// Write all loaded buildings to a JSON file
    #[arg(short, long)]
    output: Option<String>,

    /// Simulate network delay (for mock provider, in milliseconds)
    #[arg(long)]
    delay: Option<u64>,

    /// Test provider availability only
    #[arg(short, long)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn print_buildings(buildings: &[Building3D]) {
    info!(
        "{:>12}  {:>7}  {:>7}  {:>8}  {:>9}  {:>9}  color",
        "id", "base_m", "top_m", "shape", "vertices", "triangles"
    );
    for building in buildings {
        info!(
            "{:>12}  {:>7.1}  {:>7.1}  {:>8}  {:>9}  {:>9}  {}",
            building.id,
            building.min_height_m,
            building.height_m,
            format!("{:?}", building.shape),
            building.mesh.vertex_count(),
            building.mesh.triangle_count(),
            building.color
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🌍 OSM city dump starting...");
    info!("🔌 Provider: {}", args.provider);
    info!("🔎 Zoom: {} / radius: {:.0}m", args.zoom, args.radius);

    // Create the appropriate provider
    let provider: Box<dyn FeatureProvider> = match args.provider.as_str() {
        "overpass" => Box::new(ProviderFactory::overpass()),
        "mock" => {
            let mut mock_provider = MockProvider::new();
            if let Some(delay_ms) = args.delay {
                mock_provider =
                    mock_provider.with_delay(std::time::Duration::from_millis(delay_ms));
            }
            Box::new(mock_provider)
        }
        "static-file" => {
            let path = args
                .file
                .as_deref()
                .ok_or_else(|| "static-file provider needs --file".to_string())?;
            let static_provider =
                ProviderFactory::static_file(path).map_err(|e| e.to_string())?;
            info!(
                "📄 Serving {} features from {}",
                static_provider.feature_count(),
                path
            );
            Box::new(static_provider)
        }
        _ => {
            error!(
                "Unknown provider: {}. Available providers: {:?}",
                args.provider,
                ProviderFactory::available_providers()
            );
            return Err("Invalid provider".to_string());
        }
    };

    // Show provider capabilities
    let capabilities = provider.capabilities();
    info!("🔧 Provider capabilities:");
    info!("  - Real-time data: {}", capabilities.supports_real_time);
    info!("  - Requires network: {}", capabilities.requires_network);
    info!(
        "  - Supports geocoding: {}",
        capabilities.supports_geocoding
    );
    if let Some(max_area) = capabilities.max_area_km2 {
        info!("  - Max area: {:.1} km²", max_area);
    }
    if let Some(rate_limit) = capabilities.rate_limit_rpm {
        info!("  - Rate limit: {} requests/minute", rate_limit);
    }
    if let Some(notes) = &capabilities.notes {
        info!("  - Notes: {}", notes);
    }

    if args.test {
        info!("🔍 Testing provider availability...");
        match provider.test_availability().await {
            Ok(()) => {
                info!("✅ Provider is available!");
                return Ok(());
            }
            Err(e) => {
                error!("❌ Provider test failed: {}", e);
                return Err(e.to_string());
            }
        }
    }

    // Build the engine configuration
    let config = match (&args.place, args.lat, args.lon) {
        (Some(place), _, _) => {
            info!("📍 Origin: '{}' (geocoded)", place);
            EngineConfig::for_place(place)
        }
        (None, Some(lat), Some(lon)) => {
            info!("📍 Origin: {:.5}, {:.5}", lat, lon);
            EngineConfig::at(lat, lon)
        }
        _ => {
            warn!("No origin given, using the default");
            EngineConfig::default()
        }
    }
    .with_zoom(args.zoom)
    .with_radius_m(args.radius)
    .with_timeout(args.timeout);

    let mut loader = WorldLoader::from_boxed(config, provider);

    // Initial load around the origin
    info!("⬇️  Loading buildings...");
    let mut buildings = match loader.initial_load().await {
        Ok(buildings) => buildings,
        Err(e) => {
            error!("❌ Initial load failed: {}", e);
            return Err(e.to_string());
        }
    };

    let origin = loader
        .origin()
        .ok_or_else(|| "loader lost its origin".to_string())?;
    info!("🎯 Origin resolved to {:.5}, {:.5}", origin.lat, origin.lon);
    info!(
        "✅ Initial load: {} buildings from {} tiles",
        buildings.len(),
        loader.loaded_tile_count()
    );

    // Optionally walk east and stream the frontier
    if let Some(distance) = args.walk {
        let step = 100.0;
        let steps = (distance / step).ceil() as usize;
        info!("🚶 Walking {:.0}m east in {} steps...", distance, steps);

        for i in 1..=steps {
            let viewpoint = PlanePoint::new((i as f64 * step).min(distance), 0.0);
            match loader.tick(viewpoint).await {
                Ok(batch) => {
                    if !batch.is_empty() {
                        info!(
                            "  +{} buildings at x={:.0}m ({} tiles total)",
                            batch.len(),
                            viewpoint.x,
                            loader.loaded_tile_count()
                        );
                        buildings.extend(batch);
                    }
                }
                Err(e) => {
                    error!("❌ Streaming tick failed: {}", e);
                    return Err(e.to_string());
                }
            }
        }
    }

    info!(
        "📊 Loaded {} buildings / {} features seen / {} tiles claimed",
        buildings.len(),
        loader.seen_feature_count(),
        loader.loaded_tile_count()
    );

    if !buildings.is_empty() {
        let total_triangles: usize = buildings.iter().map(|b| b.mesh.triangle_count()).sum();
        let tallest = buildings
            .iter()
            .max_by(|a, b| a.height_m.total_cmp(&b.height_m));

        print_buildings(&buildings);
        info!("📐 Total triangles: {}", total_triangles);
        if let Some(tallest) = tallest {
            info!("🏙️  Tallest: {} at {:.1}m", tallest.id, tallest.height_m);
        }
    }

    // Save the geometry if requested
    if let Some(path) = &args.output {
        match serde_json::to_string_pretty(&buildings) {
            Ok(json) => match std::fs::write(path, json) {
                Ok(()) => info!("💾 Buildings saved to: {}", path),
                Err(e) => warn!("⚠️  Failed to save buildings: {}", e),
            },
            Err(e) => warn!("⚠️  Failed to serialize buildings: {}", e),
        }
    }

    info!("🎉 City dump completed successfully!");
    Ok(())
}
