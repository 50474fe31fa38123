//! Roomcraft Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roomcraft_engine::api;
use roomcraft_engine::app::{App, Repositories};
use roomcraft_engine::config::{load_dotenv, EngineConfig, LocationBackend};
use roomcraft_engine::infrastructure::{
    clock::SystemClock,
    importers::LocationSeedImporter,
    ports::{ClockPort, LocationRepo},
    postgrest::PostgrestLocationRepo,
    realtime::InProcessRealtime,
    sqlite::SqliteRepositories,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv(
        &std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join(".."),
    );

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roomcraft_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Roomcraft Engine");

    let config = EngineConfig::from_env()?;
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    // Designer profiles always live in SQLite; locations may come from the hosted backend.
    let sqlite = SqliteRepositories::connect(&config.database_path, clock.clone()).await?;
    let location: Arc<dyn LocationRepo> = match &config.location_backend {
        LocationBackend::Sqlite => sqlite.location.clone(),
        LocationBackend::Postgrest { url, api_key } => {
            tracing::info!(url = %url, "Using hosted location backend");
            Arc::new(PostgrestLocationRepo::new(url, api_key))
        }
    };

    let repositories = Repositories {
        location,
        designer: sqlite.designer.clone(),
        realtime: Arc::new(InProcessRealtime::new()),
        clock,
    };

    if let Some(seed_path) = &config.location_seed_path {
        LocationSeedImporter::new(repositories.location.clone(), repositories.clock.clone())
            .import_file(seed_path)
            .await?;
    }

    tracing::info!(
        ttl_secs = config.location_cache_ttl.as_secs(),
        "Location listing cache configured"
    );
    let app = Arc::new(App::new(repositories, config.location_cache_ttl));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(config.cors_allowed_origins.as_deref()) {
        router = router.layer(cors);
    }

    // Start server
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn build_cors_layer(allowed_origins: Option<&str>) -> Option<CorsLayer> {
    let allowed_origins = allowed_origins?;

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if allowed_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        if origins.is_empty() {
            return None;
        }

        cors = cors.allow_origin(origins);
    }

    Some(cors)
}
