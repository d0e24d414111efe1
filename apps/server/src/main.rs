// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GeoLayers Server - GeoJSON to 3D render layers.
//!
//! Each GeoJSON FeatureCollection posted to `/toLayers` becomes one
//! renderable layer (building extrusions, a ground surface or flat
//! triangles) plus its feature attributes projected onto the mesh vertices.
//!
//! # Endpoints
//!
//! - `GET /` - Service information
//! - `GET /api/v1/health` - Health check
//! - `GET /live` - Liveness check
//! - `POST /toLayers` - Convert GeoJSON collections into layers

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use geolayers_geometry::{MeshGenerator, UrbanMesher};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    decompression::RequestDecompressionLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod types;

use config::{Config, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug,geolayers_server=debug";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn MeshGenerator>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(config.log_format);

    tracing::info!(
        port = config.port,
        max_body_size_mb = config.max_body_size_mb,
        request_timeout_secs = config.request_timeout_secs,
        worker_threads = config.worker_threads,
        partial_results = config.partial_results,
        "Starting GeoLayers Server"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        generator: Arc::new(UrbanMesher::default()),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app(state)).await.context("Server error")?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }
}

/// Build the router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let config = Arc::clone(&state.config);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health checks
        .route("/api/v1/health", get(routes::health::check))
        .route("/live", get(routes::health::live))
        // Layer conversion
        .route("/toLayers", post(routes::layers::to_layers))
        // Middleware
        .layer(DefaultBodyLimit::max(config.max_body_bytes()))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::CONTENT_ENCODING])
}
