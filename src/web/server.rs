use axum::http::HeaderValue;
use axum::{routing::get, Router};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::altitude::{SeriesAssembler, Sgp4Propagator};
use crate::source::{self, TleCatalog};

use super::api::altitude as altitude_handlers;
use super::api::health as health_handlers;
use super::api_doc::ApiDoc;
use super::config::Config;
use super::state::AppState;

pub async fn run_server(config: Config) -> std::io::Result<()> {
    let bind_addr = config
        .bind_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    let catalog = match TleCatalog::open(config.tle.folder.clone()) {
        Ok(catalog) => catalog,
        Err(e) => {
            log::warn!("Failed to initialize TLE catalog: {}", e);
            TleCatalog::new(config.tle.folder.clone())
        }
    };
    if catalog.is_empty() {
        log::warn!(
            "No element sets in {}, every request will return 404",
            catalog.folder().display()
        );
    }
    let catalog = Arc::new(RwLock::new(catalog));

    if let Some(interval) = config.tle.reload_interval {
        spawn_reload(catalog.clone(), interval);
    }

    let cors = cors_layer(&config.web.allowed_origins);
    let state = AppState {
        config: Arc::new(config),
        source: catalog,
        assembler: SeriesAssembler::new(Arc::new(Sgp4Propagator::new())),
    };

    let app = Router::new()
        .route("/health", get(health_handlers::health))
        .route("/altitude", get(altitude_handlers::altitude))
        // OpenAPI / Swagger
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    log::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

fn spawn_reload(catalog: Arc<RwLock<TleCatalog>>, interval: Duration) {
    log::info!(
        "Reloading TLE catalog every {}",
        humantime::format_duration(interval)
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick fires immediately and the catalog is already loaded
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let catalog = catalog.clone();
            match tokio::task::spawn_blocking(move || source::refresh(&catalog)).await {
                Ok(Ok(count)) => log::debug!("TLE catalog refreshed ({} element sets)", count),
                Ok(Err(e)) => log::warn!("TLE catalog refresh failed, keeping old data: {}", e),
                Err(e) => log::error!("TLE catalog refresh task failed: {}", e),
            }
        }
    });
}
