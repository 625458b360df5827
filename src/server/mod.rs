pub mod handlers;
pub mod types;

use crate::{
    Result,
    config::{Config, ServerConfig},
    inference::HttpInferenceBackend,
    store::MenuStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{delete, get, post},
};
use handlers::AppState;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/infer-menu", post(handlers::infer_menu))
        .route(
            "/api/menu",
            get(handlers::list_menu).post(handlers::create_menu_item),
        )
        .route("/api/menu/import", post(handlers::import_menu))
        .route("/api/menu/:id", delete(handlers::delete_menu_item))
        .route(
            "/api/orders",
            get(handlers::order_summary).delete(handlers::clear_order),
        )
        .route(
            "/api/orders/selections",
            post(handlers::select_item).delete(handlers::deselect_item),
        )
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub async fn run(config: Config) -> Result<()> {
    let store = MenuStore::new(&config.server.database_path).await?;
    let backend = HttpInferenceBackend::from_config(&config.backend)?;
    info!("Forwarding menu inference to {}", backend.endpoint());

    let app_state = AppState {
        backend: Arc::new(backend),
        store: Arc::new(store),
    };
    let app = router(app_state, &config.server);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
