mod config;
mod handler;
mod transform;
mod upload;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::ServiceConfig;
use listing_core::Normalizer;

#[derive(Clone)]
pub struct AppState {
    pub normalizer: Normalizer,
    pub config: Arc<ServiceConfig>,
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handler::root))
        .route("/health", get(handler::health))
        .route("/process", post(handler::process))
        .route("/download", post(handler::download))
        .route("/preview", post(handler::preview))
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_processor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let profiles = match config.load_profiles() {
        Ok(profiles) => profiles,
        Err(e) => {
            tracing::error!(error = %e, "failed to load platform profiles");
            std::process::exit(1);
        }
    };
    tracing::info!(
        platforms = ?profiles.ids().collect::<Vec<_>>(),
        default = %profiles.default_profile().id,
        "platform profiles loaded"
    );

    let listen_addr = config.listen_addr.clone();
    let state = AppState {
        normalizer: Normalizer::new(Arc::new(profiles)),
        config: Arc::new(config),
    };

    let listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %listen_addr, "listing-processor listening");
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
