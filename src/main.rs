use std::net::SocketAddr;

use slideshow_service::{
    adapters::{router::build_router, state::AppState},
    domain::config::ServerConfig,
    services,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()
        .expect("ERROR: invalid configuration, check PORT, BIND_ADDRESS and UPLOADS_DIR");

    tracing::info!(
        "Starting slideshow-service, storing images in {}",
        config.uploads_dir.display()
    );

    let image_repository = services::create_image_repository(&config);

    // The directory is created on demand as well; this only surfaces problems early.
    if let Err(e) = image_repository.prepare().await {
        tracing::warn!("Uploads directory not ready yet: {}", e);
    }

    match &config.cors_allowed_origins {
        Some(origins) => tracing::info!("CORS restricted to {:?}", origins),
        // Allow all origins if not specified
        None => tracing::info!("CORS allows any origin"),
    }

    let address = SocketAddr::new(config.bind_address, config.port);
    let router = build_router(AppState::new(config, image_repository));

    // Start the server
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on {}", address);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
