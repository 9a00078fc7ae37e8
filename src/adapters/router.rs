use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};
use tracing::warn;

use crate::{
    adapters::{
        controllers::{health_controller::HealthController, image_controller::ImageController},
        state::AppState,
    },
    domain::models::file::MAX_UPLOAD_SIZE,
};

/// Requests may exceed the file ceiling so that oversized files still reach
/// validation and get a JSON error instead of a bare 413.
const REQUEST_BODY_LIMIT: usize = 4 * MAX_UPLOAD_SIZE as usize;

fn cors_layer(method: Method, allowed_origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([method])
        .allow_headers([header::CONTENT_TYPE]);

    match allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin '{}'", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(origins)
        }
        None => layer.allow_origin(Any),
    }
}

pub fn build_router(app_state: AppState) -> Router {
    let origins = app_state.config.cors_allowed_origins.clone();

    let api_routes = Router::new()
        .route(
            "/api/images",
            get(ImageController::list_images)
                .fallback(ImageController::listing_method_not_allowed)
                .layer(cors_layer(Method::GET, origins.as_deref())),
        )
        .route(
            "/api/upload",
            post(ImageController::upload_image)
                .fallback(ImageController::upload_method_not_allowed)
                .layer(cors_layer(Method::POST, origins.as_deref())),
        )
        .route("/api/health", get(HealthController::health_check))
        .layer(DefaultBodyLimit::max(REQUEST_BODY_LIMIT));

    let mut router = Router::new()
        .merge(api_routes)
        .nest_service("/uploads", ServeDir::new(&app_state.config.uploads_dir));

    if let Some(static_dir) = &app_state.config.static_dir {
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    router.with_state(app_state)
}
