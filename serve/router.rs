use axum::Router;
use axum::routing::post;
use tower_http::cors::CorsLayer;

use super::handlers::{self, AppState};

/// The whole HTTP surface: one prediction route, with and without the trailing slash
/// the bundled front end posts to.
pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/predict", post(handlers::predict))
        .route("/predict/", post(handlers::predict))
        .layer(cors)
        .with_state(state)
}
