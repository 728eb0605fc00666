use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, HttpConfig};
use crate::handlers::{events, health_check};
use crate::state::AppState;

fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(events::create_event))
        .route("/upload-image", post(events::upload_image))
        .route("/list", get(events::list_events))
        .route("/my-events", get(events::my_events))
        .route(
            "/:id",
            get(events::event_detail).put(events::update_event),
        )
        .route("/:id/status", put(events::update_status))
}

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/event", event_routes())
        .layer(DefaultBodyLimit::max(http.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(http.production))
        .layer(create_cors_layer(http.cors_allowed_origins.as_deref()))
        .with_state(state)
}
