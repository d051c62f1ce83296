pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // API routes
        .nest("/api", api_routes(app_state.clone()))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/notices", notice_routes(state))
}

fn notice_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::notices::feed).post(handlers::notices::create))
        .route("/targets", get(handlers::notices::targets))
        .route(
            "/:id",
            get(handlers::notices::get)
                .put(handlers::notices::update)
                .delete(handlers::notices::delete),
        )
        .route("/:id/reactions", post(handlers::notices::react))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::viewer::require_viewer,
        ))
}
