//! HTTP router for the browser client.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the API router with every endpoint under `/api/`.
pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let routes = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/auth/session",
            get(endpoints::auth::session).put(endpoints::auth::report_state),
        )
        .route("/auth/google", post(endpoints::auth::google))
        .route("/auth/email", post(endpoints::auth::email))
        .route("/auth/logout", post(endpoints::auth::logout))
        .route("/chat/:flow", get(endpoints::chat::view))
        .route("/chat/:flow/input", put(endpoints::chat::set_input))
        .route("/chat/:flow/send", post(endpoints::chat::send))
        .route("/chat/:flow/reset", post(endpoints::chat::reset))
        .route("/clinician/patient", put(endpoints::chat::select_patient))
        .route("/dashboard", get(endpoints::dashboard::overview))
        .with_state(ctx);

    Router::new()
        .nest("/api", routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
