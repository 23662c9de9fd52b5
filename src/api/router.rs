//! HTTP router. All routes are nested under `/api/`.
//!
//! No authentication layer: the service fronts a trusted gateway. CORS is
//! permissive for the web client.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config::MAX_REQUEST_BYTES;
use crate::core_state::CoreState;

pub fn api_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    build_router(ctx)
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/patients", post(endpoints::patients::create))
        .route("/patients/:id", get(endpoints::patients::detail))
        .route("/patients/:id", put(endpoints::patients::update))
        .route("/doctors", get(endpoints::doctors::list))
        .route("/doctors", post(endpoints::doctors::create))
        .route("/doctors/:id", get(endpoints::doctors::detail))
        .route("/appointments", post(endpoints::appointments::create))
        .route("/appointments", get(endpoints::appointments::list))
        .route("/appointments/:id", get(endpoints::appointments::detail))
        .route(
            "/appointments/:id/status",
            patch(endpoints::appointments::update_status),
        )
        .route("/prescriptions", post(endpoints::prescriptions::create))
        .route("/prescriptions", get(endpoints::prescriptions::list))
        .route("/prescriptions/:id", get(endpoints::prescriptions::detail))
        .route(
            "/prescriptions/:id",
            delete(endpoints::prescriptions::delete),
        )
        .route("/prescriptions/:id/pdf", get(endpoints::prescriptions::pdf))
        .route("/documents", post(endpoints::documents::upload))
        .route("/documents", get(endpoints::documents::list))
        .route("/documents/:id", delete(endpoints::documents::delete))
        .route("/chat/send", post(endpoints::chat::send))
        .route("/chat/conversations", get(endpoints::chat::conversations))
        .route(
            "/chat/conversations/:id",
            get(endpoints::chat::conversation),
        )
        .route("/chat/suggestions", get(endpoints::chat::suggestions))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        // Raised above axum's 2 MB default so base64-encoded uploads reach
        // the handler's decoded-size check.
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(CorsLayer::permissive())
}
