//! HTTP handlers for the mail gateway

mod emails;
mod types;

pub use types::{AppState, HealthResponse, SendEmailResponseBody};

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use utoipa::OpenApi;

/// Configure mail routes
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(emails::routes())
        .route("/openapi.json", get(emails::openapi))
}

/// Full gateway router with state and the request size cap applied
pub fn router(state: Arc<AppState>) -> Router {
    configure_routes()
        .layer(DefaultBodyLimit::max(state.max_body_bytes()))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        emails::send_email,
        emails::health,
    ),
    components(
        schemas(
            types::SendEmailForm,
            types::SendEmailResponseBody,
            types::HealthResponse,
            mailgate_core::ProblemDetails,
        )
    ),
    tags(
        (name = "Emails", description = "Mail sending through the configured providers"),
        (name = "Health", description = "Gateway status")
    )
)]
pub struct EmailApiDoc;
