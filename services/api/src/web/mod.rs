pub mod rest;
pub mod state;

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

pub use rest::{
    claim_progress_handler, claimed_psalms_handler, create_recipient_handler,
    get_recipient_handler, health_handler, legacy_import_handler, list_participants_handler,
    list_recipients_handler, record_participation_handler, recipient_link_handler,
    selection_counts_handler, set_recipient_hidden_handler,
};
pub use state::AppState;

/// Builds the API routes. CORS and the Swagger UI are layered on by the binary.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    let recipient_routes = Router::new()
        .route(
            "/recipients",
            post(create_recipient_handler).get(list_recipients_handler),
        )
        .route("/recipients/{id}", get(get_recipient_handler))
        .route("/recipients/{id}/hidden", put(set_recipient_hidden_handler))
        .route("/recipients/{id}/link", get(recipient_link_handler));

    let selection_routes = Router::new()
        .route("/recipients/{id}/claimed", get(claimed_psalms_handler))
        .route("/recipients/{id}/counts", get(selection_counts_handler))
        .route("/recipients/{id}/progress", get(claim_progress_handler))
        .route(
            "/recipients/{id}/participants",
            get(list_participants_handler).post(record_participation_handler),
        )
        .route("/recipients/{id}/legacy-import", post(legacy_import_handler));

    Router::new()
        .route("/health", get(health_handler))
        .merge(recipient_routes)
        .merge(selection_routes)
        .with_state(app_state)
}
