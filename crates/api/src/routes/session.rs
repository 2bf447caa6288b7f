//! Route definitions for sessions and the annotation view.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{annotate, session};
use crate::state::AppState;

/// Session routes mounted at `/sessions`.
///
/// ```text
/// POST   /                              -> create_session
/// GET    /{id}                          -> get_session
/// DELETE /{id}                          -> delete_session
/// PUT    /{id}/dataset                  -> upload_dataset
/// PUT    /{id}/schema                   -> upload_schema
/// GET    /{id}/form                     -> get_form
/// PUT    /{id}/form/{column}            -> edit_field
/// POST   /{id}/navigation/previous      -> go_previous
/// POST   /{id}/navigation/next          -> go_next
/// POST   /{id}/navigation/jump          -> jump
/// POST   /{id}/reset                    -> request_reset
/// POST   /{id}/reset/confirm            -> confirm_reset
/// GET    /{id}/export                   -> export
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(session::create_session))
        .route(
            "/{id}",
            get(session::get_session).delete(session::delete_session),
        )
        .route("/{id}/dataset", put(session::upload_dataset))
        .route("/{id}/schema", put(session::upload_schema))
        .route("/{id}/form", get(annotate::get_form))
        .route("/{id}/form/{column}", put(annotate::edit_field))
        .route("/{id}/navigation/previous", post(annotate::go_previous))
        .route("/{id}/navigation/next", post(annotate::go_next))
        .route("/{id}/navigation/jump", post(annotate::jump))
        .route("/{id}/reset", post(annotate::request_reset))
        .route("/{id}/reset/confirm", post(annotate::confirm_reset))
        .route("/{id}/export", get(annotate::export))
}
