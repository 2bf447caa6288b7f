//! Route definitions for the schema builder.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::builder;
use crate::state::AppState;

/// Builder routes mounted at `/sessions/{id}/builder`.
///
/// ```text
/// GET    /                                   -> get_builder
/// PUT    /columns                            -> set_columns
/// POST   /sections                           -> add_section
/// PUT    /sections/{section}                 -> update_section
/// DELETE /sections/{section}                 -> remove_section
/// POST   /sections/{section}/fields          -> add_field
/// PUT    /sections/{section}/fields/{field}  -> update_field
/// DELETE /sections/{section}/fields/{field}  -> remove_field
/// GET    /preview                            -> preview
/// GET    /document                           -> download_document
/// POST   /commit                             -> commit
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(builder::get_builder))
        .route("/columns", put(builder::set_columns))
        .route("/sections", post(builder::add_section))
        .route(
            "/sections/{section}",
            put(builder::update_section).delete(builder::remove_section),
        )
        .route("/sections/{section}/fields", post(builder::add_field))
        .route(
            "/sections/{section}/fields/{field}",
            put(builder::update_field).delete(builder::remove_field),
        )
        .route("/preview", get(builder::preview))
        .route("/document", get(builder::download_document))
        .route("/commit", post(builder::commit))
}
