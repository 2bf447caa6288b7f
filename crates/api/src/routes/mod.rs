pub mod builder;
pub mod health;
pub mod session;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                                        create (POST)
/// /sessions/{id}                                   get, delete
/// /sessions/{id}/dataset                           upload CSV (PUT, raw body)
/// /sessions/{id}/schema                            upload schema (PUT, raw body)
/// /sessions/{id}/form                              render current record (GET)
/// /sessions/{id}/form/{column}                     edit one widget (PUT)
/// /sessions/{id}/navigation/previous               previous record (POST)
/// /sessions/{id}/navigation/next                   next record (POST)
/// /sessions/{id}/navigation/jump                   jump to index (POST)
/// /sessions/{id}/reset                             request reset (POST)
/// /sessions/{id}/reset/confirm                     confirm or cancel (POST)
/// /sessions/{id}/export                            download CSV (GET)
///
/// /sessions/{id}/builder                           working schema (GET)
/// /sessions/{id}/builder/columns                   header/text columns (PUT)
/// /sessions/{id}/builder/sections                  add section (POST)
/// /sessions/{id}/builder/sections/{s}              update, delete
/// /sessions/{id}/builder/sections/{s}/fields       add field (POST)
/// /sessions/{id}/builder/sections/{s}/fields/{f}   update, delete
/// /sessions/{id}/builder/preview                   rendered preview (GET)
/// /sessions/{id}/builder/document                  download schema (GET)
/// /sessions/{id}/builder/commit                    use this schema (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest(
        "/sessions",
        session::router().nest("/{id}/builder", builder::router()),
    )
}
