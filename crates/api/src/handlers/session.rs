//! Handlers for session lifecycle and uploads.
//!
//! A session starts empty, receives a CSV dataset, and enters annotation
//! once a schema is uploaded (or committed from the builder).

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use labelkit_core::dataset::{PendingDataset, RecordStore};
use labelkit_core::render::{render, RenderedForm};
use labelkit_core::schema::Schema;
use labelkit_core::types::SessionId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for the dataset upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Original file name, used to name the export.
    pub filename: Option<String>,
}

/// POST /api/v1/sessions
///
/// Start a new, empty session.
pub async fn create_session(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.create().await;
    let summary = shared.lock().await.summary();

    tracing::info!(session_id = %summary.id, "Session created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: summary })))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.get(id).await?;
    let summary = shared.lock().await.summary();
    Ok(Json(DataResponse { data: summary }))
}

/// DELETE /api/v1/sessions/{id}
///
/// End a session. Unexported annotations are discarded.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<impl IntoResponse> {
    state.sessions.remove(id).await?;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/sessions/{id}/dataset?filename=
///
/// Upload the CSV dataset as the raw request body. It waits in the session
/// until a schema is chosen.
pub async fn upload_dataset(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Dataset upload is empty".to_string()));
    }

    let dataset = PendingDataset::parse(&body, params.filename.as_deref())?;
    let rows = dataset.table.row_count();
    let columns = dataset.table.columns().len();

    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session.upload_dataset(dataset)?;

    tracing::info!(
        session_id = %id,
        rows,
        columns,
        bytes = body.len(),
        "Dataset uploaded"
    );

    Ok(Json(DataResponse {
        data: session.summary(),
    }))
}

/// PUT /api/v1/sessions/{id}/schema
///
/// Upload a schema document (JSON or YAML). On success the pending dataset
/// is provisioned and the first record is rendered.
pub async fn upload_schema(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    body: Bytes,
) -> AppResult<Json<DataResponse<RenderedForm>>> {
    let schema = Schema::from_document(&body)?;

    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.activate(schema)?;

    tracing::info!(
        session_id = %id,
        rows = workspace.row_count(),
        fields = workspace.schema().fields().count(),
        "Schema activated from upload"
    );

    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}
