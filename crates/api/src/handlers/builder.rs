//! Handlers for the interactive schema builder.
//!
//! Sections and fields are addressed by their 0-based position in the
//! working schema. Edits never validate; validation happens on preview and
//! commit.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use labelkit_core::builder::{FieldDraft, SchemaBuilder};
use labelkit_core::render::{render, FormPreview, RenderedForm};
use labelkit_core::types::SessionId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// File name offered when downloading the working schema.
const SCHEMA_DOWNLOAD_NAME: &str = "schema.json";

#[derive(Debug, Deserialize)]
pub struct ColumnsRequest {
    pub header_column: String,
    pub text_column: String,
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub name: String,
    #[serde(default)]
    pub instruction: String,
}

/// Response for add operations: the new element's position and the
/// updated builder.
#[derive(Debug, Serialize)]
pub struct BuilderChange {
    pub index: usize,
    pub builder: SchemaBuilder,
}

type BuilderResponse = Json<DataResponse<SchemaBuilder>>;

/// GET /api/v1/sessions/{id}/builder
pub async fn get_builder(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let session = shared.lock().await;
    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// PUT /api/v1/sessions/{id}/builder/columns
pub async fn set_columns(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<ColumnsRequest>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session
        .builder
        .set_columns(&input.header_column, &input.text_column);
    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// POST /api/v1/sessions/{id}/builder/sections
pub async fn add_section(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<SectionRequest>,
) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let index = session.builder.add_section(&input.name, &input.instruction);

    tracing::debug!(session_id = %id, section = index, "Builder section added");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BuilderChange {
                index,
                builder: session.builder.clone(),
            },
        }),
    ))
}

/// PUT /api/v1/sessions/{id}/builder/sections/{section}
pub async fn update_section(
    State(state): State<AppState>,
    Path((id, section)): Path<(SessionId, usize)>,
    Json(input): Json<SectionRequest>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session
        .builder
        .update_section(section, &input.name, &input.instruction)?;
    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// DELETE /api/v1/sessions/{id}/builder/sections/{section}
pub async fn remove_section(
    State(state): State<AppState>,
    Path((id, section)): Path<(SessionId, usize)>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session.builder.remove_section(section)?;

    tracing::debug!(session_id = %id, section, "Builder section removed");

    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// POST /api/v1/sessions/{id}/builder/sections/{section}/fields
pub async fn add_field(
    State(state): State<AppState>,
    Path((id, section)): Path<(SessionId, usize)>,
    Json(draft): Json<FieldDraft>,
) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let index = session.builder.add_field(section, draft)?;

    tracing::debug!(session_id = %id, section, field = index, "Builder field added");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: BuilderChange {
                index,
                builder: session.builder.clone(),
            },
        }),
    ))
}

/// PUT /api/v1/sessions/{id}/builder/sections/{section}/fields/{field}
pub async fn update_field(
    State(state): State<AppState>,
    Path((id, section, field)): Path<(SessionId, usize, usize)>,
    Json(draft): Json<FieldDraft>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session.builder.update_field(section, field, draft)?;
    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// DELETE /api/v1/sessions/{id}/builder/sections/{section}/fields/{field}
pub async fn remove_field(
    State(state): State<AppState>,
    Path((id, section, field)): Path<(SessionId, usize, usize)>,
) -> AppResult<BuilderResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session.builder.remove_field(section, field)?;
    Ok(Json(DataResponse {
        data: session.builder.clone(),
    }))
}

/// GET /api/v1/sessions/{id}/builder/preview
///
/// Render the working sections with default widget values.
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<FormPreview>>> {
    let shared = state.sessions.get(id).await?;
    let session = shared.lock().await;
    Ok(Json(DataResponse {
        data: session.builder.preview()?,
    }))
}

/// GET /api/v1/sessions/{id}/builder/document
///
/// Download the working schema as a JSON schema document.
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.get(id).await?;
    let session = shared.lock().await;
    let body = serde_json::to_vec_pretty(&session.builder.to_document())
        .map_err(|e| AppError::InternalError(format!("Failed to serialize schema: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SCHEMA_DOWNLOAD_NAME}\""),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/sessions/{id}/builder/commit
///
/// Validate the working schema and start annotating the pending dataset
/// with it.
pub async fn commit(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<Json<DataResponse<RenderedForm>>> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.commit_builder()?;

    tracing::info!(
        session_id = %id,
        rows = workspace.row_count(),
        fields = workspace.schema().fields().count(),
        "Schema activated from builder"
    );

    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}
