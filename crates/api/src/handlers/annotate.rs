//! Handlers for the annotation view: form rendering, widget edits,
//! navigation, reset, and export.
//!
//! Every transition that changes what the browser shows answers with a
//! freshly rendered form.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use labelkit_core::error::CoreError;
use labelkit_core::export::{export_csv, EXPORT_CONTENT_TYPE};
use labelkit_core::navigation::{NavOutcome, Workspace};
use labelkit_core::render::{render, RenderedForm};
use labelkit_core::session::SessionSummary;
use labelkit_core::types::SessionId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for a single widget edit.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// Widget value; its JSON shape depends on the widget kind.
    pub value: serde_json::Value,
}

/// Request body for jumping to a record.
#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    /// 1-based record index.
    pub index: usize,
}

/// Request body for the second step of a reset.
#[derive(Debug, Deserialize)]
pub struct ConfirmResetRequest {
    pub confirm: bool,
}

/// Response for a reset confirmation.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Whether the dataset was discarded.
    pub reset: bool,
    pub session: SessionSummary,
}

type FormResponse = Json<DataResponse<RenderedForm>>;

/// GET /api/v1/sessions/{id}/form
///
/// Render the record under the cursor.
pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<FormResponse> {
    let shared = state.sessions.get(id).await?;
    let session = shared.lock().await;
    let workspace = session.workspace()?;
    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}

/// PUT /api/v1/sessions/{id}/form/{column}
///
/// Record a widget edit. The value stays in the annotation state until the
/// next navigation or export.
pub async fn edit_field(
    State(state): State<AppState>,
    Path((id, column)): Path<(SessionId, String)>,
    Json(input): Json<EditRequest>,
) -> AppResult<FormResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.workspace_mut()?;
    workspace.edit(&column, &input.value)?;

    tracing::debug!(session_id = %id, index = workspace.cursor(), column = %column, "Field edited");

    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}

/// POST /api/v1/sessions/{id}/navigation/previous
pub async fn go_previous(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<FormResponse> {
    navigate(&state, id, "previous", Workspace::go_previous).await
}

/// POST /api/v1/sessions/{id}/navigation/next
pub async fn go_next(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<FormResponse> {
    navigate(&state, id, "next", Workspace::go_next).await
}

/// POST /api/v1/sessions/{id}/navigation/jump
///
/// An index outside the dataset leaves the cursor where it is.
pub async fn jump(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<JumpRequest>,
) -> AppResult<FormResponse> {
    let target = input.index;
    navigate(&state, id, "jump", move |ws| {
        if !(1..=ws.row_count()).contains(&target) {
            tracing::warn!(
                session_id = %id,
                target,
                row_count = ws.row_count(),
                "Jump target out of range, ignoring"
            );
        }
        ws.jump_to(target)
    })
    .await
}

/// POST /api/v1/sessions/{id}/reset
///
/// First step of "start new dataset". Only raises the confirmation flag.
pub async fn request_reset(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<FormResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.workspace_mut()?;
    workspace.request_reset();

    tracing::info!(session_id = %id, "Reset requested");

    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}

/// POST /api/v1/sessions/{id}/reset/confirm
pub async fn confirm_reset(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
    Json(input): Json<ConfirmResetRequest>,
) -> AppResult<Json<DataResponse<ResetResponse>>> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    session.confirm_reset(input.confirm)?;

    if input.confirm {
        tracing::info!(session_id = %id, "Session reset, dataset discarded");
    } else {
        tracing::info!(session_id = %id, "Reset cancelled");
    }

    Ok(Json(DataResponse {
        data: ResetResponse {
            reset: input.confirm,
            session: session.summary(),
        },
    }))
}

/// GET /api/v1/sessions/{id}/export
///
/// Download the annotated dataset as CSV, including the record under edit.
pub async fn export(
    State(state): State<AppState>,
    Path(id): Path<SessionId>,
) -> AppResult<impl IntoResponse> {
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.workspace_mut()?;
    let export = export_csv(workspace)?;

    tracing::info!(
        session_id = %id,
        rows = export.rows,
        columns = export.columns,
        filename = %export.filename,
        "Dataset exported"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, EXPORT_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    ))
}

/// Run one navigation step under the session lock and render the result.
async fn navigate<F>(
    state: &AppState,
    id: SessionId,
    action: &'static str,
    step: F,
) -> AppResult<FormResponse>
where
    F: FnOnce(&mut Workspace) -> Result<NavOutcome, CoreError>,
{
    let shared = state.sessions.get(id).await?;
    let mut session = shared.lock().await;
    let workspace = session.workspace_mut()?;

    match step(workspace)? {
        NavOutcome::Moved { from, to, written } => {
            tracing::info!(session_id = %id, action, from, to, written, "Navigated");
        }
        NavOutcome::Unchanged => {
            tracing::debug!(session_id = %id, action, index = workspace.cursor(), "Navigation had no effect");
        }
    }

    Ok(Json(DataResponse {
        data: render(workspace),
    }))
}
