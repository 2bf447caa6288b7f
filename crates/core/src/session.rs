//! The per-user session context.
//!
//! A [`Session`] owns everything one user works with: the schema builder,
//! an uploaded dataset waiting for its schema, or the active workspace.
//! Nothing here is shared between sessions.

use serde::Serialize;

use crate::builder::SchemaBuilder;
use crate::dataset::{PendingDataset, RecordStore};
use crate::error::CoreError;
use crate::navigation::Workspace;
use crate::schema::Schema;
use crate::types::{SessionId, Timestamp};

#[derive(Debug, Clone)]
pub enum Stage {
    /// Initial state. A parsed dataset may be waiting for a schema.
    AwaitingUpload { dataset: Option<PendingDataset> },
    /// A dataset is provisioned and being annotated.
    Viewing(Box<Workspace>),
}

/// Compact description of a session for the browser.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub created_at: Timestamp,
    /// `awaiting_upload` or `viewing`.
    pub stage: &'static str,
    /// Columns of the pending or active dataset.
    pub columns: Vec<String>,
    pub row_count: Option<usize>,
    /// 1-based cursor while viewing.
    pub index: Option<usize>,
    pub confirming_reset: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    stage: Stage,
    pub builder: SchemaBuilder,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            stage: Stage::AwaitingUpload { dataset: None },
            builder: SchemaBuilder::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn summary(&self) -> SessionSummary {
        let (stage, columns, row_count, index, confirming_reset) = match &self.stage {
            Stage::AwaitingUpload { dataset } => (
                "awaiting_upload",
                dataset
                    .as_ref()
                    .map(|d| d.table.columns().to_vec())
                    .unwrap_or_default(),
                dataset.as_ref().map(|d| d.table.row_count()),
                None,
                false,
            ),
            Stage::Viewing(ws) => (
                "viewing",
                ws.table().columns().to_vec(),
                Some(ws.row_count()),
                Some(ws.cursor()),
                ws.confirming_reset(),
            ),
        };
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            stage,
            columns,
            row_count,
            index,
            confirming_reset,
        }
    }

    /// Store a parsed upload until a schema arrives.
    ///
    /// Replaces any dataset already waiting. Not allowed while annotating.
    pub fn upload_dataset(&mut self, dataset: PendingDataset) -> Result<(), CoreError> {
        match &mut self.stage {
            Stage::AwaitingUpload { dataset: pending } => {
                *pending = Some(dataset);
                Ok(())
            }
            Stage::Viewing(_) => Err(CoreError::Conflict(
                "a dataset is already being annotated; reset the session first".to_string(),
            )),
        }
    }

    /// Activate `schema` against the pending dataset and enter viewing.
    ///
    /// On failure the pending dataset stays in place so a corrected schema
    /// can be tried.
    pub fn activate(&mut self, schema: Schema) -> Result<&mut Workspace, CoreError> {
        let dataset = match &self.stage {
            Stage::AwaitingUpload { dataset: Some(d) } => d.clone(),
            Stage::AwaitingUpload { dataset: None } => {
                return Err(CoreError::Conflict(
                    "upload a dataset before choosing a schema".to_string(),
                ))
            }
            Stage::Viewing(_) => {
                return Err(CoreError::Conflict(
                    "a schema is already active; reset the session first".to_string(),
                ))
            }
        };

        let workspace = Workspace::open(schema, dataset.table, dataset.stem)?;
        self.stage = Stage::Viewing(Box::new(workspace));
        self.workspace_mut()
    }

    /// "Use this schema": validate the builder's working schema and activate it.
    pub fn commit_builder(&mut self) -> Result<&mut Workspace, CoreError> {
        let schema = self.builder.build()?;
        self.activate(schema)
    }

    pub fn workspace(&self) -> Result<&Workspace, CoreError> {
        match &self.stage {
            Stage::Viewing(ws) => Ok(ws.as_ref()),
            Stage::AwaitingUpload { .. } => Err(not_viewing()),
        }
    }

    pub fn workspace_mut(&mut self) -> Result<&mut Workspace, CoreError> {
        match &mut self.stage {
            Stage::Viewing(ws) => Ok(ws.as_mut()),
            Stage::AwaitingUpload { .. } => Err(not_viewing()),
        }
    }

    /// Second step of "start new dataset".
    ///
    /// With `confirmed`, discards the dataset, schema, and builder and
    /// returns to the initial state; anything not exported is lost. Without
    /// it, the pending request is withdrawn. Either way a reset must have
    /// been requested first.
    pub fn confirm_reset(&mut self, confirmed: bool) -> Result<(), CoreError> {
        let ws = self.workspace_mut()?;
        if !ws.confirming_reset() {
            return Err(CoreError::Conflict(
                "no reset has been requested".to_string(),
            ));
        }
        if !confirmed {
            ws.cancel_reset();
            return Ok(());
        }
        self.stage = Stage::AwaitingUpload { dataset: None };
        self.builder = SchemaBuilder::new();
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn not_viewing() -> CoreError {
    CoreError::Conflict("no dataset is being annotated".to_string())
}
