//! Record navigation for an active annotation workspace.
//!
//! Every move commits the annotation state of the record being left into
//! the table *before* the cursor changes, then seeds fresh state for the
//! record entered. The cursor is 1-based and never leaves `[1, row_count]`;
//! moves that would break that are no-ops rather than errors, since the UI
//! disables them.

use serde::Serialize;

use crate::annotation::AnnotationState;
use crate::dataset::{RecordStore, Table};
use crate::error::CoreError;
use crate::schema::Schema;
use crate::widget::WidgetValue;

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NavOutcome {
    /// The state of record `from` was flushed and the cursor is now `to`.
    Moved { from: usize, to: usize, written: usize },
    /// Preconditions did not hold; nothing changed.
    Unchanged,
}

/// The dataset being annotated together with its cursor and edit state.
#[derive(Debug, Clone)]
pub struct Workspace {
    schema: Schema,
    table: Table,
    /// 1-based index of the record under edit.
    cursor: usize,
    state: AnnotationState,
    confirming_reset: bool,
    /// Stem of the uploaded file name, used to name exports.
    stem: String,
}

impl Workspace {
    /// Provision `table` for `schema` and open the first record.
    pub fn open(schema: Schema, mut table: Table, stem: String) -> Result<Self, CoreError> {
        table.provision(&schema)?;
        if table.row_count() == 0 {
            return Err(CoreError::Validation("dataset has no records".to_string()));
        }
        let state = AnnotationState::populate(&schema, &table, 0);
        Ok(Self {
            schema,
            table,
            cursor: 1,
            state,
            confirming_reset: false,
            stem,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn state(&self) -> &AnnotationState {
        &self.state
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// Current 1-based record index.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn confirming_reset(&self) -> bool {
        self.confirming_reset
    }

    pub fn can_go_previous(&self) -> bool {
        self.cursor > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.cursor < self.row_count()
    }

    /// Apply a widget edit from the browser to the annotation state.
    pub fn edit(&mut self, column: &str, raw: &serde_json::Value) -> Result<(), CoreError> {
        let field = self
            .schema
            .field_for_column(column)
            .ok_or_else(|| CoreError::NotFound {
                entity: "column",
                id: column.to_string(),
            })?;
        let value = WidgetValue::from_json(&field.kind, raw)?;
        self.state.set(column, value)
    }

    /// Commit the annotation state of the current record into the table.
    pub fn flush(&mut self) -> Result<usize, CoreError> {
        self.state.flush(&mut self.table, self.cursor - 1)
    }

    pub fn go_previous(&mut self) -> Result<NavOutcome, CoreError> {
        if !self.can_go_previous() {
            return Ok(NavOutcome::Unchanged);
        }
        self.move_to(self.cursor - 1)
    }

    pub fn go_next(&mut self) -> Result<NavOutcome, CoreError> {
        if !self.can_go_next() {
            return Ok(NavOutcome::Unchanged);
        }
        self.move_to(self.cursor + 1)
    }

    /// Jump to the 1-based record `target`.
    ///
    /// Jumping to the current record, or outside `[1, row_count]`, changes
    /// nothing.
    pub fn jump_to(&mut self, target: usize) -> Result<NavOutcome, CoreError> {
        if target == self.cursor || !(1..=self.row_count()).contains(&target) {
            return Ok(NavOutcome::Unchanged);
        }
        self.move_to(target)
    }

    /// Ask for confirmation before discarding the dataset.
    pub fn request_reset(&mut self) {
        self.confirming_reset = true;
    }

    /// Withdraw a pending reset request.
    pub fn cancel_reset(&mut self) {
        self.confirming_reset = false;
    }

    /// Flush, move, clear any pending reset, then seed the new record.
    fn move_to(&mut self, target: usize) -> Result<NavOutcome, CoreError> {
        let from = self.cursor;
        let written = self.flush()?;
        self.cursor = target;
        self.confirming_reset = false;
        self.state = AnnotationState::populate(&self.schema, &self.table, target - 1);
        Ok(NavOutcome::Moved {
            from,
            to: target,
            written,
        })
    }
}
