//! Per-record annotation state.
//!
//! Holds the widget values of the one record currently being edited, keyed
//! by output column in schema order. Edits only touch this state; the
//! dataset is written when the state is flushed.

use indexmap::IndexMap;

use crate::dataset::{Cell, RecordStore};
use crate::error::CoreError;
use crate::schema::Schema;
use crate::widget::WidgetValue;

#[derive(Debug, Clone, PartialEq)]
struct Entry {
    value: WidgetValue,
    /// Edited since the record was entered (or since the last flush).
    dirty: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationState {
    entries: IndexMap<String, Entry>,
}

impl AnnotationState {
    /// Seed the state for `row` (0-based) from the stored cells.
    ///
    /// Unset or unreadable cells seed the kind default.
    pub fn populate(schema: &Schema, store: &impl RecordStore, row: usize) -> Self {
        let entries = schema
            .fields()
            .map(|field| {
                let cell = store.get(row, &field.column).unwrap_or(&Cell::Unset);
                let entry = Entry {
                    value: WidgetValue::from_cell(&field.kind, cell),
                    dirty: false,
                };
                (field.column.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Current value of the widget writing to `column`.
    pub fn value(&self, column: &str) -> Option<&WidgetValue> {
        self.entries.get(column).map(|e| &e.value)
    }

    /// Record a widget interaction. No dataset write happens here.
    pub fn set(&mut self, column: &str, value: WidgetValue) -> Result<(), CoreError> {
        let entry = self.entries.get_mut(column).ok_or_else(|| CoreError::NotFound {
            entity: "column",
            id: column.to_string(),
        })?;
        entry.value = value;
        entry.dirty = true;
        Ok(())
    }

    /// Whether any widget was edited since the last flush.
    pub fn is_dirty(&self) -> bool {
        self.entries.values().any(|e| e.dirty)
    }

    /// Whether flushing now would store at least one set cell.
    pub fn has_pending_answer(&self) -> bool {
        self.entries
            .values()
            .any(|e| e.dirty && !e.value.to_cell().is_unset())
    }

    /// Write every edited value into `store` at `row` (0-based).
    ///
    /// Values the operator never touched are left as stored, so an
    /// unanswered field stays unset. Returns the number of cells written.
    pub fn flush(&mut self, store: &mut impl RecordStore, row: usize) -> Result<usize, CoreError> {
        let mut written = 0;
        for (column, entry) in self.entries.iter_mut().filter(|(_, e)| e.dirty) {
            store.set(row, column, entry.value.to_cell())?;
            entry.dirty = false;
            written += 1;
        }
        Ok(written)
    }

    /// Column/value pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WidgetValue)> {
        self.entries.iter().map(|(c, e)| (c.as_str(), &e.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn setup() -> (Schema, Table) {
        let schema = Schema::validate(&json!({
            "header_column": "title",
            "text_column": "body",
            "section_1": {
                "section_name": "S",
                "annotations": {
                    "annotation_1": {"name": "Flag", "type": "checkbox"},
                    "annotation_2": {"name": "Pick", "type": "dropdown", "options": ["A", "B"]}
                }
            }
        }))
        .unwrap();
        let mut table = Table::from_csv(b"title,body,S_Pick\na,x,B\nb,y,Z\n").unwrap();
        table.provision(&schema).unwrap();
        (schema, table)
    }

    #[test]
    fn populate_reads_stored_values_with_defaults() {
        let (schema, table) = setup();
        let state = AnnotationState::populate(&schema, &table, 0);
        assert_eq!(state.value("S_Flag"), Some(&WidgetValue::Checkbox(false)));
        assert_eq!(state.value("S_Pick"), Some(&WidgetValue::Dropdown(Some("B".into()))));

        let state = AnnotationState::populate(&schema, &table, 1);
        assert_eq!(state.value("S_Pick"), Some(&WidgetValue::Dropdown(None)));
        assert!(!state.is_dirty());
    }

    #[test]
    fn set_does_not_touch_dataset() {
        let (schema, table) = setup();
        let mut state = AnnotationState::populate(&schema, &table, 0);
        state.set("S_Flag", WidgetValue::Checkbox(true)).unwrap();
        assert!(state.is_dirty());
        assert_eq!(table.get(0, "S_Flag"), Some(&Cell::Unset));
    }

    #[test]
    fn set_unknown_column_is_not_found() {
        let (schema, table) = setup();
        let mut state = AnnotationState::populate(&schema, &table, 0);
        assert_matches!(
            state.set("S_Nope", WidgetValue::Checkbox(true)),
            Err(CoreError::NotFound { .. })
        );
    }

    #[test]
    fn flush_writes_only_edited_values() {
        let (schema, mut table) = setup();
        let mut state = AnnotationState::populate(&schema, &table, 1);
        state.set("S_Flag", WidgetValue::Checkbox(true)).unwrap();

        assert_eq!(state.flush(&mut table, 1).unwrap(), 1);
        assert_eq!(table.get(1, "S_Flag"), Some(&Cell::Value("1".into())));
        // The unreadable stored "Z" was never edited, so it survives.
        assert_eq!(table.get(1, "S_Pick"), Some(&Cell::Value("Z".into())));
        assert!(!state.is_dirty());
        assert_eq!(state.flush(&mut table, 1).unwrap(), 0);
    }

    #[test]
    fn clearing_dropdown_flushes_unset() {
        let (schema, mut table) = setup();
        let mut state = AnnotationState::populate(&schema, &table, 0);
        state.set("S_Pick", WidgetValue::Dropdown(None)).unwrap();
        state.flush(&mut table, 0).unwrap();
        assert_eq!(table.get(0, "S_Pick"), Some(&Cell::Unset));
    }

    #[test]
    fn cleared_dropdown_is_not_a_pending_answer() {
        let (schema, table) = setup();
        let mut state = AnnotationState::populate(&schema, &table, 0);
        state.set("S_Pick", WidgetValue::Dropdown(None)).unwrap();
        assert!(state.is_dirty());
        assert!(!state.has_pending_answer());

        state.set("S_Flag", WidgetValue::Checkbox(false)).unwrap();
        assert!(state.has_pending_answer());
    }

    #[test]
    fn iter_follows_schema_order() {
        let (schema, table) = setup();
        let state = AnnotationState::populate(&schema, &table, 0);
        let columns: Vec<&str> = state.iter().map(|(c, _)| c).collect();
        assert_eq!(columns, vec!["S_Flag", "S_Pick"]);
    }
}
