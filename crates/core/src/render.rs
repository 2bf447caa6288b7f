//! Form rendering: turn a schema plus widget values into render instructions.
//!
//! The output is a plain serializable tree; the browser decides how each
//! widget looks.

use serde::Serialize;

use crate::dataset::{Cell, RecordStore};
use crate::navigation::Workspace;
use crate::schema::{Field, FieldKind, Section};
use crate::widget::WidgetValue;

/// One widget, seeded with its current value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWidget {
    pub column: String,
    pub key: String,
    pub label: String,
    pub tooltip: String,
    pub example: Option<String>,
    pub widget: FieldKind,
    pub value: WidgetValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedSection {
    pub name: String,
    pub instruction: String,
    pub widgets: Vec<RenderedWidget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Records with at least one answered field.
    pub annotated: usize,
    pub total: usize,
}

/// Everything the browser needs to draw the current record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedForm {
    /// 1-based record index.
    pub index: usize,
    pub row_count: usize,
    pub title: String,
    pub text: String,
    pub progress: Progress,
    pub can_go_previous: bool,
    pub can_go_next: bool,
    pub confirming_reset: bool,
    pub sections: Vec<RenderedSection>,
}

/// Builder preview: sections rendered with kind defaults and no record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormPreview {
    pub sections: Vec<RenderedSection>,
}

/// Render the record under the cursor.
///
/// Widget values come from the annotation state, so unflushed edits show.
pub fn render(workspace: &Workspace) -> RenderedForm {
    let schema = workspace.schema();
    let table = workspace.table();
    let row = workspace.cursor() - 1;

    let read = |column: &str| {
        table
            .get(row, column)
            .map(|c| c.as_csv_field().to_string())
            .unwrap_or_default()
    };

    let sections = render_sections(&schema.sections, |field| {
        workspace
            .state()
            .value(&field.column)
            .cloned()
            .unwrap_or_else(|| WidgetValue::from_cell(&field.kind, &Cell::Unset))
    });

    let mut annotated = table.count_rows_with_any(&schema.output_columns());
    // The record under edit counts once a pending edit would store a value.
    if workspace.state().has_pending_answer()
        && schema
            .fields()
            .all(|f| table.get(row, &f.column).map_or(true, Cell::is_unset))
    {
        annotated += 1;
    }

    RenderedForm {
        index: workspace.cursor(),
        row_count: workspace.row_count(),
        title: read(&schema.header_column),
        text: read(&schema.text_column),
        progress: Progress {
            annotated,
            total: workspace.row_count(),
        },
        can_go_previous: workspace.can_go_previous(),
        can_go_next: workspace.can_go_next(),
        confirming_reset: workspace.confirming_reset(),
        sections,
    }
}

/// Render sections with every widget at its kind default.
pub fn render_preview(sections: &[Section]) -> FormPreview {
    FormPreview {
        sections: render_sections(sections, |field| WidgetValue::default_for(&field.kind)),
    }
}

fn render_sections(
    sections: &[Section],
    value_of: impl Fn(&Field) -> WidgetValue,
) -> Vec<RenderedSection> {
    sections
        .iter()
        .map(|section| RenderedSection {
            name: section.name.clone(),
            instruction: section.instruction.clone(),
            widgets: section
                .fields
                .iter()
                .map(|field| RenderedWidget {
                    column: field.column.clone(),
                    key: field.key.clone(),
                    label: field.name.clone(),
                    tooltip: field.tooltip.clone(),
                    example: field.example.clone(),
                    widget: field.kind.clone(),
                    value: value_of(field),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use crate::schema::Schema;
    use serde_json::json;

    fn workspace(csv: &str) -> Workspace {
        let schema = Schema::validate(&json!({
            "header_column": "title",
            "text_column": "body",
            "section_1": {
                "section_name": "Quality",
                "section_instruction": "Judge the text",
                "annotations": {
                    "annotation_1": {"name": "Score", "type": "likert", "min_value": 0, "max_value": 5, "tooltip": "0 is worst"},
                    "annotation_2": {"name": "Pick", "type": "dropdown", "options": ["A", "B"]}
                }
            },
            "section_2": {
                "section_name": "Notes",
                "annotations": {
                    "annotation_1": {"name": "Free", "type": "textbox", "example": "e.g. sarcasm"}
                }
            }
        }))
        .unwrap();
        Workspace::open(schema, Table::from_csv(csv.as_bytes()).unwrap(), "data".into()).unwrap()
    }

    #[test]
    fn renders_title_text_and_widgets_in_order() {
        let form = render(&workspace("title,body\nHello,World text\nBye,Other\n"));
        assert_eq!(form.index, 1);
        assert_eq!(form.row_count, 2);
        assert_eq!(form.title, "Hello");
        assert_eq!(form.text, "World text");
        assert!(!form.can_go_previous);
        assert!(form.can_go_next);

        let columns: Vec<&str> = form
            .sections
            .iter()
            .flat_map(|s| s.widgets.iter().map(|w| w.column.as_str()))
            .collect();
        assert_eq!(columns, vec!["Quality_Score", "Quality_Pick", "Notes_Free"]);
        assert_eq!(form.sections[0].instruction, "Judge the text");
        assert_eq!(form.sections[0].widgets[0].tooltip, "0 is worst");
        assert_eq!(form.sections[1].widgets[0].example.as_deref(), Some("e.g. sarcasm"));
    }

    #[test]
    fn unset_likert_renders_minimum() {
        let form = render(&workspace("title,body\nHello,World\n"));
        assert_eq!(form.sections[0].widgets[0].value, WidgetValue::Likert(0));
    }

    #[test]
    fn unknown_dropdown_value_renders_no_selection() {
        let form = render(&workspace("title,body,Quality_Pick\nHello,World,Z\n"));
        assert_eq!(form.sections[0].widgets[1].value, WidgetValue::Dropdown(None));
    }

    #[test]
    fn pending_edits_show_and_count_toward_progress() {
        let mut ws = workspace("title,body\nHello,World\nBye,Other\n");
        assert_eq!(render(&ws).progress, Progress { annotated: 0, total: 2 });

        ws.edit("Quality_Score", &json!(4)).unwrap();
        let form = render(&ws);
        assert_eq!(form.sections[0].widgets[0].value, WidgetValue::Likert(4));
        assert_eq!(form.progress.annotated, 1);

        ws.go_next().unwrap();
        assert_eq!(render(&ws).progress.annotated, 1);
    }

    #[test]
    fn cleared_dropdown_does_not_count_toward_progress() {
        let mut ws = workspace("title,body\nHello,World\nBye,Other\n");
        ws.edit("Quality_Pick", &json!(null)).unwrap();
        assert_eq!(render(&ws).progress.annotated, 0);

        ws.go_next().unwrap();
        assert_eq!(render(&ws).progress.annotated, 0);
    }

    #[test]
    fn widget_kind_serializes_with_parameters() {
        let form = render(&workspace("title,body\nHello,World\n"));
        let json = serde_json::to_value(&form.sections[0].widgets[1]).unwrap();
        assert_eq!(json["widget"], json!({"type": "dropdown", "options": ["A", "B"]}));
        assert_eq!(json["value"], json!(null));
    }

    #[test]
    fn preview_uses_defaults() {
        let ws = workspace("title,body\nHello,World\n");
        let preview = render_preview(&ws.schema().sections);
        assert_eq!(preview.sections[1].widgets[0].value, WidgetValue::Textbox(String::new()));
    }
}
