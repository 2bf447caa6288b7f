//! CSV export of an annotated dataset.

use crate::error::CoreError;
use crate::navigation::Workspace;

/// Content type of exported files.
pub const EXPORT_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// A serialized dataset ready for download.
#[derive(Debug, Clone)]
pub struct Export {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub rows: usize,
    pub columns: usize,
}

/// Flush the record under edit, then serialize the whole table.
///
/// All original columns come first in their uploaded order, followed by
/// the provisioned output columns.
pub fn export_csv(workspace: &mut Workspace) -> Result<Export, CoreError> {
    workspace.flush()?;
    let table = workspace.table();
    Ok(Export {
        filename: export_filename(workspace.stem()),
        bytes: table.to_csv()?,
        rows: workspace.row_count(),
        columns: table.columns().len(),
    })
}

pub fn export_filename(stem: &str) -> String {
    format!("annotated_{stem}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Cell, RecordStore, Table};
    use crate::schema::Schema;
    use serde_json::json;

    fn workspace() -> Workspace {
        let schema = Schema::validate(&json!({
            "header_column": "title",
            "text_column": "body",
            "section_1": {
                "section_name": "S",
                "annotations": {
                    "annotation_1": {"name": "Flag", "type": "checkbox"},
                    "annotation_2": {"name": "Note", "type": "textbox"}
                }
            }
        }))
        .unwrap();
        let table = Table::from_csv(b"id,title,body\n7,a,\"x, y\"\n8,b,z\n").unwrap();
        Workspace::open(schema, table, "reviews".into()).unwrap()
    }

    #[test]
    fn export_includes_in_progress_edits() {
        let mut ws = workspace();
        ws.edit("S_Flag", &json!(true)).unwrap();
        let export = export_csv(&mut ws).unwrap();

        let text = String::from_utf8(export.bytes).unwrap();
        assert_eq!(
            text,
            "id,title,body,S_Flag,S_Note\n7,a,\"x, y\",1,\n8,b,z,,\n"
        );
        assert_eq!(export.filename, "annotated_reviews.csv");
        assert_eq!(export.rows, 2);
        assert_eq!(export.columns, 5);
        assert!(!ws.state().is_dirty());
    }

    #[test]
    fn export_import_export_is_stable() {
        let mut ws = workspace();
        ws.edit("S_Note", &json!("multi\nline")).unwrap();
        let first = export_csv(&mut ws).unwrap().bytes;

        let reloaded = Table::from_csv(&first).unwrap();
        assert_eq!(reloaded.get(0, "S_Note"), Some(&Cell::Value("multi\nline".into())));
        assert_eq!(reloaded.to_csv().unwrap(), first);
    }
}
