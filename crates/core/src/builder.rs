//! Interactive schema builder.
//!
//! The builder holds a working schema that may be incomplete while it is
//! being edited. It becomes a [`Schema`] only through [`SchemaBuilder::build`],
//! which serializes the draft into the schema document shape and runs it
//! through the same validator as an uploaded file.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::render::{render_preview, FormPreview};
use crate::schema::{
    validate_sections, Schema, FIELD_KEY_PREFIX, HEADER_COLUMN_KEY, SECTION_KEY_PREFIX,
    TEXT_COLUMN_KEY,
};

/// Configuration of one field as edited in its own panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDraft {
    pub name: String,
    /// Widget kind string; checked only when the schema is built.
    #[serde(rename = "type")]
    pub widget: String,
    pub tooltip: String,
    pub example: Option<String>,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub name: String,
    pub instruction: String,
    pub fields: Vec<FieldDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaBuilder {
    pub header_column: String,
    pub text_column: String,
    pub sections: Vec<SectionDraft>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_columns(&mut self, header_column: &str, text_column: &str) {
        self.header_column = header_column.trim().to_string();
        self.text_column = text_column.trim().to_string();
    }

    /// Append a section and return its 0-based index.
    pub fn add_section(&mut self, name: &str, instruction: &str) -> usize {
        self.sections.push(SectionDraft {
            name: name.trim().to_string(),
            instruction: instruction.to_string(),
            fields: Vec::new(),
        });
        self.sections.len() - 1
    }

    pub fn update_section(
        &mut self,
        section: usize,
        name: &str,
        instruction: &str,
    ) -> Result<(), CoreError> {
        let draft = self.section_mut(section)?;
        draft.name = name.trim().to_string();
        draft.instruction = instruction.to_string();
        Ok(())
    }

    pub fn remove_section(&mut self, section: usize) -> Result<SectionDraft, CoreError> {
        self.section_mut(section)?;
        Ok(self.sections.remove(section))
    }

    /// Append a field to `section` and return its 0-based index.
    pub fn add_field(&mut self, section: usize, field: FieldDraft) -> Result<usize, CoreError> {
        let draft = self.section_mut(section)?;
        draft.fields.push(field);
        Ok(draft.fields.len() - 1)
    }

    /// Replace one field's configuration. Other fields are left untouched.
    pub fn update_field(
        &mut self,
        section: usize,
        field: usize,
        draft: FieldDraft,
    ) -> Result<(), CoreError> {
        *self.field_mut(section, field)? = draft;
        Ok(())
    }

    pub fn remove_field(&mut self, section: usize, field: usize) -> Result<FieldDraft, CoreError> {
        self.field_mut(section, field)?;
        Ok(self.sections[section].fields.remove(field))
    }

    /// Serialize the working schema into the schema document shape.
    ///
    /// Sections and fields get positional keys (`section_1`, `annotation_1`,
    /// ...) so the document can be saved and uploaded again later.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        doc.insert(HEADER_COLUMN_KEY.to_string(), Value::from(self.header_column.clone()));
        doc.insert(TEXT_COLUMN_KEY.to_string(), Value::from(self.text_column.clone()));

        for (i, section) in self.sections.iter().enumerate() {
            let mut annotations = Map::new();
            for (j, field) in section.fields.iter().enumerate() {
                annotations.insert(format!("{FIELD_KEY_PREFIX}{}", j + 1), field_document(field));
            }

            let mut entry = Map::new();
            entry.insert("section_name".to_string(), Value::from(section.name.clone()));
            entry.insert(
                "section_instruction".to_string(),
                Value::from(section.instruction.clone()),
            );
            entry.insert("annotations".to_string(), Value::Object(annotations));
            doc.insert(format!("{SECTION_KEY_PREFIX}{}", i + 1), Value::Object(entry));
        }

        Value::Object(doc)
    }

    /// Render the working sections with default values.
    ///
    /// Needs valid sections but not the header/text columns, so the preview
    /// works before those are chosen.
    pub fn preview(&self) -> Result<FormPreview, CoreError> {
        let doc = self.to_document();
        let sections = match doc.as_object() {
            Some(obj) => validate_sections(obj)?,
            None => Vec::new(),
        };
        Ok(render_preview(&sections))
    }

    /// Validate the working schema into a [`Schema`].
    pub fn build(&self) -> Result<Schema, CoreError> {
        Schema::validate(&self.to_document())
    }

    fn section_mut(&mut self, section: usize) -> Result<&mut SectionDraft, CoreError> {
        self.sections.get_mut(section).ok_or_else(|| CoreError::NotFound {
            entity: "section",
            id: section.to_string(),
        })
    }

    fn field_mut(&mut self, section: usize, field: usize) -> Result<&mut FieldDraft, CoreError> {
        self.section_mut(section)?
            .fields
            .get_mut(field)
            .ok_or_else(|| CoreError::NotFound {
                entity: "field",
                id: format!("{section}/{field}"),
            })
    }
}

/// Only the parameters relevant to the chosen widget kind are emitted.
fn field_document(field: &FieldDraft) -> Value {
    let mut entry = Map::new();
    entry.insert("name".to_string(), Value::from(field.name.trim().to_string()));
    entry.insert("type".to_string(), Value::from(field.widget.trim().to_string()));
    entry.insert("tooltip".to_string(), Value::from(field.tooltip.clone()));
    entry.insert(
        "example".to_string(),
        field.example.clone().map_or(Value::Null, Value::from),
    );

    match field.widget.trim() {
        "likert" => {
            entry.insert("min_value".to_string(), field.min_value.map_or(Value::Null, Value::from));
            entry.insert("max_value".to_string(), field.max_value.map_or(Value::Null, Value::from));
        }
        "dropdown" => {
            let options = field
                .options
                .iter()
                .map(|o| o.trim())
                .filter(|o| !o.is_empty())
                .map(Value::from)
                .collect();
            entry.insert("options".to_string(), Value::Array(options));
        }
        _ => {}
    }

    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldKind;
    use assert_matches::assert_matches;

    fn checkbox(name: &str) -> FieldDraft {
        FieldDraft {
            name: name.to_string(),
            widget: "checkbox".to_string(),
            ..FieldDraft::default()
        }
    }

    fn likert(name: &str, min: i64, max: i64) -> FieldDraft {
        FieldDraft {
            name: name.to_string(),
            widget: "likert".to_string(),
            min_value: Some(min),
            max_value: Some(max),
            ..FieldDraft::default()
        }
    }

    fn builder() -> SchemaBuilder {
        let mut b = SchemaBuilder::new();
        b.set_columns("title", "body");
        let s = b.add_section("Tone", "Read carefully");
        b.add_field(s, checkbox("Polite")).unwrap();
        b.add_field(s, likert("Warmth", 1, 5)).unwrap();
        b
    }

    // -- editing -------------------------------------------------------------

    #[test]
    fn add_operations_append_in_order() {
        let mut b = builder();
        let s = b.add_section("Topic", "");
        assert_eq!(s, 1);
        assert_eq!(b.add_field(s, checkbox("Sports")).unwrap(), 0);
        assert_eq!(b.add_field(s, checkbox("Politics")).unwrap(), 1);
        assert_eq!(
            b.build().unwrap().output_columns(),
            vec!["Tone_Polite", "Tone_Warmth", "Topic_Sports", "Topic_Politics"]
        );
    }

    #[test]
    fn update_field_touches_only_that_field() {
        let mut b = builder();
        b.update_field(0, 1, likert("Warmth", 0, 10)).unwrap();
        assert_eq!(b.sections[0].fields[0], checkbox("Polite"));
        assert_eq!(b.sections[0].fields[1].max_value, Some(10));
    }

    #[test]
    fn unknown_indices_are_not_found() {
        let mut b = builder();
        assert_matches!(b.add_field(3, checkbox("x")), Err(CoreError::NotFound { entity: "section", .. }));
        assert_matches!(b.remove_field(0, 5), Err(CoreError::NotFound { entity: "field", .. }));
        assert_matches!(b.update_section(2, "a", "b"), Err(CoreError::NotFound { .. }));
    }

    #[test]
    fn remove_section_and_field() {
        let mut b = builder();
        let removed = b.remove_field(0, 0).unwrap();
        assert_eq!(removed.name, "Polite");
        b.remove_section(0).unwrap();
        assert!(b.sections.is_empty());
    }

    // -- build -----------------------------------------------------------------

    #[test]
    fn build_produces_validated_schema() {
        let schema = builder().build().unwrap();
        assert_eq!(schema.header_column, "title");
        assert_eq!(schema.sections[0].fields[0].key, "annotation_1");
        assert_eq!(schema.sections[0].fields[1].kind, FieldKind::Likert { min: 1, max: 5 });
    }

    #[test]
    fn build_rejects_incomplete_drafts() {
        let mut b = builder();
        b.add_field(
            0,
            FieldDraft {
                name: "Area".into(),
                widget: "dropdown".into(),
                options: vec!["  ".into()],
                ..FieldDraft::default()
            },
        )
        .unwrap();
        assert_matches!(b.build(), Err(CoreError::SchemaValidation(_)));

        let mut b = builder();
        b.set_columns("", "body");
        assert_matches!(b.build(), Err(CoreError::SchemaValidation(_)));
    }

    #[test]
    fn build_rejects_duplicate_columns() {
        let mut b = builder();
        b.add_field(0, checkbox("Polite")).unwrap();
        assert_matches!(b.build(), Err(CoreError::DuplicateColumn { .. }));
    }

    #[test]
    fn document_round_trips_through_upload_path() {
        let b = builder();
        let bytes = serde_json::to_vec(&b.to_document()).unwrap();
        assert_eq!(Schema::from_document(&bytes).unwrap(), b.build().unwrap());
    }

    // -- preview ---------------------------------------------------------------

    #[test]
    fn preview_works_before_columns_are_chosen() {
        let mut b = builder();
        b.set_columns("", "");
        let preview = b.preview().unwrap();
        assert_eq!(preview.sections[0].widgets.len(), 2);
    }

    #[test]
    fn preview_reports_invalid_fields() {
        let mut b = builder();
        b.update_field(0, 1, likert("Warmth", 5, 1)).unwrap();
        assert_matches!(b.preview(), Err(CoreError::SchemaValidation(_)));
    }
}
