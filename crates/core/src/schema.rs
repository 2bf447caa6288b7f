//! Annotation schema model: document parsing, validation, and output column
//! naming.
//!
//! A schema document looks like:
//!
//! ```text
//! header_column: title
//! text_column: body
//! section_1:
//!   section_name: Tone
//!   section_instruction: Rate the tone of the text
//!   annotations:
//!     annotation_1: { name: Polite, type: checkbox, tooltip: ..., example: ... }
//!     annotation_2: { name: Warmth, type: likert, min_value: 1, max_value: 5 }
//! ```
//!
//! Section and field order is taken from the document and drives render
//! order, so the parsed [`Schema`] keeps it exactly.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::widget::integral_number;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Schema key naming the dataset column shown as the record title.
pub const HEADER_COLUMN_KEY: &str = "header_column";

/// Schema key naming the dataset column holding the record body text.
pub const TEXT_COLUMN_KEY: &str = "text_column";

/// Top-level keys with this prefix are sections.
pub const SECTION_KEY_PREFIX: &str = "section_";

/// Field keys generated by the schema builder use this prefix.
pub const FIELD_KEY_PREFIX: &str = "annotation_";

// ---------------------------------------------------------------------------
// Widget kinds
// ---------------------------------------------------------------------------

/// The fixed set of widget kinds a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Checkbox,
    Likert,
    Dropdown,
    Textbox,
}

/// All valid widget kind strings.
const VALID_WIDGET_STRINGS: &[&str] = &["checkbox", "likert", "dropdown", "textbox"];

impl WidgetKind {
    /// Return the widget kind as a lowercase string slice.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checkbox => "checkbox",
            Self::Likert => "likert",
            Self::Dropdown => "dropdown",
            Self::Textbox => "textbox",
        }
    }

    /// Parse a widget kind from a string slice.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "checkbox" => Ok(Self::Checkbox),
            "likert" => Ok(Self::Likert),
            "dropdown" => Ok(Self::Dropdown),
            "textbox" => Ok(Self::Textbox),
            _ => Err(CoreError::SchemaValidation(format!(
                "Invalid widget type '{s}'. Must be one of: {}",
                VALID_WIDGET_STRINGS.join(", ")
            ))),
        }
    }
}

/// A field's widget together with its kind-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Checkbox,
    Likert { min: i64, max: i64 },
    Dropdown { options: Vec<String> },
    Textbox,
}

impl FieldKind {
    pub fn widget(&self) -> WidgetKind {
        match self {
            Self::Checkbox => WidgetKind::Checkbox,
            Self::Likert { .. } => WidgetKind::Likert,
            Self::Dropdown { .. } => WidgetKind::Dropdown,
            Self::Textbox => WidgetKind::Textbox,
        }
    }
}

// ---------------------------------------------------------------------------
// Schema model
// ---------------------------------------------------------------------------

/// One configured annotation input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Key of the field inside its section's `annotations` mapping.
    pub key: String,
    pub name: String,
    pub tooltip: String,
    pub example: Option<String>,
    pub kind: FieldKind,
    /// Dataset column this field writes to, see [`output_column_name`].
    pub column: String,
}

/// A named, instructed group of fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub key: String,
    pub name: String,
    pub instruction: String,
    pub fields: Vec<Field>,
}

/// A validated annotation schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub header_column: String,
    pub text_column: String,
    pub sections: Vec<Section>,
}

/// Build the dataset column name for a field: `<section_name>_<field_name>`.
pub fn output_column_name(section_name: &str, field_name: &str) -> String {
    format!("{section_name}_{field_name}")
}

impl Schema {
    /// Parse and validate an uploaded schema document (JSON or YAML).
    pub fn from_document(bytes: &[u8]) -> Result<Self, CoreError> {
        let doc = parse_document(bytes)?;
        Self::validate(&doc)
    }

    /// Validate a parsed schema document into a [`Schema`].
    ///
    /// Checks the designated header/text column keys, every section and
    /// field (see [`validate_sections`]), and that generated output column
    /// names are unique and do not shadow the header or text column.
    pub fn validate(doc: &Value) -> Result<Self, CoreError> {
        let obj = doc.as_object().ok_or_else(|| {
            CoreError::SchemaValidation("schema document must be a mapping".to_string())
        })?;

        let header_column = required_string(obj, HEADER_COLUMN_KEY, "schema")?;
        let text_column = required_string(obj, TEXT_COLUMN_KEY, "schema")?;
        let sections = validate_sections(obj)?;

        if sections.iter().all(|s| s.fields.is_empty()) {
            return Err(CoreError::SchemaValidation(
                "schema declares no annotation fields".to_string(),
            ));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(header_column.as_str());
        seen.insert(text_column.as_str());
        for field in sections.iter().flat_map(|s| s.fields.iter()) {
            if !seen.insert(field.column.as_str()) {
                return Err(CoreError::DuplicateColumn {
                    column: field.column.clone(),
                });
            }
        }

        Ok(Self {
            header_column,
            text_column,
            sections,
        })
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Output column names in declaration order.
    pub fn output_columns(&self) -> Vec<String> {
        self.fields().map(|f| f.column.clone()).collect()
    }

    /// Look up the field that writes to `column`.
    pub fn field_for_column(&self, column: &str) -> Option<&Field> {
        self.fields().find(|f| f.column == column)
    }
}

// ---------------------------------------------------------------------------
// Document parsing
// ---------------------------------------------------------------------------

/// Parse a schema document, trying JSON first and falling back to YAML.
///
/// Mapping key order is preserved either way.
pub fn parse_document(bytes: &[u8]) -> Result<Value, CoreError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CoreError::Parse(format!("schema is not valid UTF-8: {e}")))?;

    if text.trim().is_empty() {
        return Err(CoreError::Parse("schema document is empty".to_string()));
    }

    match serde_json::from_str::<Value>(text) {
        Ok(value) => Ok(value),
        Err(json_err) => serde_yaml::from_str::<Value>(text).map_err(|yaml_err| {
            CoreError::Parse(format!(
                "schema is neither valid JSON ({json_err}) nor valid YAML ({yaml_err})"
            ))
        }),
    }
}

/// Validate every `section_*` entry of a schema document, in order.
///
/// Used on its own by the builder preview, which renders sections before
/// the header/text columns are chosen.
pub fn validate_sections(doc: &Map<String, Value>) -> Result<Vec<Section>, CoreError> {
    doc.iter()
        .filter(|(key, _)| key.starts_with(SECTION_KEY_PREFIX))
        .map(|(key, value)| validate_section(key, value))
        .collect()
}

fn validate_section(key: &str, value: &Value) -> Result<Section, CoreError> {
    let obj = value.as_object().ok_or_else(|| {
        CoreError::SchemaValidation(format!("{key} must be a mapping"))
    })?;

    let name = required_string(obj, "section_name", key)?;
    let instruction = optional_string(obj, "section_instruction", key)?.unwrap_or_default();

    let fields = match obj.get("annotations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(annotations)) => annotations
            .iter()
            .map(|(field_key, field)| {
                validate_field(&format!("{key}.annotations.{field_key}"), field_key, &name, field)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(CoreError::SchemaValidation(format!(
                "{key}.annotations must be a mapping"
            )))
        }
    };

    Ok(Section {
        key: key.to_string(),
        name,
        instruction,
        fields,
    })
}

fn validate_field(
    path: &str,
    key: &str,
    section_name: &str,
    value: &Value,
) -> Result<Field, CoreError> {
    let obj = value.as_object().ok_or_else(|| {
        CoreError::SchemaValidation(format!("{path} must be a mapping"))
    })?;

    let name = required_string(obj, "name", path)?;
    let widget = required_string(obj, "type", path)?;
    let widget = WidgetKind::from_str(&widget)
        .map_err(|e| CoreError::SchemaValidation(format!("{path}: {e}")))?;
    let tooltip = optional_string(obj, "tooltip", path)?.unwrap_or_default();
    let example = optional_string(obj, "example", path)?.filter(|s| !s.is_empty());

    let kind = match widget {
        WidgetKind::Checkbox => FieldKind::Checkbox,
        WidgetKind::Textbox => FieldKind::Textbox,
        WidgetKind::Likert => {
            let (min, max) = likert_bounds(obj, path)?;
            FieldKind::Likert { min, max }
        }
        WidgetKind::Dropdown => FieldKind::Dropdown {
            options: dropdown_options(obj, path)?,
        },
    };

    Ok(Field {
        key: key.to_string(),
        column: output_column_name(section_name, &name),
        name,
        tooltip,
        example,
        kind,
    })
}

/// Resolve likert bounds from `min_value`/`max_value`, or `scale` (`1..=scale`).
fn likert_bounds(obj: &Map<String, Value>, path: &str) -> Result<(i64, i64), CoreError> {
    let min = obj.get("min_value").filter(|v| !v.is_null());
    let max = obj.get("max_value").filter(|v| !v.is_null());

    let (min, max) = match (min, max, obj.get("scale").filter(|v| !v.is_null())) {
        (Some(min), Some(max), _) => (
            integral(min, path, "min_value")?,
            integral(max, path, "max_value")?,
        ),
        (None, None, Some(scale)) => (1, integral(scale, path, "scale")?),
        _ => {
            return Err(CoreError::SchemaValidation(format!(
                "{path}: likert field requires min_value and max_value, or scale"
            )))
        }
    };

    if max <= min {
        return Err(CoreError::SchemaValidation(format!(
            "{path}: likert max_value ({max}) must be greater than min_value ({min})"
        )));
    }
    Ok((min, max))
}

fn dropdown_options(obj: &Map<String, Value>, path: &str) -> Result<Vec<String>, CoreError> {
    let options = obj.get("options").and_then(Value::as_array).ok_or_else(|| {
        CoreError::SchemaValidation(format!("{path}: dropdown field requires an options list"))
    })?;

    if options.is_empty() {
        return Err(CoreError::SchemaValidation(format!(
            "{path}: dropdown options must not be empty"
        )));
    }

    options
        .iter()
        .enumerate()
        .map(|(i, option)| match option {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(CoreError::SchemaValidation(format!(
                "{path}: options[{i}] must be a string"
            ))),
        })
        .collect()
}

/// Read an integer that may be encoded as an integral float or numeric string.
fn integral(value: &Value, path: &str, key: &str) -> Result<i64, CoreError> {
    let parsed = match value {
        Value::Number(n) => integral_number(n),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CoreError::SchemaValidation(format!("{path}: {key} must be an integer"))
    })
}

fn required_string(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String, CoreError> {
    match optional_string(obj, key, path)? {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(CoreError::SchemaValidation(format!(
            "{path} is missing required key '{key}'"
        ))),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<String>, CoreError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(CoreError::SchemaValidation(format!(
            "{path}.{key} must be a string"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
