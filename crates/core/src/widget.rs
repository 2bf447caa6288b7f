//! Typed widget values and their coercion to and from stored cells.
//!
//! Every conversion matches exhaustively on [`FieldKind`], so a new widget
//! kind cannot be added without deciding how it is stored and rendered.

use serde::Serialize;
use serde_json::Value;

use crate::dataset::Cell;
use crate::error::CoreError;
use crate::schema::FieldKind;

/// Cell text written for a checked checkbox.
pub const CHECKED: &str = "1";

/// Cell text written for an unchecked checkbox.
pub const UNCHECKED: &str = "0";

/// Stored spellings that read back as a checked checkbox.
const TRUTHY: &[&str] = &["1", "1.0", "true", "yes"];

/// The current value of one widget.
///
/// Serializes untagged so the browser sees plain JSON: `true`, `3`,
/// `"option"` / `null`, `"text"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WidgetValue {
    Checkbox(bool),
    Likert(i64),
    /// `None` is the "no selection" state, distinct from every option.
    Dropdown(Option<String>),
    Textbox(String),
}

impl WidgetValue {
    /// The value a widget shows when its field has not been answered.
    pub fn default_for(kind: &FieldKind) -> Self {
        match kind {
            FieldKind::Checkbox => Self::Checkbox(false),
            FieldKind::Likert { min, .. } => Self::Likert(*min),
            FieldKind::Dropdown { .. } => Self::Dropdown(None),
            FieldKind::Textbox => Self::Textbox(String::new()),
        }
    }

    /// Read a stored cell as a widget value.
    ///
    /// Unset cells, and stored text that is not a legal value for the field,
    /// fall back to [`WidgetValue::default_for`].
    pub fn from_cell(kind: &FieldKind, cell: &Cell) -> Self {
        let Cell::Value(raw) = cell else {
            return Self::default_for(kind);
        };

        match kind {
            FieldKind::Checkbox => {
                let normalized = raw.trim().to_ascii_lowercase();
                Self::Checkbox(TRUTHY.contains(&normalized.as_str()))
            }
            FieldKind::Likert { min, max } => match parse_integral(raw) {
                Some(n) if (*min..=*max).contains(&n) => Self::Likert(n),
                _ => Self::Likert(*min),
            },
            FieldKind::Dropdown { options } => {
                Self::Dropdown(options.iter().find(|o| *o == raw).cloned())
            }
            FieldKind::Textbox => Self::Textbox(raw.clone()),
        }
    }

    /// Coerce the widget value into the cell written to the dataset.
    pub fn to_cell(&self) -> Cell {
        match self {
            Self::Checkbox(true) => Cell::Value(CHECKED.to_string()),
            Self::Checkbox(false) => Cell::Value(UNCHECKED.to_string()),
            Self::Likert(n) => Cell::Value(n.to_string()),
            Self::Dropdown(Some(option)) => Cell::Value(option.clone()),
            Self::Dropdown(None) => Cell::Unset,
            Self::Textbox(text) => Cell::Value(text.clone()),
        }
    }

    /// Interpret a JSON value sent by the browser for a field of `kind`.
    pub fn from_json(kind: &FieldKind, value: &Value) -> Result<Self, CoreError> {
        match (kind, value) {
            (FieldKind::Checkbox, Value::Bool(b)) => Ok(Self::Checkbox(*b)),
            (FieldKind::Checkbox, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Self::Checkbox(false)),
                Some(1) => Ok(Self::Checkbox(true)),
                _ => Err(CoreError::Validation(format!(
                    "checkbox value must be true/false or 0/1, got {n}"
                ))),
            },
            (FieldKind::Likert { min, max }, Value::Number(n)) => match integral_number(n) {
                Some(v) if (*min..=*max).contains(&v) => Ok(Self::Likert(v)),
                _ => Err(CoreError::Validation(format!(
                    "likert value must be an integer between {min} and {max}, got {n}"
                ))),
            },
            (FieldKind::Dropdown { .. }, Value::Null) => Ok(Self::Dropdown(None)),
            (FieldKind::Dropdown { options }, Value::String(s)) => {
                if options.contains(s) {
                    Ok(Self::Dropdown(Some(s.clone())))
                } else {
                    Err(CoreError::Validation(format!(
                        "'{s}' is not one of the dropdown options: {}",
                        options.join(", ")
                    )))
                }
            }
            (FieldKind::Textbox, Value::String(s)) => Ok(Self::Textbox(s.clone())),
            (kind, other) => Err(CoreError::Validation(format!(
                "invalid value {other} for {} field",
                kind.widget().as_str()
            ))),
        }
    }
}

/// Parse integer text, accepting integral floats such as `"3.0"`.
fn parse_integral(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(integral_float))
}

/// Read a JSON number as an integer, accepting integral floats such as `3.0`.
pub(crate) fn integral_number(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| n.as_f64().and_then(integral_float))
}

/// Floats outside the `i64` range are rejected rather than saturated.
fn integral_float(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.is_finite() && f.fract() == 0.0 && in_range).then_some(f as i64)
}
