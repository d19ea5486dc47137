//! FILENAME: core/engine/src/schema.rs
//! PURPOSE: The declarative grid schema and its lenient loader.
//! CONTEXT: A schema document drives everything the engine does: which
//! columns exist, how each field behaves, how headers are grouped and how
//! rows are seeded. Documents come from outside and are often hand-written,
//! so each section is read independently and a malformed section falls back
//! to its defaults with a warning instead of rejecting the whole document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::SchemaError;

/// A single record. Values are untyped at rest and interpreted per field type.
pub type Row = Map<String, Value>;

// ============================================================================
// COLUMN DEFINITIONS
// ============================================================================

/// Inclusive numeric bounds for `number` fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRule {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValidationRule {
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// A selectable choice for `enum` and `lookup` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    #[serde(deserialize_with = "scalar_string")]
    pub label: String,
    #[serde(deserialize_with = "scalar_string")]
    pub value: String,
}

impl LookupOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        LookupOption {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One column of the grid. `field_id` is the stable identity of the column
/// and the key under which every row stores the column's value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Column {
    pub field_id: String,
    pub field_name: String,
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    pub required: bool,
    pub read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<LookupOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_field: Option<String>,
    pub multiline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Text-area height hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    pub capture_camera: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signed_by_role: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility_condition: Option<String>,
}

impl Column {
    /// A plain column of the given type with no optional settings.
    pub fn new(field_id: impl Into<String>, field_name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Column {
            field_id: field_id.into(),
            field_name: field_name.into(),
            field_type: field_type.into(),
            ..Default::default()
        }
    }

    /// True when the column is fed by an enrichment lookup on `source_field`.
    pub fn is_enriched_from(&self, source_field: &str) -> bool {
        self.endpoint.as_deref().map_or(false, |e| !e.trim().is_empty())
            && self.bind_field.as_deref() == Some(source_field)
    }

    /// Role gate. Columns without a role list are open to everyone.
    pub fn permits_role(&self, role: Option<&str>) -> bool {
        if self.signed_by_role.is_empty() {
            return true;
        }
        let role = role.unwrap_or("");
        self.signed_by_role.iter().any(|r| r == role)
    }

    /// The visibility condition, if it has any content.
    pub fn visibility_source(&self) -> Option<&str> {
        self.visibility_condition
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Salvages the identifying keys of a column object that failed to
    /// deserialize as a whole.
    fn salvage(obj: &Map<String, Value>) -> Column {
        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default()
        };
        Column::new(text("field_id"), text("field_name"), text("field_type"))
    }
}

/// A node in the grouped header description. Leaves list the field ids they
/// cover; internal nodes only group their children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderNode {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<HeaderNode>>,
}

impl HeaderNode {
    pub fn has_children(&self) -> bool {
        self.children.as_ref().map_or(false, |c| !c.is_empty())
    }
}

// ============================================================================
// TABLE-LEVEL SETTINGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMode {
    Fixed,
    #[default]
    Growing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlSide {
    Left,
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RowControls {
    pub mode: RowMode,
    pub min_rows: Option<usize>,
    pub max_rows: Option<usize>,
    pub allow_add_remove: bool,
    pub initial_rows: Option<usize>,
    pub side: ControlSide,
}

impl RowControls {
    /// Number of records to seed when there is neither data nor preload.
    pub fn initial_row_count(&self) -> usize {
        match self.initial_rows {
            Some(n) if n > 0 => n,
            _ => 1,
        }
    }
}

pub const DEFAULT_ROWS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub enabled: bool,
    pub rows_per_page: Option<usize>,
}

impl PaginationConfig {
    pub fn page_size(&self) -> usize {
        match self.rows_per_page {
            Some(n) if n > 0 => n,
            _ => DEFAULT_ROWS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnWidthMode {
    #[default]
    Auto,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub column_count: Option<usize>,
    pub column_width_mode: ColumnWidthMode,
    pub sticky_headers: bool,
    pub resizable_columns: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableStyle {
    pub table_border: bool,
    pub striped_rows: bool,
    pub alternate_row_color: Option<String>,
    pub header_color: Option<String>,
    pub header_font_color: Option<String>,
}

// ============================================================================
// SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Schema {
    pub columns: Vec<Column>,
    pub header_structure: Option<Vec<HeaderNode>>,
    pub preload_rows: Option<Vec<Row>>,
    pub row_controls: RowControls,
    pub pagination: PaginationConfig,
    pub column_layout: ColumnLayout,
    pub style: TableStyle,
}

impl Schema {
    pub fn from_json_str(input: &str) -> Result<Schema, SchemaError> {
        let value: Value = serde_json::from_str(input)?;
        Schema::from_value(&value)
    }

    /// Reads a schema document, either wrapped as `{"table_config": {...}}`
    /// or bare.
    pub fn from_value(value: &Value) -> Result<Schema, SchemaError> {
        let root = value.as_object().ok_or(SchemaError::NotAnObject)?;
        let config = match root.get("table_config") {
            Some(Value::Object(inner)) => inner,
            Some(_) => {
                log::warn!("table_config is not an object; reading schema keys from the root");
                root
            }
            None => root,
        };

        Ok(Schema {
            columns: read_columns(config.get("columns")),
            header_structure: read_section(config, "header_structure"),
            preload_rows: read_preload_rows(config.get("preload_rows")),
            row_controls: read_section::<RowControls>(config, "row_controls").unwrap_or_default(),
            pagination: read_section::<PaginationConfig>(config, "pagination").unwrap_or_default(),
            column_layout: read_section::<ColumnLayout>(config, "column_layout").unwrap_or_default(),
            style: read_section::<TableStyle>(config, "style").unwrap_or_default(),
        })
    }

    pub fn column(&self, field_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field_id == field_id)
    }

    /// A record holding only the declared default values.
    pub fn default_row(&self) -> Row {
        default_row(&self.columns)
    }

    /// Rows to start a session with: external data if non-empty, else the
    /// preload rows, else `initial_rows` default records.
    pub fn seed_rows(&self, external: &[Row]) -> Vec<Row> {
        if !external.is_empty() {
            return external.to_vec();
        }
        if let Some(preload) = &self.preload_rows {
            return preload.clone();
        }
        (0..self.row_controls.initial_row_count())
            .map(|_| self.default_row())
            .collect()
    }
}

/// A record holding the declared default value of every column that has one.
pub fn default_row(columns: &[Column]) -> Row {
    let mut row = Row::new();
    for col in columns {
        if let Some(default) = &col.default_value {
            row.insert(col.field_id.clone(), default.clone());
        }
    }
    row
}

// ============================================================================
// LENIENT READERS
// ============================================================================

fn read_section<T>(config: &Map<String, Value>, key: &str) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
{
    match config.get(key) {
        None | Some(Value::Null) => None,
        Some(raw) => match T::deserialize(raw) {
            Ok(section) => Some(section),
            Err(e) => {
                log::warn!("schema section '{}' is malformed, using defaults: {}", key, e);
                None
            }
        },
    }
}

fn read_columns(raw: Option<&Value>) -> Vec<Column> {
    let items = match raw {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(_) => {
            log::warn!("schema 'columns' is not an array; starting with no columns");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            log::warn!("column #{} is not an object; skipped", index);
            continue;
        };

        let mut column = match Column::deserialize(item) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("column #{} is malformed ({}); keeping identity only", index, e);
                Column::salvage(obj)
            }
        };

        if column.field_id.trim().is_empty() {
            log::warn!("column #{} has no field_id; skipped", index);
            continue;
        }
        if !seen.insert(column.field_id.clone()) {
            log::warn!("duplicate field_id '{}'; keeping the first", column.field_id);
            continue;
        }
        if column.field_name.trim().is_empty() {
            column.field_name = column.field_id.clone();
        }

        columns.push(column);
    }

    columns
}

fn read_preload_rows(raw: Option<&Value>) -> Option<Vec<Row>> {
    match raw? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::Object(row) => Some(row.clone()),
                    other => {
                        log::warn!("preload row is not an object; skipped: {}", other);
                        None
                    }
                })
                .collect(),
        ),
        Value::Null => None,
        _ => {
            log::warn!("schema 'preload_rows' is not an array; ignored");
            None
        }
    }
}

/// Accepts any JSON scalar where a string is expected.
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!("expected a scalar, found {}", other))),
    }
}
