//! FILENAME: core/engine/src/field_types.rs
//! PURPOSE: Field Type Registry - maps a `field_type` tag to its behavior.
//! CONTEXT: Every cell edit and every rendered cell goes through the behavior
//! registered for its column's tag. A behavior coerces raw edit input into
//! the stored value, judges whether a stored value is valid, and says whether
//! the field is editable at all. Unknown tags resolve to an opaque,
//! read-only behavior so a schema from a newer producer still loads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EditError;
use crate::schema::{Column, LookupOption};
use crate::value::{display_text, format_fixed, numeric, number_value, parse_number};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

// ============================================================================
// BEHAVIOR CONTRACT
// ============================================================================

/// Semantic family of a field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    FreeText,
    Numeric,
    Boolean,
    Enumerated,
    BinaryAsset,
    Derived,
    Opaque,
}

/// What a behavior can see while handling one cell.
#[derive(Debug, Clone, Copy)]
pub struct EditContext<'a> {
    pub column: &'a Column,
    /// Externally supplied options for this field id, if any.
    pub lookup_options: Option<&'a [LookupOption]>,
}

impl<'a> EditContext<'a> {
    pub fn new(column: &'a Column) -> Self {
        EditContext {
            column,
            lookup_options: None,
        }
    }

    pub fn with_lookup_options(mut self, options: Option<&'a [LookupOption]>) -> Self {
        self.lookup_options = options;
        self
    }
}

pub trait FieldBehavior: Send + Sync {
    fn kind(&self) -> FieldKind;

    /// Whether edits are refused regardless of the column's own flags.
    fn default_read_only(&self) -> bool {
        matches!(self.kind(), FieldKind::Derived | FieldKind::Opaque)
    }

    /// Turns raw edit input into the value to store.
    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError>;

    /// Validity of a stored value. Invalid values are kept but flagged.
    fn is_valid(&self, _ctx: &EditContext<'_>, _value: &Value) -> bool {
        true
    }

    /// Text shown for a stored value.
    fn display(&self, _ctx: &EditContext<'_>, value: &Value) -> String {
        display_text(value)
    }

    /// Choices offered for the field, in order.
    fn options<'a>(&self, _ctx: &EditContext<'a>) -> &'a [LookupOption] {
        &[]
    }
}

// ============================================================================
// BUILT-IN BEHAVIORS
// ============================================================================

pub struct TextField;

impl FieldBehavior for TextField {
    fn kind(&self) -> FieldKind {
        FieldKind::FreeText
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        let text = match raw {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Number(_) | Value::Bool(_) => display_text(raw),
            _ => {
                return Err(EditError::InvalidValue {
                    field_id: ctx.column.field_id.clone(),
                    reason: "text fields take a single value".to_string(),
                })
            }
        };

        let text = match ctx.column.max_length {
            Some(limit) if text.chars().count() > limit => text.chars().take(limit).collect(),
            _ => text,
        };

        Ok(Value::String(text))
    }
}

pub struct NumberField;

impl FieldBehavior for NumberField {
    fn kind(&self) -> FieldKind {
        FieldKind::Numeric
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::Number(_) => Ok(raw.clone()),
            Value::String(s) => parse_number(s).map(number_value).ok_or_else(|| EditError::InvalidNumber {
                field_id: ctx.column.field_id.clone(),
                value: s.clone(),
            }),
            other => Err(EditError::InvalidNumber {
                field_id: ctx.column.field_id.clone(),
                value: other.to_string(),
            }),
        }
    }

    fn is_valid(&self, ctx: &EditContext<'_>, value: &Value) -> bool {
        if crate::value::is_blank(value) {
            return true;
        }
        match (numeric(value), ctx.column.validation) {
            (Some(n), Some(rule)) => rule.contains(n),
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn display(&self, ctx: &EditContext<'_>, value: &Value) -> String {
        match (numeric(value), ctx.column.precision) {
            (Some(n), Some(decimals)) => format_fixed(n, decimals),
            _ => display_text(value),
        }
    }
}

pub struct BooleanField;

impl FieldBehavior for BooleanField {
    fn kind(&self) -> FieldKind {
        FieldKind::Boolean
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        let flag = match raw {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" | "" => false,
                _ => {
                    return Err(EditError::InvalidValue {
                        field_id: ctx.column.field_id.clone(),
                        reason: format!("'{}' is not a yes/no value", s),
                    })
                }
            },
            _ => {
                return Err(EditError::InvalidValue {
                    field_id: ctx.column.field_id.clone(),
                    reason: "expected a yes/no value".to_string(),
                })
            }
        };
        Ok(Value::Bool(flag))
    }
}

/// Where an enumerated field takes its choices from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    /// `Column.options` in the schema (`enum`).
    Column,
    /// Options supplied by the host per field id (`lookup`).
    Supplied,
}

pub struct ChoiceField {
    pub source: OptionSource,
}

impl ChoiceField {
    fn accepts_anything(&self, ctx: &EditContext<'_>) -> bool {
        self.source == OptionSource::Supplied && ctx.lookup_options.map_or(true, |o| o.is_empty())
    }
}

impl FieldBehavior for ChoiceField {
    fn kind(&self) -> FieldKind {
        FieldKind::Enumerated
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        let choice = match raw {
            Value::Null => return Ok(Value::String(String::new())),
            Value::String(_) | Value::Number(_) | Value::Bool(_) => display_text(raw),
            _ => {
                return Err(EditError::InvalidValue {
                    field_id: ctx.column.field_id.clone(),
                    reason: "expected a single choice".to_string(),
                })
            }
        };

        if choice.is_empty() || self.accepts_anything(ctx) || self.options(ctx).iter().any(|o| o.value == choice) {
            Ok(Value::String(choice))
        } else {
            Err(EditError::InvalidOption {
                field_id: ctx.column.field_id.clone(),
                value: choice,
            })
        }
    }

    fn is_valid(&self, ctx: &EditContext<'_>, value: &Value) -> bool {
        let choice = display_text(value);
        choice.is_empty() || self.accepts_anything(ctx) || self.options(ctx).iter().any(|o| o.value == choice)
    }

    /// Shows the option label when the stored value matches one.
    fn display(&self, ctx: &EditContext<'_>, value: &Value) -> String {
        let choice = display_text(value);
        self.options(ctx)
            .iter()
            .find(|o| o.value == choice)
            .map(|o| o.label.clone())
            .unwrap_or(choice)
    }

    fn options<'a>(&self, ctx: &EditContext<'a>) -> &'a [LookupOption] {
        let column: &'a Column = ctx.column;
        match self.source {
            OptionSource::Column => &column.options,
            OptionSource::Supplied => ctx.lookup_options.unwrap_or(&[]),
        }
    }
}

pub struct FormulaField;

impl FieldBehavior for FormulaField {
    fn kind(&self) -> FieldKind {
        FieldKind::Derived
    }

    fn coerce(&self, ctx: &EditContext<'_>, _raw: &Value) -> Result<Value, EditError> {
        Err(EditError::ReadOnly(ctx.column.field_id.clone()))
    }
}

/// A picked file or image, as handed over by the host's picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    pub name: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Inline payload, usually a data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl AssetRef {
    /// Checks an accept-list entry: `.ext`, `type/*` or an exact MIME type.
    pub fn matches_accept(&self, accept: &str) -> bool {
        let accept = accept.trim().to_ascii_lowercase();
        if accept.is_empty() {
            return false;
        }
        if accept.starts_with('.') {
            return self.name.to_ascii_lowercase().ends_with(&accept);
        }
        let mime = match &self.mime_type {
            Some(m) => m.to_ascii_lowercase(),
            None => return false,
        };
        match accept.strip_suffix("/*") {
            Some(family) => mime.split('/').next() == Some(family),
            None => mime == accept,
        }
    }
}

pub struct AssetField;

impl FieldBehavior for AssetField {
    fn kind(&self) -> FieldKind {
        FieldKind::BinaryAsset
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        let column = ctx.column;
        if raw.is_null() {
            return Ok(Value::Null);
        }

        let asset = AssetRef::deserialize(raw).map_err(|e| EditError::InvalidValue {
            field_id: column.field_id.clone(),
            reason: format!("not a file descriptor: {}", e),
        })?;

        if let Some(max_mb) = column.max_size_mb {
            if max_mb > 0.0 && asset.size_bytes as f64 > max_mb * BYTES_PER_MB {
                return Err(EditError::AssetTooLarge {
                    field_id: column.field_id.clone(),
                    max_mb,
                    size_bytes: asset.size_bytes,
                });
            }
        }

        if !column.file_types.is_empty() && !column.file_types.iter().any(|a| asset.matches_accept(a)) {
            return Err(EditError::AssetTypeRejected {
                field_id: column.field_id.clone(),
                allowed: column.file_types.join(","),
            });
        }

        serde_json::to_value(&asset).map_err(|e| EditError::InvalidValue {
            field_id: column.field_id.clone(),
            reason: e.to_string(),
        })
    }
}

pub struct SignatureField;

impl FieldBehavior for SignatureField {
    fn kind(&self) -> FieldKind {
        FieldKind::BinaryAsset
    }

    fn coerce(&self, ctx: &EditContext<'_>, raw: &Value) -> Result<Value, EditError> {
        match raw {
            Value::Null => Ok(Value::Null),
            Value::String(s) if s.is_empty() => Ok(Value::Null),
            Value::String(s) if s.starts_with("data:") => Ok(raw.clone()),
            _ => Err(EditError::InvalidValue {
                field_id: ctx.column.field_id.clone(),
                reason: "signature must be a data URL".to_string(),
            }),
        }
    }

    fn display(&self, _ctx: &EditContext<'_>, value: &Value) -> String {
        if crate::value::is_blank(value) {
            String::new()
        } else {
            "signed".to_string()
        }
    }
}

/// Fallback for unknown tags. Shows the stored value, accepts nothing.
pub struct OpaqueField;

impl FieldBehavior for OpaqueField {
    fn kind(&self) -> FieldKind {
        FieldKind::Opaque
    }

    fn coerce(&self, ctx: &EditContext<'_>, _raw: &Value) -> Result<Value, EditError> {
        Err(EditError::ReadOnly(ctx.column.field_id.clone()))
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Lookup of behaviors by `field_type` tag (case-insensitive).
#[derive(Clone)]
pub struct FieldTypeRegistry {
    behaviors: HashMap<String, Arc<dyn FieldBehavior>>,
    fallback: Arc<dyn FieldBehavior>,
}

impl FieldTypeRegistry {
    /// An empty registry; every tag resolves to the opaque behavior.
    pub fn new() -> Self {
        FieldTypeRegistry {
            behaviors: HashMap::new(),
            fallback: Arc::new(OpaqueField),
        }
    }

    pub fn with_builtin_types() -> Self {
        let mut registry = FieldTypeRegistry::new();
        registry.register("text", TextField);
        registry.register("number", NumberField);
        registry.register("boolean", BooleanField);
        registry.register("enum", ChoiceField { source: OptionSource::Column });
        registry.register("lookup", ChoiceField { source: OptionSource::Supplied });
        registry.register("formula", FormulaField);
        registry.register("image", AssetField);
        registry.register("file", AssetField);
        registry.register("signature", SignatureField);
        registry
    }

    /// Adds or replaces the behavior for one tag. Other tags are untouched.
    pub fn register<B: FieldBehavior + 'static>(&mut self, tag: &str, behavior: B) {
        self.behaviors
            .insert(tag.trim().to_ascii_lowercase(), Arc::new(behavior));
    }

    pub fn resolve(&self, tag: &str) -> &dyn FieldBehavior {
        self.behaviors
            .get(&tag.trim().to_ascii_lowercase())
            .map_or(&*self.fallback, |b| &**b)
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.behaviors.contains_key(&tag.trim().to_ascii_lowercase())
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.behaviors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl Default for FieldTypeRegistry {
    fn default() -> Self {
        Self::with_builtin_types()
    }
}

impl std::fmt::Debug for FieldTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldTypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
