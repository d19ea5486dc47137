//! FILENAME: core/engine/src/error.rs
//! PURPOSE: Error types for schema loading and cell edits.
//! CONTEXT: Every failure in the engine is local. A rejected edit leaves the
//! grid untouched and editable; a bad schema section degrades to defaults and
//! only a document that is not JSON at all surfaces as a SchemaError.

use thiserror::Error;

/// Why a single cell edit was refused.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("row {0} does not exist")]
    RowOutOfRange(usize),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("field '{0}' is read-only")]
    ReadOnly(String),

    #[error("field '{0}' is hidden for this row")]
    Hidden(String),

    #[error("'{value}' is not a number")]
    InvalidNumber { field_id: String, value: String },

    #[error("'{value}' is not an allowed option for '{field_id}'")]
    InvalidOption { field_id: String, value: String },

    #[error("invalid value for '{field_id}': {reason}")]
    InvalidValue { field_id: String, reason: String },

    /// Oversized binary asset. The message is the notice shown to the user.
    #[error("File too large. Max {max_mb}MB")]
    AssetTooLarge {
        field_id: String,
        max_mb: f64,
        size_bytes: u64,
    },

    #[error("File type not accepted. Allowed: {allowed}")]
    AssetTypeRejected { field_id: String, allowed: String },
}

impl EditError {
    /// True for the rejections that come with a notice for the person editing.
    pub fn is_user_notice(&self) -> bool {
        matches!(
            self,
            EditError::AssetTooLarge { .. } | EditError::AssetTypeRejected { .. }
        )
    }
}

/// Failure to read a schema document at all.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema document must be a JSON object")]
    NotAnObject,
}
