//! FILENAME: app/src/api_types.rs
// PURPOSE: Shared data structures for the host command surface.

use grid_engine::{Column, GridStore, HeaderLayout, PageInfo, Row};
use serde::Serialize;

/// Full grid state returned after every command.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSnapshot {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub header: HeaderLayout,
    pub page: PageInfo,
    pub selected_rows: Vec<usize>,
    pub selected_columns: Vec<String>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Lookups still in flight.
    pub pending_lookups: usize,
}

impl GridSnapshot {
    pub fn capture(store: &GridStore) -> Self {
        let state = store.state();
        GridSnapshot {
            columns: state.columns.clone(),
            rows: state.rows.clone(),
            header: store.header_layout().clone(),
            page: store.page_info(),
            selected_rows: state.selected_rows.iter().copied().collect(),
            selected_columns: state.selected_cols.iter().cloned().collect(),
            can_undo: store.can_undo(),
            can_redo: store.can_redo(),
            pending_lookups: store.pending_enrichments(),
        }
    }
}

/// Result of a cell edit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub snapshot: GridSnapshot,
    /// Number of lookups the edit started.
    pub lookups_started: usize,
}

/// Result of checking a formula or visibility expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Unsolicited line written whenever the row collection changes, including
/// changes made by lookups that finish after their command returned.
#[derive(Debug, Clone, Serialize)]
pub struct RowsChangedEvent {
    pub event: &'static str,
    pub rows: Vec<Row>,
}

impl RowsChangedEvent {
    pub fn new(rows: Vec<Row>) -> Self {
        RowsChangedEvent {
            event: "rows_changed",
            rows,
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"event":"rows_changed","error":"Serialization error: {}"}}"#, e))
    }
}
