//! FILENAME: core/engine/src/state.rs
//! PURPOSE: The canonical grid state: columns, rows, selections and page cursor.
//! CONTEXT: GridState is plain data. Structural transitions take one state
//! and return the next; the store owns the current one and keeps history as
//! snapshots of it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::schema::{Column, Row};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridState {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub selected_rows: BTreeSet<usize>,
    pub selected_cols: BTreeSet<String>,
    pub page: usize,
}

impl GridState {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>) -> Self {
        GridState {
            columns,
            rows,
            ..Default::default()
        }
    }

    pub fn column(&self, field_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field_id == field_id)
    }

    pub fn column_index(&self, field_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field_id == field_id)
    }

    pub fn has_column(&self, field_id: &str) -> bool {
        self.column_index(field_id).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Adds or removes a row from the selection. Out-of-range indices are ignored.
    pub fn toggle_row_selection(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        if !self.selected_rows.remove(&index) {
            self.selected_rows.insert(index);
        }
        true
    }

    /// Adds or removes a column from the selection. Unknown ids are ignored.
    pub fn toggle_column_selection(&mut self, field_id: &str) -> bool {
        if !self.has_column(field_id) {
            return false;
        }
        if !self.selected_cols.remove(field_id) {
            self.selected_cols.insert(field_id.to_string());
        }
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected_rows.clear();
        self.selected_cols.clear();
    }

    /// Selected column ids in column order.
    pub fn selected_columns_in_order(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|c| c.field_id.as_str())
            .filter(|id| self.selected_cols.contains(*id))
            .collect()
    }
}
