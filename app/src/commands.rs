//! FILENAME: app/src/commands.rs
// PURPOSE: Command surface over the grid store.
// CONTEXT: One function per store operation, each returning Result<_, String>
// for the host boundary. `Command` is the JSON form read by the binary, one
// object per line: {"cmd": "update_cell", "row": 0, "field_id": "qty", "value": 3}.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, MutexGuard};

use grid_engine::{CellView, GridStore, LookupOption, PageView, Row, Schema};

use crate::api_types::{EditResult, ExpressionCheck, GridSnapshot};
use crate::lookup::spawn_lookups;
use crate::{log_debug, log_enter, log_exit, AppState};

fn lock_store(state: &AppState) -> Result<MutexGuard<'_, GridStore>, String> {
    state.store.lock().map_err(|e| format!("Lock error: {}", e))
}

/// Runs a mutation and returns the resulting snapshot.
fn mutate<F>(state: &AppState, name: &str, f: F) -> Result<GridSnapshot, String>
where
    F: FnOnce(&mut GridStore) -> bool,
{
    let mut store = lock_store(state)?;
    let changed = f(&mut store);
    if !changed {
        log_debug!("CMD", "{} made no change", name);
    }
    Ok(GridSnapshot::capture(&store))
}

// ============================================================================
// SESSION INPUTS
// ============================================================================

pub fn load_schema(state: &AppState, schema: Value) -> Result<GridSnapshot, String> {
    log_enter!("CMD", "load_schema");
    let schema = Schema::from_value(&schema).map_err(|e| e.to_string())?;
    let mut store = lock_store(state)?;
    store.load_schema(schema);
    log_exit!("CMD", "load_schema", "{} columns", store.columns().len());
    Ok(GridSnapshot::capture(&store))
}

pub fn set_external_data(state: &AppState, rows: Vec<Row>) -> Result<GridSnapshot, String> {
    mutate(state, "set_external_data", |store| {
        store.set_external_data(rows);
        true
    })
}

pub fn set_lookup_options(state: &AppState, options: HashMap<String, Vec<LookupOption>>) -> Result<GridSnapshot, String> {
    mutate(state, "set_lookup_options", |store| {
        store.set_lookup_options(options);
        true
    })
}

pub fn set_user_role(state: &AppState, role: Option<String>) -> Result<GridSnapshot, String> {
    mutate(state, "set_user_role", |store| {
        store.set_user_role(role);
        true
    })
}

// ============================================================================
// CELL EDITS
// ============================================================================

/// Applies an edit and starts any lookups it triggers.
pub fn update_cell(state: &Arc<AppState>, row: usize, field_id: &str, value: Value) -> Result<EditResult, String> {
    log_enter!("CMD", "update_cell", "row={} field={}", row, field_id);
    let (requests, snapshot) = {
        let mut store = lock_store(state)?;
        let requests = store.update_cell(row, field_id, value).map_err(|e| e.to_string())?;
        (requests, GridSnapshot::capture(&store))
    };

    let lookups_started = spawn_lookups(state, requests).len();
    log_exit!("CMD", "update_cell", "lookups={}", lookups_started);
    Ok(EditResult {
        snapshot,
        lookups_started,
    })
}

// ============================================================================
// STRUCTURAL EDITS
// ============================================================================

pub fn add_row(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "add_row", GridStore::add_row)
}

pub fn remove_row(state: &AppState, index: usize) -> Result<GridSnapshot, String> {
    mutate(state, "remove_row", |store| store.remove_row(index))
}

pub fn add_column(state: &AppState, label: &str) -> Result<GridSnapshot, String> {
    mutate(state, "add_column", |store| store.add_column(label))
}

pub fn remove_column(state: &AppState, field_id: &str) -> Result<GridSnapshot, String> {
    mutate(state, "remove_column", |store| store.remove_column(field_id))
}

pub fn merge_rows(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "merge_rows", GridStore::merge_rows)
}

pub fn split_row(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "split_row", GridStore::split_row)
}

pub fn merge_columns(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "merge_columns", GridStore::merge_columns)
}

pub fn split_column(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "split_column", GridStore::split_column)
}

// ============================================================================
// SELECTION, PAGING, HISTORY
// ============================================================================

pub fn toggle_row_selection(state: &AppState, index: usize) -> Result<GridSnapshot, String> {
    mutate(state, "toggle_row_selection", |store| store.toggle_row_selection(index))
}

pub fn toggle_column_selection(state: &AppState, field_id: &str) -> Result<GridSnapshot, String> {
    mutate(state, "toggle_column_selection", |store| store.toggle_column_selection(field_id))
}

pub fn clear_selection(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "clear_selection", |store| {
        store.clear_selection();
        true
    })
}

pub fn set_page(state: &AppState, page: usize) -> Result<GridSnapshot, String> {
    mutate(state, "set_page", |store| store.set_page(page) == page)
}

pub fn next_page(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "next_page", |store| {
        let before = store.page_info().page;
        store.next_page() != before
    })
}

pub fn prev_page(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "prev_page", |store| {
        let before = store.page_info().page;
        store.prev_page() != before
    })
}

pub fn undo(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "undo", GridStore::undo)
}

pub fn redo(state: &AppState) -> Result<GridSnapshot, String> {
    mutate(state, "redo", GridStore::redo)
}

// ============================================================================
// QUERIES
// ============================================================================

pub fn get_snapshot(state: &AppState) -> Result<GridSnapshot, String> {
    let store = lock_store(state)?;
    Ok(GridSnapshot::capture(&store))
}

pub fn get_page_view(state: &AppState) -> Result<PageView, String> {
    let store = lock_store(state)?;
    Ok(store.page_view())
}

pub fn get_cell_view(state: &AppState, row: usize, field_id: &str) -> Result<CellView, String> {
    let store = lock_store(state)?;
    store
        .cell_view(row, field_id)
        .ok_or_else(|| format!("No cell at row {} field '{}'", row, field_id))
}

/// Rows with formula results filled in.
pub fn export_rows(state: &AppState) -> Result<Vec<Row>, String> {
    let store = lock_store(state)?;
    Ok(store.materialized_rows())
}

/// Parses a formula or visibility expression without evaluating it.
pub fn check_expression(source: &str) -> ExpressionCheck {
    match grid_expr::parse(source) {
        Ok(_) => ExpressionCheck {
            valid: true,
            error: None,
        },
        Err(e) => ExpressionCheck {
            valid: false,
            error: Some(e.to_string()),
        },
    }
}

// ============================================================================
// JSON COMMAND PROTOCOL
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    LoadSchema { schema: Value },
    SetExternalData { rows: Vec<Row> },
    SetLookupOptions { options: HashMap<String, Vec<LookupOption>> },
    SetUserRole { role: Option<String> },
    UpdateCell { row: usize, field_id: String, value: Value },
    AddRow,
    RemoveRow { index: usize },
    AddColumn {
        #[serde(default)]
        label: String,
    },
    RemoveColumn { field_id: String },
    MergeRows,
    SplitRow,
    MergeColumns,
    SplitColumn,
    ToggleRowSelection { index: usize },
    ToggleColumnSelection { field_id: String },
    ClearSelection,
    SetPage { page: usize },
    NextPage,
    PrevPage,
    Undo,
    Redo,
    GetSnapshot,
    GetPageView,
    GetCellView { row: usize, field_id: String },
    ExportRows,
    CheckExpression { source: String },
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    fn from_result(result: Result<Value, String>) -> Self {
        match result {
            Ok(value) => Response {
                ok: true,
                result: Some(value),
                error: None,
            },
            Err(error) => Response {
                ok: false,
                result: None,
                error: Some(error),
            },
        }
    }
}

fn to_json<T: Serialize>(result: Result<T, String>) -> Result<Value, String> {
    result.and_then(|v| serde_json::to_value(v).map_err(|e| format!("Serialization error: {}", e)))
}

pub fn execute(state: &Arc<AppState>, command: Command) -> Result<Value, String> {
    match command {
        Command::LoadSchema { schema } => to_json(load_schema(state, schema)),
        Command::SetExternalData { rows } => to_json(set_external_data(state, rows)),
        Command::SetLookupOptions { options } => to_json(set_lookup_options(state, options)),
        Command::SetUserRole { role } => to_json(set_user_role(state, role)),
        Command::UpdateCell { row, field_id, value } => to_json(update_cell(state, row, &field_id, value)),
        Command::AddRow => to_json(add_row(state)),
        Command::RemoveRow { index } => to_json(remove_row(state, index)),
        Command::AddColumn { label } => to_json(add_column(state, &label)),
        Command::RemoveColumn { field_id } => to_json(remove_column(state, &field_id)),
        Command::MergeRows => to_json(merge_rows(state)),
        Command::SplitRow => to_json(split_row(state)),
        Command::MergeColumns => to_json(merge_columns(state)),
        Command::SplitColumn => to_json(split_column(state)),
        Command::ToggleRowSelection { index } => to_json(toggle_row_selection(state, index)),
        Command::ToggleColumnSelection { field_id } => to_json(toggle_column_selection(state, &field_id)),
        Command::ClearSelection => to_json(clear_selection(state)),
        Command::SetPage { page } => to_json(set_page(state, page)),
        Command::NextPage => to_json(next_page(state)),
        Command::PrevPage => to_json(prev_page(state)),
        Command::Undo => to_json(undo(state)),
        Command::Redo => to_json(redo(state)),
        Command::GetSnapshot => to_json(get_snapshot(state)),
        Command::GetPageView => to_json(get_page_view(state)),
        Command::GetCellView { row, field_id } => to_json(get_cell_view(state, row, &field_id)),
        Command::ExportRows => to_json(export_rows(state)),
        Command::CheckExpression { source } => to_json(Ok(check_expression(&source))),
    }
}

/// Parses and runs one protocol line, returning the response line.
pub fn handle_line(state: &Arc<AppState>, line: &str) -> String {
    let result = serde_json::from_str::<Command>(line)
        .map_err(|e| format!("Invalid command: {}", e))
        .and_then(|command| execute(state, command));

    let response = Response::from_result(result);
    serde_json::to_string(&response)
        .unwrap_or_else(|e| format!(r#"{{"ok":false,"error":"Serialization error: {}"}}"#, e))
}
