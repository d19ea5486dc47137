//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for grid host integration tests.

#![allow(dead_code)]

use grid_app::{create_app_state, execute, AppConfig, AppState, Command, GridSnapshot};
use serde_json::{json, Value};
use std::sync::Arc;

/// Test harness for creating and driving host state.
pub struct TestHarness {
    pub state: Arc<AppState>,
}

impl TestHarness {
    /// A harness with an empty schema.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        TestHarness {
            state: Arc::new(create_app_state(config).unwrap()),
        }
    }

    /// A harness with the production order sample schema loaded.
    pub fn with_order_schema() -> Self {
        let harness = Self::new();
        harness.load(order_schema("/api/value"));
        harness
    }

    pub fn load(&self, schema: Value) -> GridSnapshot {
        grid_app::commands::load_schema(&self.state, schema).unwrap()
    }

    /// Runs a command given in its JSON form.
    pub fn send(&self, command: Value) -> Result<Value, String> {
        let command: Command = serde_json::from_value(command).unwrap();
        execute(&self.state, command)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        grid_app::commands::get_snapshot(&self.state).unwrap()
    }

    pub fn row_count(&self) -> usize {
        self.state.store.lock().unwrap().rows().len()
    }

    pub fn cell(&self, row: usize, field_id: &str) -> Value {
        self.state
            .store
            .lock()
            .unwrap()
            .rows()
            .get(row)
            .and_then(|r| r.get(field_id).cloned())
            .unwrap_or(Value::Null)
    }
}

/// Work order line schema: code lookup, quantities, a computed total and a
/// two-level header.
pub fn order_schema(endpoint: &str) -> Value {
    json!({
        "table_config": {
            "columns": [
                {"field_id": "code", "field_name": "Code", "field_type": "text"},
                {"field_id": "desc", "field_name": "Description", "field_type": "text",
                 "read_only": true, "endpoint": endpoint, "bind_field": "code"},
                {"field_id": "qty", "field_name": "Qty", "field_type": "number",
                 "default_value": 1, "validation": {"min": 0, "max": 1000}},
                {"field_id": "price", "field_name": "Price", "field_type": "number", "precision": 2},
                {"field_id": "total", "field_name": "Total", "field_type": "formula",
                 "formula": "qty * price", "precision": 2}
            ],
            "header_structure": [
                {"label": "Item", "columns": ["code", "desc"]},
                {"label": "Amounts", "children": [
                    {"label": "Qty", "columns": ["qty"]},
                    {"label": "Price", "columns": ["price"]},
                    {"label": "Total", "columns": ["total"]}
                ]}
            ],
            "row_controls": {"mode": "growing", "min_rows": 1, "max_rows": 10, "initial_rows": 3},
            "pagination": {"enabled": true, "rows_per_page": 2}
        }
    })
}
