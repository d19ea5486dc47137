//! FILENAME: tests/test_commands.rs
//! Integration tests for the JSON command surface.

mod common;

use common::{order_schema, TestHarness};
use grid_app::commands;
use serde_json::{json, Value};

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_load_schema_seeds_initial_rows() {
    let harness = TestHarness::new();
    let snapshot = harness.load(order_schema("/api/value"));

    assert_eq!(snapshot.columns.len(), 5);
    assert_eq!(snapshot.rows.len(), 3);
    assert_eq!(snapshot.rows[0]["qty"], json!(1));
    assert_eq!(snapshot.header.depth(), 2);
    assert_eq!(snapshot.page.total_pages, 2);
    assert!(!snapshot.can_undo);
}

#[test]
fn test_load_schema_rejects_non_json_object() {
    let harness = TestHarness::new();
    let result = commands::load_schema(&harness.state, json!([1, 2, 3]));
    assert!(result.is_err());
}

#[test]
fn test_external_data_replaces_rows() {
    let harness = TestHarness::with_order_schema();
    let result = harness
        .send(json!({"cmd": "set_external_data", "rows": [{"code": "A"}, {"code": "B"}]}))
        .unwrap();

    assert_eq!(result["rows"].as_array().map(Vec::len), Some(2));
    assert_eq!(harness.cell(1, "code"), json!("B"));
}

// ============================================================================
// CELL EDITS
// ============================================================================

#[test]
fn test_update_cell_and_formula_display() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "qty", "value": "2"})).unwrap();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "price", "value": 3})).unwrap();

    let total = commands::get_cell_view(&harness.state, 0, "total").unwrap();
    assert_eq!(total.value, json!(6));
    assert_eq!(total.display, "6.00");
    assert!(!total.editable);

    let price = commands::get_cell_view(&harness.state, 0, "price").unwrap();
    assert_eq!(price.display, "3.00");
}

#[test]
fn test_rejected_edit_reports_reason() {
    let harness = TestHarness::with_order_schema();

    let err = harness
        .send(json!({"cmd": "update_cell", "row": 0, "field_id": "qty", "value": "many"}))
        .unwrap_err();
    assert_eq!(err, "'many' is not a number");

    let err = harness
        .send(json!({"cmd": "update_cell", "row": 0, "field_id": "desc", "value": "x"}))
        .unwrap_err();
    assert_eq!(err, "field 'desc' is read-only");

    assert_eq!(harness.cell(0, "qty"), json!(1));
}

#[test]
fn test_out_of_range_value_is_flagged_not_rejected() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 1, "field_id": "qty", "value": 5000})).unwrap();

    let qty = commands::get_cell_view(&harness.state, 1, "qty").unwrap();
    assert_eq!(qty.value, json!(5000));
    assert!(!qty.valid);
}

#[test]
fn test_bound_edit_outside_runtime_drops_lookups() {
    let harness = TestHarness::with_order_schema();
    let result = commands::update_cell(&harness.state, 0, "code", json!("X-1")).unwrap();

    assert_eq!(result.lookups_started, 0);
    assert_eq!(result.snapshot.rows[0]["code"], json!("X-1"));
    assert_eq!(harness.snapshot().pending_lookups, 0);
}

#[test]
fn test_role_gate_through_commands() {
    let harness = TestHarness::new();
    harness.load(json!({"columns": [
        {"field_id": "qa_sign", "field_name": "QA", "field_type": "text", "signed_by_role": ["qa"]}
    ]}));

    assert!(harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "qa_sign", "value": "ok"})).is_err());

    harness.send(json!({"cmd": "set_user_role", "role": "qa"})).unwrap();
    assert!(harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "qa_sign", "value": "ok"})).is_ok());
}

#[test]
fn test_lookup_options_feed_cell_view() {
    let harness = TestHarness::new();
    harness.load(json!({"columns": [{"field_id": "line", "field_name": "Line", "field_type": "lookup"}]}));
    harness
        .send(json!({"cmd": "set_lookup_options", "options": {"line": [{"label": "Line 1", "value": 1}]}}))
        .unwrap();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "line", "value": "1"})).unwrap();

    let view = commands::get_cell_view(&harness.state, 0, "line").unwrap();
    assert_eq!(view.options.len(), 1);
    assert_eq!(view.display, "Line 1");

    let err = harness
        .send(json!({"cmd": "update_cell", "row": 0, "field_id": "line", "value": "9"}))
        .unwrap_err();
    assert!(err.contains("not an allowed option"));
}

// ============================================================================
// QUERIES & PROTOCOL
// ============================================================================

#[test]
fn test_export_rows_materializes_formulas() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 2, "field_id": "price", "value": 2.5})).unwrap();

    let rows = commands::export_rows(&harness.state).unwrap();
    assert_eq!(rows[2]["total"], json!(2.5));
    assert_eq!(harness.cell(2, "total"), Value::Null);
}

#[test]
fn test_page_view_lists_current_page() {
    let harness = TestHarness::with_order_schema();
    let view = commands::get_page_view(&harness.state).unwrap();
    assert_eq!(view.rows.len(), 2);
    assert_eq!(view.rows[0].cells.len(), 5);
}

#[test]
fn test_check_expression() {
    assert!(commands::check_expression("qty * price").valid);

    let check = commands::check_expression("qty *");
    assert!(!check.valid);
    assert!(check.error.is_some());
}

#[test]
fn test_handle_line_round_trip() {
    let harness = TestHarness::with_order_schema();

    let reply: Value = serde_json::from_str(&grid_app::handle_line(&harness.state, r#"{"cmd":"add_row"}"#)).unwrap();
    assert_eq!(reply["ok"], json!(true));
    assert_eq!(reply["result"]["rows"].as_array().map(Vec::len), Some(4));

    let reply: Value = serde_json::from_str(&grid_app::handle_line(&harness.state, r#"{"cmd":"fly"}"#)).unwrap();
    assert_eq!(reply["ok"], json!(false));
    assert!(reply["error"].as_str().unwrap().starts_with("Invalid command"));

    let reply: Value = serde_json::from_str(&grid_app::handle_line(&harness.state, "not json")).unwrap();
    assert_eq!(reply["ok"], json!(false));
}

#[test]
fn test_missing_cell_view_is_an_error() {
    let harness = TestHarness::with_order_schema();
    assert!(commands::get_cell_view(&harness.state, 0, "nope").is_err());
    assert!(commands::get_cell_view(&harness.state, 99, "qty").is_err());
}
