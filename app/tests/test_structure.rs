//! FILENAME: tests/test_structure.rs
//! Integration tests for row/column structure, paging and undo/redo commands.

mod common;

use common::TestHarness;
use grid_app::commands;
use serde_json::json;

// ============================================================================
// ROWS
// ============================================================================

#[test]
fn test_add_row_respects_max_rows() {
    let harness = TestHarness::with_order_schema();
    for _ in 0..20 {
        commands::add_row(&harness.state).unwrap();
    }
    assert_eq!(harness.row_count(), 10);
}

#[test]
fn test_remove_row_respects_min_rows() {
    let harness = TestHarness::with_order_schema();
    for _ in 0..5 {
        commands::remove_row(&harness.state, 0).unwrap();
    }
    assert_eq!(harness.row_count(), 1);
}

#[test]
fn test_add_row_moves_to_last_page() {
    let harness = TestHarness::with_order_schema();
    let snapshot = commands::add_row(&harness.state).unwrap();

    assert_eq!(snapshot.rows.len(), 4);
    assert_eq!(snapshot.page.total_pages, 2);
    assert_eq!(snapshot.page.page, 1);
    assert_eq!(snapshot.rows[3]["qty"], json!(1));
}

#[test]
fn test_merge_selected_rows() {
    let harness = TestHarness::with_order_schema();
    harness
        .send(json!({"cmd": "set_external_data", "rows": [
            {"code": "A", "qty": 1},
            {"code": "B"},
            {"qty": 7, "price": 2}
        ]}))
        .unwrap();
    harness.send(json!({"cmd": "toggle_row_selection", "index": 0})).unwrap();
    harness.send(json!({"cmd": "toggle_row_selection", "index": 2})).unwrap();

    let snapshot = commands::merge_rows(&harness.state).unwrap();
    assert_eq!(snapshot.rows.len(), 2);
    assert_eq!(snapshot.rows[0]["code"], json!("A"));
    assert_eq!(snapshot.rows[0]["qty"], json!(7));
    assert_eq!(snapshot.rows[0]["price"], json!(2));
    assert!(snapshot.selected_rows.is_empty());
}

#[test]
fn test_split_row_duplicates_below() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "code", "value": "A"})).unwrap();
    harness.send(json!({"cmd": "toggle_row_selection", "index": 0})).unwrap();

    let snapshot = commands::split_row(&harness.state).unwrap();
    assert_eq!(snapshot.rows.len(), 4);
    assert_eq!(snapshot.rows[1]["code"], json!("A"));
}

// ============================================================================
// COLUMNS & HEADER
// ============================================================================

#[test]
fn test_added_column_joins_header_and_rows() {
    let harness = TestHarness::with_order_schema();
    let snapshot = commands::add_column(&harness.state, "Lot Number").unwrap();

    assert_eq!(snapshot.columns.len(), 6);
    assert_eq!(snapshot.columns[5].field_id, "lot_number");
    assert!(snapshot.rows.iter().all(|r| r["lot_number"] == json!("")));

    let top = &snapshot.header.rows[0];
    let appended = top.last().unwrap();
    assert_eq!(appended.label, "Lot Number");
    assert_eq!(appended.row_span, 2);
}

#[test]
fn test_removed_column_prunes_header_group() {
    let harness = TestHarness::with_order_schema();
    commands::remove_column(&harness.state, "code").unwrap();
    let snapshot = commands::remove_column(&harness.state, "desc").unwrap();

    let labels: Vec<&str> = snapshot.header.rows[0].iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Amounts"]);
    assert!(snapshot.rows.iter().all(|r| !r.contains_key("code")));
}

#[test]
fn test_merge_and_split_columns() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "code", "value": "A"})).unwrap();
    harness.send(json!({"cmd": "toggle_column_selection", "field_id": "code"})).unwrap();
    harness.send(json!({"cmd": "toggle_column_selection", "field_id": "qty"})).unwrap();

    let merged = commands::merge_columns(&harness.state).unwrap();
    assert_eq!(merged.columns.len(), 4);
    assert_eq!(merged.columns[0].field_name, "Code/Qty");
    assert_eq!(merged.rows[0]["code"], json!("A 1"));

    let split = commands::split_column(&harness.state).unwrap();
    assert_eq!(split.columns.len(), 5);
    assert_eq!(split.columns[4].field_id, "total_copy");
    assert_eq!(split.columns[4].field_name, "Total Copy");
}

// ============================================================================
// PAGING
// ============================================================================

#[test]
fn test_page_navigation_clamps() {
    let harness = TestHarness::with_order_schema();

    assert_eq!(commands::next_page(&harness.state).unwrap().page.page, 1);
    assert_eq!(commands::next_page(&harness.state).unwrap().page.page, 1);
    assert_eq!(commands::set_page(&harness.state, 50).unwrap().page.page, 1);
    assert_eq!(commands::prev_page(&harness.state).unwrap().page.page, 0);
    assert_eq!(commands::prev_page(&harness.state).unwrap().page.page, 0);
}

#[test]
fn test_removing_rows_pulls_page_back() {
    let harness = TestHarness::with_order_schema();
    commands::set_page(&harness.state, 1).unwrap();
    let snapshot = commands::remove_row(&harness.state, 2).unwrap();

    assert_eq!(snapshot.page.total_pages, 1);
    assert_eq!(snapshot.page.page, 0);
}

// ============================================================================
// UNDO / REDO
// ============================================================================

#[test]
fn test_undo_redo_through_commands() {
    let harness = TestHarness::with_order_schema();
    harness.send(json!({"cmd": "update_cell", "row": 0, "field_id": "price", "value": 4})).unwrap();
    commands::add_column(&harness.state, "Note").unwrap();

    let undone = commands::undo(&harness.state).unwrap();
    assert_eq!(undone.columns.len(), 5);
    assert!(undone.can_redo);

    let undone = commands::undo(&harness.state).unwrap();
    assert!(!undone.rows[0].contains_key("price"));
    assert!(!undone.can_undo);

    let redone = commands::redo(&harness.state).unwrap();
    assert_eq!(redone.rows[0]["price"], json!(4));
}

#[test]
fn test_new_edit_clears_redo() {
    let harness = TestHarness::with_order_schema();
    commands::add_row(&harness.state).unwrap();
    commands::undo(&harness.state).unwrap();
    let snapshot = commands::add_column(&harness.state, "").unwrap();

    assert!(!snapshot.can_redo);
    assert_eq!(snapshot.columns[5].field_name, "Column 6");
}
