//! FILENAME: core/engine/src/header.rs
//! PURPOSE: Header Tree Builder - flattens grouped headers into display rows.
//! CONTEXT: A schema may describe multi-level grouped headers as a tree of
//! HeaderNode. Renderers need that tree as rows of cells with column and row
//! spans. The layout is rebuilt whenever the column list changes, so field
//! ids that no longer exist are dropped and runtime-added columns still get
//! a header cell.

use serde::Serialize;
use std::collections::HashSet;

use crate::schema::{Column, HeaderNode};

/// One cell in a header display row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderCell {
    pub label: String,
    pub depth: usize,
    pub col_span: usize,
    pub row_span: usize,
    /// Every field id under this cell, in source order.
    pub field_ids: Vec<String>,
    /// Set for a childless cell covering exactly one column.
    pub field_id: Option<String>,
    pub has_children: bool,
}

/// Header rows indexed by depth.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HeaderLayout {
    pub rows: Vec<Vec<HeaderCell>>,
}

impl HeaderLayout {
    pub fn depth(&self) -> usize {
        self.rows.len()
    }
}

/// Builds the header layout for the current columns.
pub fn build_header_layout(structure: Option<&[HeaderNode]>, columns: &[Column]) -> HeaderLayout {
    let present: HashSet<&str> = columns.iter().map(|c| c.field_id.as_str()).collect();

    let mut nodes: Vec<HeaderNode> = structure
        .map(|nodes| nodes.iter().filter_map(|n| prune(n, &present)).collect())
        .unwrap_or_default();

    // Columns the description does not mention get their own leaf, placed
    // after the top-level node holding the column before them
    let mut referenced = HashSet::new();
    for node in &nodes {
        collect_ids(node, &mut referenced);
    }
    let mut anchor = 0;
    for col in columns {
        if referenced.contains(&col.field_id) {
            if let Some(pos) = nodes.iter().position(|n| contains_id(n, &col.field_id)) {
                anchor = anchor.max(pos + 1);
            }
            continue;
        }
        nodes.insert(
            anchor,
            HeaderNode {
                label: col.field_name.clone(),
                columns: Some(vec![col.field_id.clone()]),
                children: None,
            },
        );
        anchor += 1;
    }

    let depth_count = nodes.iter().map(node_depth).max().unwrap_or(0).max(1);
    let mut rows: Vec<Vec<HeaderCell>> = vec![Vec::new(); depth_count];
    for node in &nodes {
        flatten(node, 0, depth_count, &mut rows);
    }

    // Drop trailing empty rows (only possible when there are no columns at all)
    while rows.last().map_or(false, |r| r.is_empty()) {
        rows.pop();
    }

    HeaderLayout { rows }
}

/// Removes field ids that are gone. A node whose subtree referenced columns
/// and now references none is removed entirely.
fn prune(node: &HeaderNode, present: &HashSet<&str>) -> Option<HeaderNode> {
    let had_leaves = count_ids(node) > 0;

    let columns = node
        .columns
        .as_ref()
        .map(|ids| ids.iter().filter(|id| present.contains(id.as_str())).cloned().collect::<Vec<_>>());
    let children = node
        .children
        .as_ref()
        .map(|kids| kids.iter().filter_map(|k| prune(k, present)).collect::<Vec<_>>());

    let pruned = HeaderNode {
        label: node.label.clone(),
        columns,
        children: children.filter(|kids| !kids.is_empty()),
    };

    if had_leaves && count_ids(&pruned) == 0 {
        log::debug!("header group '{}' lost all its columns; removed", node.label);
        return None;
    }
    Some(pruned)
}

fn count_ids(node: &HeaderNode) -> usize {
    node.columns.as_ref().map_or(0, Vec::len)
        + node
            .children
            .as_ref()
            .map_or(0, |kids| kids.iter().map(count_ids).sum())
}

fn collect_ids(node: &HeaderNode, out: &mut HashSet<String>) {
    if let Some(ids) = &node.columns {
        out.extend(ids.iter().cloned());
    }
    if let Some(kids) = &node.children {
        for kid in kids {
            collect_ids(kid, out);
        }
    }
}

fn contains_id(node: &HeaderNode, id: &str) -> bool {
    node.columns.as_ref().map_or(false, |ids| ids.iter().any(|i| i == id))
        || node
            .children
            .as_ref()
            .map_or(false, |kids| kids.iter().any(|k| contains_id(k, id)))
}

fn ordered_ids(node: &HeaderNode, out: &mut Vec<String>) {
    if let Some(ids) = &node.columns {
        out.extend(ids.iter().cloned());
    }
    if let Some(kids) = &node.children {
        for kid in kids {
            ordered_ids(kid, out);
        }
    }
}

fn node_depth(node: &HeaderNode) -> usize {
    1 + node
        .children
        .as_ref()
        .map_or(0, |kids| kids.iter().map(node_depth).max().unwrap_or(0))
}

/// Depth-first, left-to-right.
fn flatten(node: &HeaderNode, depth: usize, depth_count: usize, rows: &mut Vec<Vec<HeaderCell>>) {
    let has_children = node.has_children();
    let mut field_ids = Vec::new();
    ordered_ids(node, &mut field_ids);

    let field_id = if !has_children && field_ids.len() == 1 {
        Some(field_ids[0].clone())
    } else {
        None
    };

    rows[depth].push(HeaderCell {
        label: node.label.clone(),
        depth,
        col_span: field_ids.len().max(1),
        row_span: if has_children { 1 } else { depth_count - depth },
        field_ids,
        field_id,
        has_children,
    });

    if let Some(kids) = &node.children {
        for kid in kids {
            flatten(kid, depth + 1, depth_count, rows);
        }
    }
}
