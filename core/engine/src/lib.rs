//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the grid engine.
//! CONTEXT: Re-exports public types and modules for use by other crates.
//! A host loads a Schema into a GridStore and drives everything through it.

pub mod enrichment;
pub mod error;
pub mod evaluator;
pub mod field_types;
pub mod header;
pub mod history;
pub mod pagination;
pub mod schema;
pub mod state;
pub mod store;
pub mod structure;
pub mod value;
pub mod view;

// Re-export commonly used types at the crate root
pub use enrichment::{parse_lookup_response, EnrichmentRequest, EnrichmentSequencer, EnrichmentTicket};
pub use error::{EditError, SchemaError};
pub use evaluator::{CompiledExpression, EvalError, EvalResult, Evaluator, ExpressionCache};
pub use field_types::{AssetRef, EditContext, FieldBehavior, FieldKind, FieldTypeRegistry};
pub use header::{build_header_layout, HeaderCell, HeaderLayout};
pub use history::History;
pub use pagination::PageInfo;
pub use schema::{
    Column, ControlSide, HeaderNode, LookupOption, PaginationConfig, Row, RowControls, RowMode,
    Schema, ValidationRule, DEFAULT_ROWS_PER_PAGE,
};
pub use state::GridState;
pub use store::{ChangeListener, GridStore};
pub use structure::{Change, StructurePolicy, Transition};
pub use view::{CellView, PageView, RowView};
