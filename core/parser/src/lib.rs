//! FILENAME: core/parser/src/lib.rs
//! PURPOSE: Library root for the row-expression parser.
//! CONTEXT: Exposes the lexer, parser, and AST components used to turn
//! schema-supplied formula and visibility text into evaluatable trees.
//!
//! PIPELINE: Expression String --> Lexer --> Tokens --> Parser --> AST --> Evaluator
//!
//! SUPPORTED FEATURES:
//! - Arithmetic: +, -, *, /, %
//! - Comparison: ==, !=, <, >, <=, >= (=== and !== are accepted aliases)
//! - Logical: &&, ||, !, and the `? :` conditional
//! - Field references: qty, unit_price
//! - Built-in calls: ROUND, ABS, MIN, MAX, IF, LEN, UPPER, LOWER
//! - Parentheses for grouping

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;


pub use ast::{BinaryOperator, BuiltinFunction, Expression, LogicalOperator, UnaryOperator, Value};
pub use lexer::Lexer;
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use token::Token;
