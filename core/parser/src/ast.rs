//! FILENAME: core/parser/src/ast.rs
//! PURPOSE: Defines the Abstract Syntax Tree (AST) for row expressions.
//! CONTEXT: After the Lexer tokenizes an expression string, the Parser converts
//! those tokens into this tree. The engine's evaluator walks the tree against
//! a single row's field values. Nothing in the tree can reach outside that row.
//!
//! SUPPORTED EXPRESSIONS:
//! - Literals: numbers, strings, booleans, null
//! - Field references: qty, unit_price, status
//! - Binary operations: + - * / % == != < > <= >=
//! - Logical operations: && || (short-circuit)
//! - Unary operations: - + !
//! - Conditional: cond ? a : b
//! - Built-in calls from a closed set: ROUND, ABS, MIN, MAX, IF, LEN, UPPER, LOWER

use std::collections::BTreeSet;

/// Represents a parsed expression.
#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    /// A literal value.
    Literal(Value),

    /// A reference to a field id in the current row.
    FieldRef(String),

    /// A binary operation: left op right.
    BinaryOp {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },

    /// A unary operation: op operand.
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Short-circuit logical operation. Evaluates to one of its operands.
    Logical {
        left: Box<Expression>,
        op: LogicalOperator,
        right: Box<Expression>,
    },

    /// `condition ? then_branch : else_branch`
    Conditional {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },

    /// A call to one of the built-in functions.
    FunctionCall {
        func: BuiltinFunction,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Collects every field id this expression reads, in sorted order.
    pub fn referenced_fields(&self) -> BTreeSet<String> {
        let mut fields = BTreeSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut BTreeSet<String>) {
        match self {
            Expression::Literal(_) => {}
            Expression::FieldRef(name) => {
                out.insert(name.clone());
            }
            Expression::BinaryOp { left, right, .. } | Expression::Logical { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_fields(out),
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_fields(out);
                then_branch.collect_fields(out);
                else_branch.collect_fields(out);
            }
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_fields(out);
                }
            }
        }
    }
}

/// Literal values that can appear in expressions.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
}

/// Binary operators, lowest precedence group first.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinaryOperator {
    // Equality
    Equal,    // == ===
    NotEqual, // != !==

    // Relational
    LessThan,     // <
    GreaterThan,  // >
    LessEqual,    // <=
    GreaterEqual, // >=

    // Additive
    Add,      // + (numeric add or text concatenation)
    Subtract, // -

    // Multiplicative
    Multiply, // *
    Divide,   // /
    Modulo,   // %
}

/// Unary operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum UnaryOperator {
    Negate, // -
    Plus,   // +
    Not,    // !
}

/// Short-circuit operators.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum LogicalOperator {
    And, // &&
    Or,  // ||
}

/// The closed set of callable functions. There is no way to call anything else.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BuiltinFunction {
    Round,
    Abs,
    Min,
    Max,
    If,
    Len,
    Upper,
    Lower,
}

impl BuiltinFunction {
    /// Resolves a function name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ROUND" => Some(BuiltinFunction::Round),
            "ABS" => Some(BuiltinFunction::Abs),
            "MIN" => Some(BuiltinFunction::Min),
            "MAX" => Some(BuiltinFunction::Max),
            "IF" => Some(BuiltinFunction::If),
            "LEN" => Some(BuiltinFunction::Len),
            "UPPER" => Some(BuiltinFunction::Upper),
            "LOWER" => Some(BuiltinFunction::Lower),
            _ => None,
        }
    }

    /// Accepted argument counts (inclusive).
    pub fn arity(&self) -> (usize, usize) {
        match self {
            BuiltinFunction::Round => (1, 2),
            BuiltinFunction::Abs | BuiltinFunction::Len => (1, 1),
            BuiltinFunction::Upper | BuiltinFunction::Lower => (1, 1),
            BuiltinFunction::Min | BuiltinFunction::Max => (1, usize::MAX),
            BuiltinFunction::If => (2, 3),
        }
    }
}

impl std::fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Subtract => write!(f, "-"),
            BinaryOperator::Multiply => write!(f, "*"),
            BinaryOperator::Divide => write!(f, "/"),
            BinaryOperator::Modulo => write!(f, "%"),
            BinaryOperator::Equal => write!(f, "=="),
            BinaryOperator::NotEqual => write!(f, "!="),
            BinaryOperator::LessThan => write!(f, "<"),
            BinaryOperator::GreaterThan => write!(f, ">"),
            BinaryOperator::LessEqual => write!(f, "<="),
            BinaryOperator::GreaterEqual => write!(f, ">="),
        }
    }
}

impl std::fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuiltinFunction::Round => "ROUND",
            BuiltinFunction::Abs => "ABS",
            BuiltinFunction::Min => "MIN",
            BuiltinFunction::Max => "MAX",
            BuiltinFunction::If => "IF",
            BuiltinFunction::Len => "LEN",
            BuiltinFunction::Upper => "UPPER",
            BuiltinFunction::Lower => "LOWER",
        };
        write!(f, "{}", name)
    }
}

impl std::fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOperator::Negate => write!(f, "-"),
            UnaryOperator::Plus => write!(f, "+"),
            UnaryOperator::Not => write!(f, "!"),
        }
    }
}

impl std::fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "&&"),
            LogicalOperator::Or => write!(f, "||"),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}
