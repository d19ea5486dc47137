//! FILENAME: core/engine/src/evaluator.rs
//! PURPOSE: Evaluates parsed row expressions against a single row.
//! CONTEXT: Formula columns and visibility conditions are both expressions
//! over one row's field values. This module walks the AST produced by
//! grid-expr and computes a scalar. The only thing an expression can read is
//! the row it is given; there is no other scope.
//!
//! SUPPORTED FEATURES:
//! - Field lookup by id (a key missing from the row is a fault)
//! - Arithmetic: + - * / % (+ concatenates when either side is non-numeric text)
//! - Comparisons: == != < > <= >= (numeric when both sides are numeric)
//! - Short-circuit && and ||, ! and the ? : conditional
//! - Functions: ROUND, ABS, MIN, MAX, IF, LEN, UPPER, LOWER
//!
//! FAULT POLICY:
//! Faults never escape. Formula cells turn a fault into an empty value and
//! visibility conditions turn one into "visible".

use grid_expr::{parse, BinaryOperator, BuiltinFunction, Expression, LogicalOperator, ParseError, UnaryOperator, Value};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::schema::{Column, Row};
use crate::value::{display_text, format_number, number_value, parse_number};

/// Why an evaluation produced no value.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The expression text did not parse.
    Syntax(String),
    /// A referenced field is not present in the row.
    UnknownField(String),
    DivideByZero,
    /// An operand could not be used as a number.
    Type,
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalResult {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// A present-but-empty field, or the null literal.
    Empty,
    Error(EvalError),
}

impl EvalResult {
    fn from_json(value: &JsonValue) -> EvalResult {
        match value {
            JsonValue::Null => EvalResult::Empty,
            JsonValue::Bool(b) => EvalResult::Boolean(*b),
            JsonValue::Number(n) => n.as_f64().map_or(EvalResult::Empty, EvalResult::Number),
            JsonValue::String(s) => EvalResult::Text(s.clone()),
            other => EvalResult::Text(display_text(other)),
        }
    }

    /// Converts the result to a value that can sit in a row.
    /// Faults become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            EvalResult::Number(n) => number_value(*n),
            EvalResult::Text(s) => JsonValue::String(s.clone()),
            EvalResult::Boolean(b) => JsonValue::Bool(*b),
            EvalResult::Empty | EvalResult::Error(_) => JsonValue::Null,
        }
    }

    /// Arithmetic view of the result. Blanks count as zero.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalResult::Number(n) => Some(*n),
            EvalResult::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            EvalResult::Empty => Some(0.0),
            EvalResult::Text(s) if s.trim().is_empty() => Some(0.0),
            EvalResult::Text(s) => parse_number(s),
            EvalResult::Error(_) => None,
        }
    }

    /// Number for comparisons. Unlike `as_number`, blanks are not numbers here.
    fn comparable_number(&self) -> Option<f64> {
        match self {
            EvalResult::Number(n) => Some(*n),
            EvalResult::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            EvalResult::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            EvalResult::Number(n) => *n != 0.0 && !n.is_nan(),
            EvalResult::Text(s) => !s.is_empty(),
            EvalResult::Boolean(b) => *b,
            EvalResult::Empty | EvalResult::Error(_) => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            EvalResult::Number(n) => format_number(*n),
            EvalResult::Text(s) => s.clone(),
            EvalResult::Boolean(b) => b.to_string(),
            EvalResult::Empty | EvalResult::Error(_) => String::new(),
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            EvalResult::Empty => true,
            EvalResult::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvalResult::Error(_))
    }
}

// ============================================================================
// EVALUATOR
// ============================================================================

/// Evaluates expressions against one row.
pub struct Evaluator<'a> {
    row: &'a Row,
}

impl<'a> Evaluator<'a> {
    pub fn new(row: &'a Row) -> Self {
        Evaluator { row }
    }

    pub fn evaluate(&self, expr: &Expression) -> EvalResult {
        match expr {
            Expression::Literal(value) => self.eval_literal(value),
            Expression::FieldRef(name) => self.eval_field_ref(name),
            Expression::BinaryOp { left, op, right } => self.eval_binary_op(left, op, right),
            Expression::UnaryOp { op, operand } => self.eval_unary_op(op, operand),
            Expression::Logical { left, op, right } => self.eval_logical(left, op, right),
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond = self.evaluate(condition);
                if cond.is_error() {
                    return cond;
                }
                if cond.is_truthy() {
                    self.evaluate(then_branch)
                } else {
                    self.evaluate(else_branch)
                }
            }
            Expression::FunctionCall { func, args } => self.eval_function(func, args),
        }
    }

    fn eval_literal(&self, value: &Value) -> EvalResult {
        match value {
            Value::Number(n) => EvalResult::Number(*n),
            Value::String(s) => EvalResult::Text(s.clone()),
            Value::Boolean(b) => EvalResult::Boolean(*b),
            Value::Null => EvalResult::Empty,
        }
    }

    fn eval_field_ref(&self, name: &str) -> EvalResult {
        match self.row.get(name) {
            Some(value) => EvalResult::from_json(value),
            None => EvalResult::Error(EvalError::UnknownField(name.to_string())),
        }
    }

    fn eval_binary_op(&self, left: &Expression, op: &BinaryOperator, right: &Expression) -> EvalResult {
        let left_val = self.evaluate(left);
        let right_val = self.evaluate(right);

        // Propagate errors
        if left_val.is_error() {
            return left_val;
        }
        if right_val.is_error() {
            return right_val;
        }

        match op {
            BinaryOperator::Add => self.eval_add(&left_val, &right_val),
            BinaryOperator::Subtract => arithmetic(&left_val, &right_val, |l, r| Some(l - r)),
            BinaryOperator::Multiply => arithmetic(&left_val, &right_val, |l, r| Some(l * r)),
            BinaryOperator::Divide => arithmetic(&left_val, &right_val, |l, r| (r != 0.0).then(|| l / r)),
            BinaryOperator::Modulo => arithmetic(&left_val, &right_val, |l, r| (r != 0.0).then(|| l % r)),

            BinaryOperator::Equal => EvalResult::Boolean(loosely_equal(&left_val, &right_val)),
            BinaryOperator::NotEqual => EvalResult::Boolean(!loosely_equal(&left_val, &right_val)),
            BinaryOperator::LessThan => compare(&left_val, &right_val, |o| o.is_lt()),
            BinaryOperator::GreaterThan => compare(&left_val, &right_val, |o| o.is_gt()),
            BinaryOperator::LessEqual => compare(&left_val, &right_val, |o| o.is_le()),
            BinaryOperator::GreaterEqual => compare(&left_val, &right_val, |o| o.is_ge()),
        }
    }

    /// Adds numerically, or concatenates when either side is non-numeric text.
    fn eval_add(&self, left: &EvalResult, right: &EvalResult) -> EvalResult {
        match (left.as_number(), right.as_number()) {
            (Some(l), Some(r)) => EvalResult::Number(l + r),
            _ => EvalResult::Text(format!("{}{}", left.as_text(), right.as_text())),
        }
    }

    fn eval_unary_op(&self, op: &UnaryOperator, operand: &Expression) -> EvalResult {
        let val = self.evaluate(operand);
        if val.is_error() {
            return val;
        }

        match op {
            UnaryOperator::Negate => match val.as_number() {
                Some(n) => EvalResult::Number(-n),
                None => EvalResult::Error(EvalError::Type),
            },
            UnaryOperator::Plus => match val.as_number() {
                Some(n) => EvalResult::Number(n),
                None => EvalResult::Error(EvalError::Type),
            },
            UnaryOperator::Not => EvalResult::Boolean(!val.is_truthy()),
        }
    }

    /// `&&` and `||` yield one of their operands, evaluating the right side
    /// only when needed.
    fn eval_logical(&self, left: &Expression, op: &LogicalOperator, right: &Expression) -> EvalResult {
        let left_val = self.evaluate(left);
        if left_val.is_error() {
            return left_val;
        }

        let short_circuit = match op {
            LogicalOperator::And => !left_val.is_truthy(),
            LogicalOperator::Or => left_val.is_truthy(),
        };

        if short_circuit {
            left_val
        } else {
            self.evaluate(right)
        }
    }

    fn eval_function(&self, func: &BuiltinFunction, args: &[Expression]) -> EvalResult {
        // Arity is checked at parse time; guard anyway for hand-built trees.
        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            return EvalResult::Error(EvalError::Type);
        }

        match func {
            BuiltinFunction::If => self.fn_if(args),
            BuiltinFunction::Round => self.fn_round(args),
            BuiltinFunction::Abs => self.unary_number(&args[0], f64::abs),
            BuiltinFunction::Min => self.fold_numbers(args, f64::min),
            BuiltinFunction::Max => self.fold_numbers(args, f64::max),
            BuiltinFunction::Len => self.unary_text(&args[0], |s| EvalResult::Number(s.chars().count() as f64)),
            BuiltinFunction::Upper => self.unary_text(&args[0], |s| EvalResult::Text(s.to_uppercase())),
            BuiltinFunction::Lower => self.unary_text(&args[0], |s| EvalResult::Text(s.to_lowercase())),
        }
    }

    fn fn_if(&self, args: &[Expression]) -> EvalResult {
        let cond = self.evaluate(&args[0]);
        if cond.is_error() {
            return cond;
        }
        if cond.is_truthy() {
            self.evaluate(&args[1])
        } else {
            args.get(2).map_or(EvalResult::Empty, |e| self.evaluate(e))
        }
    }

    fn fn_round(&self, args: &[Expression]) -> EvalResult {
        let num = match self.number_arg(&args[0]) {
            Ok(n) => n,
            Err(e) => return e,
        };
        let digits = match args.get(1) {
            Some(arg) => match self.number_arg(arg) {
                Ok(d) => d as i32,
                Err(e) => return e,
            },
            None => 0,
        };

        let multiplier = 10_f64.powi(digits);
        EvalResult::Number((num * multiplier).round() / multiplier)
    }

    fn number_arg(&self, arg: &Expression) -> Result<f64, EvalResult> {
        let val = self.evaluate(arg);
        if val.is_error() {
            return Err(val);
        }
        val.as_number().ok_or(EvalResult::Error(EvalError::Type))
    }

    fn unary_number(&self, arg: &Expression, f: fn(f64) -> f64) -> EvalResult {
        match self.number_arg(arg) {
            Ok(n) => EvalResult::Number(f(n)),
            Err(e) => e,
        }
    }

    fn unary_text(&self, arg: &Expression, f: impl Fn(&str) -> EvalResult) -> EvalResult {
        let val = self.evaluate(arg);
        if val.is_error() {
            return val;
        }
        f(&val.as_text())
    }

    fn fold_numbers(&self, args: &[Expression], f: fn(f64, f64) -> f64) -> EvalResult {
        let mut acc: Option<f64> = None;
        for arg in args {
            let n = match self.number_arg(arg) {
                Ok(n) => n,
                Err(e) => return e,
            };
            acc = Some(acc.map_or(n, |a| f(a, n)));
        }
        acc.map_or(EvalResult::Empty, EvalResult::Number)
    }
}

fn arithmetic(left: &EvalResult, right: &EvalResult, op: impl Fn(f64, f64) -> Option<f64>) -> EvalResult {
    match (left.as_number(), right.as_number()) {
        (Some(l), Some(r)) => match op(l, r) {
            Some(result) => EvalResult::Number(result),
            None => EvalResult::Error(EvalError::DivideByZero),
        },
        _ => EvalResult::Error(EvalError::Type),
    }
}

fn loosely_equal(left: &EvalResult, right: &EvalResult) -> bool {
    if left.is_blank() || right.is_blank() {
        return left.is_blank() && right.is_blank();
    }
    match (left, right) {
        (EvalResult::Text(l), EvalResult::Text(r)) if l == r => true,
        (EvalResult::Boolean(l), EvalResult::Boolean(r)) => l == r,
        _ => match (left.comparable_number(), right.comparable_number()) {
            (Some(l), Some(r)) => (l - r).abs() < f64::EPSILON,
            _ => left.as_text() == right.as_text(),
        },
    }
}

/// Orders numerically when both sides are numbers, otherwise by text.
fn compare(left: &EvalResult, right: &EvalResult, test: fn(std::cmp::Ordering) -> bool) -> EvalResult {
    let ordering = match (left.comparable_number(), right.comparable_number()) {
        (Some(l), Some(r)) => match l.partial_cmp(&r) {
            Some(o) => o,
            None => return EvalResult::Boolean(false),
        },
        _ => left.as_text().cmp(&right.as_text()),
    };
    EvalResult::Boolean(test(ordering))
}

// ============================================================================
// COMPILED EXPRESSIONS
// ============================================================================

/// Expression text parsed once. A syntax error is kept and reported as a
/// fault on every evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    parsed: Result<Expression, ParseError>,
}

impl CompiledExpression {
    pub fn compile(source: &str) -> Self {
        let parsed = parse(source);
        if let Err(e) = &parsed {
            log::warn!("expression '{}' does not compile: {}", source, e);
        }
        CompiledExpression {
            source: source.to_string(),
            parsed,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    pub fn evaluate(&self, row: &Row) -> EvalResult {
        match &self.parsed {
            Ok(expr) => Evaluator::new(row).evaluate(expr),
            Err(e) => EvalResult::Error(EvalError::Syntax(e.message.clone())),
        }
    }
}

/// Formula use site: any fault yields an empty value.
pub fn evaluate_formula(expr: &CompiledExpression, row: &Row) -> EvalResult {
    match expr.evaluate(row) {
        EvalResult::Error(e) => {
            log::debug!("formula '{}' faulted: {:?}", expr.source(), e);
            EvalResult::Empty
        }
        ok => ok,
    }
}

/// Visibility use site: any fault leaves the cell visible.
pub fn evaluate_visibility(expr: &CompiledExpression, row: &Row) -> bool {
    match expr.evaluate(row) {
        EvalResult::Error(e) => {
            log::debug!("visibility '{}' faulted, showing cell: {:?}", expr.source(), e);
            true
        }
        ok => ok.is_truthy(),
    }
}

/// Compiled formulas and visibility conditions, keyed by expression text so
/// copied columns share one compilation.
#[derive(Debug, Clone, Default)]
pub struct ExpressionCache {
    compiled: HashMap<String, CompiledExpression>,
}

impl ExpressionCache {
    pub fn for_columns(columns: &[Column]) -> Self {
        let mut cache = ExpressionCache::default();
        cache.refresh(columns);
        cache
    }

    /// Compiles any expression text not seen yet and drops text no column
    /// uses anymore.
    pub fn refresh(&mut self, columns: &[Column]) {
        let mut wanted: Vec<&str> = Vec::new();
        for col in columns {
            if let Some(formula) = col.formula.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                wanted.push(formula);
            }
            if let Some(condition) = col.visibility_source() {
                wanted.push(condition);
            }
        }

        self.compiled.retain(|source, _| wanted.contains(&source.as_str()));
        for source in wanted {
            if !self.compiled.contains_key(source) {
                self.compiled
                    .insert(source.to_string(), CompiledExpression::compile(source));
            }
        }
    }

    pub fn get(&self, source: &str) -> Option<&CompiledExpression> {
        self.compiled.get(source.trim())
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Value of a formula column for a row. Missing or blank formulas are empty.
    pub fn formula_value(&self, column: &Column, row: &Row) -> EvalResult {
        let source = match column.formula.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => return EvalResult::Empty,
        };
        match self.get(source) {
            Some(expr) => evaluate_formula(expr, row),
            None => evaluate_formula(&CompiledExpression::compile(source), row),
        }
    }

    /// Whether a column's cell shows for a row. No condition means visible.
    pub fn is_visible(&self, column: &Column, row: &Row) -> bool {
        let source = match column.visibility_source() {
            Some(s) => s,
            None => return true,
        };
        match self.get(source) {
            Some(expr) => evaluate_visibility(expr, row),
            None => evaluate_visibility(&CompiledExpression::compile(source), row),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: JsonValue) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    fn eval(source: &str, r: &Row) -> EvalResult {
        CompiledExpression::compile(source).evaluate(r)
    }

    #[test]
    fn test_addition_of_fields() {
        let r = row(json!({"a": 2, "b": 3}));
        assert_eq!(eval("a + b", &r), EvalResult::Number(5.0));
    }

    #[test]
    fn test_formula_syntax_error_is_empty() {
        let r = row(json!({"a": 2, "b": 3}));
        let expr = CompiledExpression::compile("a +");

        assert!(!expr.is_valid());
        assert_eq!(evaluate_formula(&expr, &r), EvalResult::Empty);
    }

    #[test]
    fn test_visibility_condition() {
        let r = row(json!({"status": "inactive"}));
        let expr = CompiledExpression::compile("status == 'active'");

        assert!(!evaluate_visibility(&expr, &r));
        assert!(evaluate_visibility(&expr, &row(json!({"status": "active"}))));
    }

    #[test]
    fn test_visibility_fault_is_visible() {
        let r = row(json!({}));
        assert!(evaluate_visibility(&CompiledExpression::compile("missing > 3"), &r));
        assert!(evaluate_visibility(&CompiledExpression::compile("((("), &r));
    }

    #[test]
    fn test_missing_field_is_fault() {
        let r = row(json!({"a": 1}));
        assert_eq!(
            eval("a + nope", &r),
            EvalResult::Error(EvalError::UnknownField("nope".to_string()))
        );
    }

    #[test]
    fn test_null_and_blank_fields_count_as_zero() {
        let r = row(json!({"a": null, "b": "", "c": 4}));
        assert_eq!(eval("a + c", &r), EvalResult::Number(4.0));
        assert_eq!(eval("b * c", &r), EvalResult::Number(0.0));
    }

    #[test]
    fn test_numeric_strings_add() {
        let r = row(json!({"qty": "3", "price": "2.5"}));
        assert_eq!(eval("qty * price", &r), EvalResult::Number(7.5));
        assert_eq!(eval("qty + price", &r), EvalResult::Number(5.5));
    }

    #[test]
    fn test_text_concatenation() {
        let r = row(json!({"first": "Ada", "last": "Lovelace", "n": 2}));
        assert_eq!(eval("first + ' ' + last", &r), EvalResult::Text("Ada Lovelace".to_string()));
        assert_eq!(eval("'Lot-' + n", &r), EvalResult::Text("Lot-2".to_string()));
    }

    #[test]
    fn test_non_numeric_arithmetic_is_fault() {
        let r = row(json!({"s": "abc"}));
        assert_eq!(eval("s * 2", &r), EvalResult::Error(EvalError::Type));
        assert_eq!(eval("-s", &r), EvalResult::Error(EvalError::Type));
    }

    #[test]
    fn test_division_by_zero() {
        let r = row(json!({"a": 1, "z": 0}));
        assert_eq!(eval("a / z", &r), EvalResult::Error(EvalError::DivideByZero));
        assert_eq!(eval("a % z", &r), EvalResult::Error(EvalError::DivideByZero));
        assert_eq!(eval("7 % 4", &r), EvalResult::Number(3.0));
    }

    #[test]
    fn test_equality_rules() {
        let r = row(json!({"n": 10, "s": "10", "t": "ten", "flag": true, "blank": ""}));
        assert_eq!(eval("n == s", &r), EvalResult::Boolean(true));
        assert_eq!(eval("n === 10", &r), EvalResult::Boolean(true));
        assert_eq!(eval("t == 'ten'", &r), EvalResult::Boolean(true));
        assert_eq!(eval("t != 'TEN'", &r), EvalResult::Boolean(true));
        assert_eq!(eval("flag == true", &r), EvalResult::Boolean(true));
        assert_eq!(eval("blank == null", &r), EvalResult::Boolean(true));
        assert_eq!(eval("n == null", &r), EvalResult::Boolean(false));
    }

    #[test]
    fn test_relational_falls_back_to_text() {
        let r = row(json!({"a": "apple", "b": "banana", "n": "9"}));
        assert_eq!(eval("a < b", &r), EvalResult::Boolean(true));
        // Numeric strings compare as numbers
        assert_eq!(eval("n < 10", &r), EvalResult::Boolean(true));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let r = row(json!({"a": "", "b": "fallback", "c": 0}));
        assert_eq!(eval("a || b", &r), EvalResult::Text("fallback".to_string()));
        assert_eq!(eval("c && missing", &r), EvalResult::Number(0.0));
        assert_eq!(eval("!c", &r), EvalResult::Boolean(true));
    }

    #[test]
    fn test_conditional() {
        let r = row(json!({"qty": 12}));
        assert_eq!(eval("qty > 10 ? 'bulk' : 'single'", &r), EvalResult::Text("bulk".to_string()));
    }

    #[test]
    fn test_builtin_functions() {
        let r = row(json!({"x": -2.456, "name": "Widget"}));
        assert_eq!(eval("ROUND(x, 2)", &r), EvalResult::Number(-2.46));
        assert_eq!(eval("ABS(x)", &r), EvalResult::Number(2.456));
        assert_eq!(eval("MIN(3, 1, 2)", &r), EvalResult::Number(1.0));
        assert_eq!(eval("MAX(3, 1, 2)", &r), EvalResult::Number(3.0));
        assert_eq!(eval("LEN(name)", &r), EvalResult::Number(6.0));
        assert_eq!(eval("UPPER(name)", &r), EvalResult::Text("WIDGET".to_string()));
        assert_eq!(eval("lower(name)", &r), EvalResult::Text("widget".to_string()));
        assert_eq!(eval("IF(x < 0, 'neg')", &r), EvalResult::Text("neg".to_string()));
        assert_eq!(eval("IF(x > 0, 'pos')", &r), EvalResult::Empty);
    }

    #[test]
    fn test_unknown_function_is_fault() {
        let r = row(json!({}));
        assert!(eval("alert(1)", &r).is_error());
    }

    #[test]
    fn test_cache_shares_and_prunes() {
        let mut formula = Column::new("total", "Total", "formula");
        formula.formula = Some("a + b".to_string());
        let mut copy = formula.clone();
        copy.field_id = "total_copy".to_string();
        let mut gated = Column::new("note", "Note", "text");
        gated.visibility_condition = Some("a > 1".to_string());

        let mut cache = ExpressionCache::for_columns(&[formula.clone(), copy, gated.clone()]);
        assert_eq!(cache.len(), 2);

        let r = row(json!({"a": 2, "b": 3}));
        assert_eq!(cache.formula_value(&formula, &r), EvalResult::Number(5.0));
        assert!(cache.is_visible(&gated, &r));

        cache.refresh(&[gated]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a + b").is_none());
    }

    #[test]
    fn test_missing_condition_is_visible() {
        let cache = ExpressionCache::default();
        let mut col = Column::new("x", "X", "text");
        assert!(cache.is_visible(&col, &row(json!({}))));

        col.visibility_condition = Some("   ".to_string());
        assert!(cache.is_visible(&col, &row(json!({}))));
    }

    #[test]
    fn test_to_json() {
        assert_eq!(EvalResult::Number(5.0).to_json(), json!(5));
        assert_eq!(EvalResult::Error(EvalError::Type).to_json(), JsonValue::Null);
    }
}
