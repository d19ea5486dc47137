//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: Second stage of the parsing pipeline. Takes tokens from the Lexer
//! and builds an Expression tree the engine can evaluate against a row.
//!
//! GRAMMAR:
//!   expression     --> conditional
//!   conditional    --> logical_or ( "?" expression ":" expression )?
//!   logical_or     --> logical_and ( "||" logical_and )*
//!   logical_and    --> equality ( "&&" equality )*
//!   equality       --> relational ( ("==" | "!=") relational )*
//!   relational     --> additive ( ("<" | ">" | "<=" | ">=") additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//!   unary          --> ("-" | "+" | "!") unary | primary
//!   primary        --> NUMBER | STRING | BOOLEAN | NULL | IDENTIFIER
//!                    | function_call | "(" expression ")"
//!   function_call  --> IDENTIFIER "(" arguments? ")"
//!   arguments      --> expression ("," expression)*

use crate::ast::{BinaryOperator, BuiltinFunction, Expression, LogicalOperator, UnaryOperator, Value};
use crate::lexer::Lexer;
use crate::token::Token;

/// Nesting limit for parenthesised/unary/conditional recursion.
const MAX_DEPTH: usize = 64;

/// Operand limit. Operator chains nest left, so this bounds tree height.
const MAX_OPERANDS: usize = 256;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
    depth: usize,
    operands: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
            depth: 0,
            operands: 0,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    /// Checks if the current token matches the expected token.
    /// If it matches, advances and returns Ok. Otherwise returns an error.
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {}, found {}",
                expected, self.current_token
            )))
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("Expression nested too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Entry point for expression parsing.
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.enter()?;
        let result = self.parse_conditional();
        self.leave();
        result
    }

    /// Parses `cond ? a : b` (right-associative through parse_expression).
    fn parse_conditional(&mut self) -> ParseResult<Expression> {
        let condition = self.parse_logical_or()?;

        if self.current_token != Token::Question {
            return Ok(condition);
        }

        self.advance();
        let then_branch = self.parse_expression()?;
        self.expect(Token::Colon)?;
        let else_branch = self.parse_expression()?;

        Ok(Expression::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        })
    }

    fn parse_logical_or(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.current_token == Token::OrOr {
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                left: Box::new(left),
                op: LogicalOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_equality()?;

        while self.current_token == Token::AndAnd {
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Logical {
                left: Box::new(left),
                op: LogicalOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses equality expressions (==, !=).
    fn parse_equality(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match &self.current_token {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_relational()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses relational expressions (<, >, <=, >=).
    fn parse_relational(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (*, / and %).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                Token::Percent => BinaryOperator::Modulo,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses prefix operators (-, +, !).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        let op = match &self.current_token {
            Token::Minus => UnaryOperator::Negate,
            Token::Plus => UnaryOperator::Plus,
            Token::Bang => UnaryOperator::Not,
            _ => return self.parse_primary(),
        };

        self.advance();
        self.enter()?;
        let operand = self.parse_unary();
        self.leave();

        Ok(Expression::UnaryOp {
            op,
            operand: Box::new(operand?),
        })
    }

    /// Parses primary expressions (literals, field refs, calls, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        self.operands += 1;
        if self.operands > MAX_OPERANDS {
            return Err(ParseError::new("Expression has too many operands"));
        }

        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(Value::Number(n)))
            }

            Token::String(s) => {
                self.advance();
                Ok(Expression::Literal(Value::String(s)))
            }

            Token::Boolean(b) => {
                self.advance();
                Ok(Expression::Literal(Value::Boolean(b)))
            }

            Token::Null => {
                self.advance();
                Ok(Expression::Literal(Value::Null))
            }

            // Identifier: a field reference, or a call when followed by '('
            Token::Identifier(name) => {
                self.advance();

                if self.current_token == Token::LParen {
                    return self.parse_function_call(&name);
                }

                Ok(Expression::FieldRef(name))
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression")),

            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),

            token => Err(ParseError::new(format!("Unexpected token: {}", token))),
        }
    }

    /// Parses a call like ROUND(total, 2). Only built-in names are accepted.
    fn parse_function_call(&mut self, name: &str) -> ParseResult<Expression> {
        let func = BuiltinFunction::from_name(name)
            .ok_or_else(|| ParseError::new(format!("Unknown function: {}", name)))?;

        // Consume the '('
        self.advance();

        let mut args = Vec::new();

        if self.current_token == Token::RParen {
            self.advance();
        } else {
            args.push(self.parse_expression()?);

            while self.current_token == Token::Comma {
                self.advance();
                args.push(self.parse_expression()?);
            }

            self.expect(Token::RParen)?;
        }

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            let expected = if max == usize::MAX {
                format!("at least {}", min)
            } else if min == max {
                min.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(ParseError::new(format!(
                "{} expects {} arguments, got {}",
                func,
                expected,
                args.len()
            )));
        }

        Ok(Expression::FunctionCall { func, args })
    }
}

/// Convenience function to parse an expression string directly.
pub fn parse(input: &str) -> ParseResult<Expression> {
    let mut parser = Parser::new(input);
    parser.parse()
}
