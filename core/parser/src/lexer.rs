//! FILENAME: core/parser/src/lexer.rs
//! PURPOSE: Scans a raw expression string and produces a stream of Tokens.
//! CONTEXT: First stage of the parsing pipeline. Handles whitespace skipping,
//! number parsing (with exponents), quoted strings with escapes, field
//! identifiers and the multi-character operators of the grammar.
//!
//! SUPPORTED OPERATORS:
//! - Single char: + - * / % ! < > ? : ( ) ,
//! - Multi char: == === != !== <= >= && ||
//! - A lone `=`, `&` or `|` is illegal (no assignment, no bitwise ops).

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('%') => Token::Percent,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some(',') => Token::Comma,
            Some('?') => Token::Question,
            Some(':') => Token::Colon,

            Some('=') => self.read_equals_operator(),
            Some('!') => self.read_bang_operator(),
            Some('<') => self.read_relational('<', Token::LessThan, Token::LessEqual),
            Some('>') => self.read_relational('>', Token::GreaterThan, Token::GreaterEqual),
            Some('&') => self.read_doubled('&', Token::AndAnd),
            Some('|') => self.read_doubled('|', Token::OrOr),

            Some(quote @ ('"' | '\'')) => self.read_string(quote),

            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),

            Some(ch) if is_identifier_start(ch) => self.read_identifier(ch),

            None => Token::EOF,

            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    fn consume_if(&mut self, expected: char) -> bool {
        if self.input.peek() == Some(&expected) {
            self.input.next();
            true
        } else {
            false
        }
    }

    /// Handles `==` and `===`. A single `=` is an assignment and not allowed.
    fn read_equals_operator(&mut self) -> Token {
        if self.consume_if('=') {
            self.consume_if('=');
            Token::Equal
        } else {
            Token::Illegal('=')
        }
    }

    /// Handles `!`, `!=` and `!==`.
    fn read_bang_operator(&mut self) -> Token {
        if self.consume_if('=') {
            self.consume_if('=');
            Token::NotEqual
        } else {
            Token::Bang
        }
    }

    fn read_relational(&mut self, first: char, plain: Token, with_equal: Token) -> Token {
        if self.consume_if('=') {
            with_equal
        } else if self.input.peek() == Some(&first) {
            // Shift operators are outside the grammar
            Token::Illegal(first)
        } else {
            plain
        }
    }

    fn read_doubled(&mut self, ch: char, token: Token) -> Token {
        if self.consume_if(ch) {
            token
        } else {
            Token::Illegal(ch)
        }
    }

    /// Reads a string delimited by `quote`. Supports backslash escapes.
    /// An unterminated string is reported as an illegal quote character.
    fn read_string(&mut self, quote: char) -> Token {
        let mut result = String::new();
        while let Some(ch) = self.input.next() {
            if ch == quote {
                return Token::String(result);
            }
            if ch == '\\' {
                match self.input.next() {
                    Some('n') => result.push('\n'),
                    Some('t') => result.push('\t'),
                    Some('r') => result.push('\r'),
                    Some(other) => result.push(other),
                    None => break,
                }
            } else {
                result.push(ch);
            }
        }
        Token::Illegal(quote)
    }

    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';
        let mut has_exponent = false;

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else if ch == '.' && !has_dot && !has_exponent {
                has_dot = true;
                number_str.push(ch);
                self.input.next();
            } else if (ch == 'e' || ch == 'E') && !has_exponent {
                has_exponent = true;
                number_str.push(ch);
                self.input.next();
                if let Some(&sign) = self.input.peek() {
                    if sign == '+' || sign == '-' {
                        number_str.push(sign);
                        self.input.next();
                    }
                }
            } else {
                break;
            }
        }

        match number_str.parse::<f64>() {
            Ok(n) => Token::Number(n),
            // e.g. a lone "." or "1e"
            Err(_) => Token::Illegal(first_char),
        }
    }

    fn read_identifier(&mut self, first_char: char) -> Token {
        let mut ident = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if is_identifier_start(ch) || ch.is_ascii_digit() {
                ident.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        // Field ids are case-sensitive, so keywords are too.
        match ident.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" | "undefined" => Token::Null,
            _ => Token::Identifier(ident),
        }
    }
}

/// Returns true if `ch` can start a field identifier.
fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}
