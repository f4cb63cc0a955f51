//! # Expression Parsing
//!
//! Guard expressions parse with precedence `not` > `and` > `or`; `contains`
//! and `==` are leaf comparisons between primaries. String literals become
//! templates here: the raw content is segmented into literal text and
//! `{expr}` holes once, at parse time, so evaluation is a simple fold.

use super::core::{ParseError, ParseResult, Parser};
use crate::ast::{Expr, Literal, TemplateSegment};
use crate::tokenizer::keyword::Keyword;
use crate::tokenizer::literal::Literal as TokenLiteral;
use crate::tokenizer::symbol::{Delimiter, Operator};
use crate::tokenizer::token::Token;

impl Parser<'_> {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.eat_keyword(Keyword::Not) {
            Ok(Expr::Not(Box::new(self.parse_not()?)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let left = self.parse_primary()?;
        if self.eat_keyword(Keyword::Contains) {
            let right = self.parse_primary()?;
            Ok(Expr::Contains(Box::new(left), Box::new(right)))
        } else if self.eat_operator(Operator::EqualEqual) {
            let right = self.parse_primary()?;
            Ok(Expr::Equals(Box::new(left), Box::new(right)))
        } else {
            Ok(left)
        }
    }

    pub(crate) fn parse_primary(&mut self) -> ParseResult<Expr> {
        let Some(span) = self.peek() else {
            return Err(self.unexpected("an expression"));
        };
        let (line, column) = (span.line, span.column);
        let token = span.token.clone();

        match token {
            Token::Literal(TokenLiteral::Str { content, .. }) => {
                self.bump();
                self.template_or_literal(&content, line, column)
            }
            Token::Literal(TokenLiteral::Number(n)) => {
                self.bump();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            Token::Keyword(Keyword::True) => {
                self.bump();
                Ok(Expr::Literal(Literal::Bool(true)))
            }
            Token::Keyword(Keyword::False) => {
                self.bump();
                Ok(Expr::Literal(Literal::Bool(false)))
            }
            Token::Keyword(Keyword::Input) => {
                self.bump();
                self.prop_path(Expr::Variable("input".to_string()), Vec::new())
            }
            Token::Variable(name) => {
                self.bump();
                self.prop_path(Expr::Variable(name), Vec::new())
            }
            Token::Identifier(name) => {
                self.bump();
                // The tokenizer merges dotted names into one identifier;
                // the first segment is the variable, the rest a field path.
                let mut segments = name.split('.');
                let base = Expr::Variable(segments.next().unwrap_or_default().to_string());
                let path: Vec<String> = segments.map(String::from).collect();
                self.prop_path(base, path)
            }
            Token::Delimiter(Delimiter::OpenBracket) => {
                self.bump();
                self.parse_list(line, column)
            }
            Token::Delimiter(Delimiter::OpenParen) => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect_delimiter(Delimiter::CloseParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    /// Absorbs a `.name` chain behind a base expression.
    fn prop_path(&mut self, base: Expr, mut path: Vec<String>) -> ParseResult<Expr> {
        while self.eat_operator(Operator::Dot) {
            path.push(self.expect_name("a property name")?);
        }
        if path.is_empty() {
            Ok(base)
        } else {
            Ok(Expr::PropAccess {
                base: Box::new(base),
                path,
            })
        }
    }

    /// `[lit, lit, …]` — list elements are restricted to literals.
    fn parse_list(&mut self, line: usize, column: usize) -> ParseResult<Expr> {
        let mut items = Vec::new();
        if !self.check_delimiter(Delimiter::CloseBracket) {
            loop {
                let (item_line, item_column) = self.current_location();
                match self.parse_expression()? {
                    Expr::Literal(literal) => items.push(literal),
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "a literal list element".to_string(),
                            found: "an expression".to_string(),
                            line: if item_line == 0 { line } else { item_line },
                            column: if item_line == 0 { column } else { item_column },
                        })
                    }
                }
                if !self.eat_delimiter(Delimiter::Comma) {
                    break;
                }
                if self.check_delimiter(Delimiter::CloseBracket) {
                    break;
                }
            }
        }
        self.expect_delimiter(Delimiter::CloseBracket)?;
        Ok(Expr::Literal(Literal::List(items)))
    }

    /// Splits raw string content into template segments. Content without a
    /// `{` stays a plain string literal.
    pub(crate) fn template_or_literal(
        &self,
        content: &str,
        line: usize,
        column: usize,
    ) -> ParseResult<Expr> {
        if !content.contains('{') {
            return Ok(Expr::Literal(Literal::String(content.to_string())));
        }

        let mut segments = Vec::new();
        let mut buffer = String::new();
        let mut chars = content.chars();
        while let Some(c) = chars.next() {
            if c != '{' {
                buffer.push(c);
                continue;
            }
            if !buffer.is_empty() {
                segments.push(TemplateSegment::Literal(std::mem::take(&mut buffer)));
            }
            let mut hole = String::new();
            let mut closed = false;
            for inner in chars.by_ref() {
                if inner == '}' {
                    closed = true;
                    break;
                }
                hole.push(inner);
            }
            if !closed {
                return Err(ParseError::Template {
                    message: "unclosed '{' in string template".to_string(),
                    line,
                    column,
                });
            }
            segments.push(TemplateSegment::Hole(parse_hole(
                hole.trim(),
                line,
                column,
            )?));
        }
        if !buffer.is_empty() {
            segments.push(TemplateSegment::Literal(buffer));
        }
        Ok(Expr::Template(segments))
    }
}

/// Parses a template hole: `name(.path)*`, with an optional leading `$`.
fn parse_hole(text: &str, line: usize, column: usize) -> ParseResult<Expr> {
    let text = text.strip_prefix('$').unwrap_or(text);
    let mut segments = text.split('.');
    let base = segments.next().unwrap_or_default();
    if !is_identifier(base) {
        return Err(ParseError::Template {
            message: format!("invalid expression {:?} in template hole", text),
            line,
            column,
        });
    }
    let mut path = Vec::new();
    for segment in segments {
        if !is_identifier(segment) {
            return Err(ParseError::Template {
                message: format!("invalid expression {:?} in template hole", text),
                line,
                column,
            });
        }
        path.push(segment.to_string());
    }
    let base = Expr::Variable(base.to_string());
    if path.is_empty() {
        Ok(base)
    } else {
        Ok(Expr::PropAccess {
            base: Box::new(base),
            path,
        })
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
