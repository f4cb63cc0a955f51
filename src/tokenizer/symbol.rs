//! # Symbol Token Handling
//!
//! Operators and delimiters recognized by HiveLang. Multi-character operators
//! are matched before single-character ones so `==` is never read as two `=`.

use core::fmt;

use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

/// Operators in HiveLang guard expressions and property access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Equality comparison (`==`)
    EqualEqual,
    /// Member access (`.`)
    Dot,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::EqualEqual => write!(f, "=="),
            Operator::Dot => write!(f, "."),
        }
    }
}

/// Structural delimiters: call-argument braces, list brackets, grouping
/// parentheses, separators, and the `set` assignment sugar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    OpenBrace,
    CloseBrace,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Comma,
    Colon,
    Equal,
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Delimiter::OpenBrace => "{",
            Delimiter::CloseBrace => "}",
            Delimiter::OpenParen => "(",
            Delimiter::CloseParen => ")",
            Delimiter::OpenBracket => "[",
            Delimiter::CloseBracket => "]",
            Delimiter::Comma => ",",
            Delimiter::Colon => ":",
            Delimiter::Equal => "=",
        };
        write!(f, "{}", symbol)
    }
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_operator(input: &str) -> ParserResult<Token> {
    context(
        "operator",
        map(
            alt((
                // Multi-character operators first (longest match)
                value(Operator::EqualEqual, tag("==")),
                value(Operator::Dot, tag(".")),
            )),
            Token::Operator,
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_delimiter(input: &str) -> ParserResult<Token> {
    context(
        "delimiter",
        map(
            alt((
                value(Delimiter::OpenBrace, tag("{")),
                value(Delimiter::CloseBrace, tag("}")),
                value(Delimiter::OpenParen, tag("(")),
                value(Delimiter::CloseParen, tag(")")),
                value(Delimiter::OpenBracket, tag("[")),
                value(Delimiter::CloseBracket, tag("]")),
                value(Delimiter::Comma, tag(",")),
                value(Delimiter::Colon, tag(":")),
                value(Delimiter::Equal, tag("=")),
            )),
            Token::Delimiter,
        ),
    )(input)
}
