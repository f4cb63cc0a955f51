//! # Whitespace Token Handling
//!
//! Whitespace and newlines are preserved as tokens so spans stay exact; the
//! preprocessor removes them before parsing.

use nom::{
    bytes::complete::take_while1,
    character::complete::char,
    combinator::{map, value},
    error::context,
};

use super::token::{ParserResult, Token};

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<Token> {
    context(
        "whitespace",
        map(
            take_while1(|c: char| c == ' ' || c == '\t' || c == '\r'),
            |s: &str| Token::Whitespace(s.to_string()),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<Token> {
    context("newline", value(Token::Newline, char('\n')))(input)
}
