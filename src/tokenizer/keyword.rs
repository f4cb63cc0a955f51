//! # Keyword Token Handling
//!
//! Defines the keywords recognized by HiveLang and the keyword token parser.
//!
//! ## Parsing Strategy
//!
//! Keywords are parsed using a boundary-aware approach so identifiers that
//! merely start with a keyword are not misread: `inputs` is an identifier,
//! not the keyword `input` followed by `s`.

use nom::{
    bytes::complete::{tag, take_while1},
    combinator::{not, peek},
    error::{context, VerboseError, VerboseErrorKind},
    sequence::terminated,
    IResult,
};
use strum::IntoEnumIterator;

use super::token::{ParserResult, Token};

/// Keywords reserved by the HiveLang grammar.
#[derive(
    Debug, Clone, PartialEq, Eq, strum::EnumString, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Keyword {
    /// Opens a bot declaration.
    Bot,
    /// Opens an agent declaration (same structure as `bot`).
    Agent,
    /// Closes any block.
    End,
    /// Starts a handler (`on input`).
    On,
    /// Introduces a handler guard.
    When,
    /// Invokes a named tool.
    Call,
    /// Introduces call arguments or `ask ai` options.
    With,
    /// Binds a call result or a remembered value.
    As,
    /// Appends text to the reply.
    Say,
    /// Requests an AI completion (`ask ai`).
    Ask,
    /// Rebinds a variable.
    Set,
    If,
    Else,
    Loop,
    In,
    /// Opens a memory declaration block.
    Memory,
    Session,
    User,
    /// Declares a memory variable.
    Var,
    /// Declares the tools a bot intends to call.
    Tools,
    Description,
    Type,
    Scope,
    Persist,
    /// Writes a value to shared memory.
    Remember,
    /// Reads a value from shared memory into `result`.
    Recall,
    Contains,
    And,
    Or,
    Not,
    True,
    False,
    /// The runtime input object.
    Input,
    Output,
}

/// Parses a keyword token from the input string.
///
/// Tries every keyword with a boundary check so a keyword only matches when
/// followed by a non-identifier character; ordering of the keyword set is
/// therefore irrelevant (`in` never shadows `input`).
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_keyword(input: &str) -> ParserResult<Token> {
    fn inner(input: &str) -> ParserResult<Token> {
        for keyword in Keyword::iter() {
            let attempt: IResult<&str, &str, VerboseError<&str>> = terminated(
                tag(keyword.as_ref()),
                not(peek(take_while1(|c: char| c.is_alphanumeric() || c == '_'))),
            )(input);
            if let Ok((rest, _)) = attempt {
                return Ok((rest, Token::Keyword(keyword)));
            }
        }
        Err(nom::Err::Error(VerboseError {
            errors: vec![(input, VerboseErrorKind::Context("keyword"))],
        }))
    }
    context("keyword", inner)(input)
}
