use core::fmt;

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::recognize,
    error::{context, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::{pair, preceded},
    IResult,
};
use thiserror::Error;

use super::{
    comment::parse_comment,
    keyword::{parse_keyword, Keyword},
    literal::{parse_literal, Literal},
    symbol::{parse_delimiter, parse_operator, Delimiter, Operator},
    whitespace::{parse_newline, parse_whitespace},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Keyword(Keyword),
    // Identifiers, including dotted tool names (`email.send`)
    Identifier(String),
    // `$name` variables
    Variable(String),
    // Symbols
    Operator(Operator),
    Delimiter(Delimiter),
    // Literals
    Literal(Literal),
    // Formatting
    Whitespace(String),
    Newline,
    Comment {
        content: String,
        comment_type: CommentType,
    },
}

impl Token {
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::Comment { .. })
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Token::Whitespace(_))
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, Token::Newline)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(keyword) => write!(f, "keyword '{}'", keyword),
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::Variable(name) => write!(f, "variable '${}'", name),
            Token::Operator(op) => write!(f, "'{}'", op),
            Token::Delimiter(delimiter) => write!(f, "'{}'", delimiter),
            Token::Literal(literal) => write!(f, "{}", literal),
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::Newline => write!(f, "newline"),
            Token::Comment { .. } => write!(f, "comment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentType {
    Line,  // #
    Block, // /* */
}

/// Tokenizer for HiveLang source code.
///
/// Tracks byte offset, line, and column while consuming the input so every
/// produced [`TokenSpan`] and every error carries an exact source position.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    current_position: usize,
    current_line: usize,
    current_column: usize,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            current_position: 0,
            current_line: 1,   // 1-based
            current_column: 1, // 1-based
        }
    }

    #[tracing::instrument(level = "debug", skip(self, input))]
    pub fn tokenize(&mut self, input: &str) -> Result<Vec<TokenSpan>, TokenizerError> {
        let mut tokens = Vec::new();
        let mut remaining = input;

        while !remaining.is_empty() {
            let start_position = self.current_position;
            let start_line = self.current_line;
            let start_column = self.current_column;

            let result = alt((
                // Formatting
                parse_whitespace,
                parse_newline,
                // Literals before symbols so `1.5` is not split at the dot
                parse_literal,
                // Comments
                parse_comment,
                // Code elements
                parse_keyword,
                parse_variable,
                parse_operator,
                parse_delimiter,
                parse_identifier,
            ))(remaining);

            match result {
                Ok((new_remaining, token)) => {
                    let consumed = &remaining[..(remaining.len() - new_remaining.len())];
                    self.update_position(consumed);

                    tokens.push(TokenSpan {
                        token,
                        start: start_position,
                        end: self.current_position,
                        line: start_line,
                        column: start_column,
                    });

                    remaining = new_remaining;
                }
                Err(error) => {
                    let error = self.classify_error(remaining, error);
                    tracing::error!("{}", error);
                    return Err(error);
                }
            }
        }

        Ok(tokens)
    }

    fn update_position(&mut self, text: &str) {
        for c in text.chars() {
            self.current_position += c.len_utf8();
            if c == '\n' {
                self.current_line += 1;
                self.current_column = 1;
            } else {
                self.current_column += 1;
            }
        }
    }

    fn classify_error(
        &self,
        remaining: &str,
        error: nom::Err<VerboseError<&str>>,
    ) -> TokenizerError {
        let span = Span {
            start: self.current_position,
            end: self.current_position + 1,
            line: self.current_line,
            column: self.current_column,
        };
        if let nom::Err::Failure(inner) | nom::Err::Error(inner) = &error {
            for (_, kind) in &inner.errors {
                if let VerboseErrorKind::Context(ctx) = kind {
                    if ctx.contains("string") {
                        return TokenizerError::UnterminatedString { span };
                    }
                    if ctx.contains("block comment") {
                        return TokenizerError::UnterminatedComment { span };
                    }
                }
            }
        }
        TokenizerError::UnexpectedChar {
            found: remaining.chars().next().unwrap_or('\0'),
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSpan {
    pub token: Token,
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line: {}, column: {}, start: {}, end: {}",
            self.line, self.column, self.start, self.end
        )
    }
}

fn base_identifier(input: &str) -> IResult<&str, &str, VerboseError<&str>> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Parses a `$name` variable reference.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_variable(input: &str) -> ParserResult<Token> {
    context(
        "variable",
        nom::combinator::map(preceded(char('$'), base_identifier), |name: &str| {
            Token::Variable(name.to_string())
        }),
    )(input)
}

/// Parses an identifier, including dotted tool names such as `email.send`.
///
/// Keywords are tried before identifiers in the tokenizer loop, so a dotted
/// name whose first segment is a keyword (`input.task`) tokenizes as the
/// keyword followed by a dot; the parser reassembles both shapes.
#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_identifier(input: &str) -> ParserResult<Token> {
    let (input, id) = context(
        "identifier",
        recognize(pair(
            base_identifier,
            many0(preceded(char('.'), base_identifier)),
        )),
    )(input)?;

    Ok((input, Token::Identifier(id.to_string())))
}

pub type ParserResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenizerError {
    #[error("unterminated string literal at {span}")]
    UnterminatedString { span: Span },
    #[error("unterminated block comment at {span}")]
    UnterminatedComment { span: Span },
    #[error("unexpected character {found:?} at {span}")]
    UnexpectedChar { found: char, span: Span },
}
