//! # Core Parser Definitions
//!
//! The token cursor and error types underpinning the recursive-descent
//! parser. Grammar productions live in the sibling modules and only touch
//! the primitives defined here.

use thiserror::Error;

use crate::tokenizer::keyword::Keyword;
use crate::tokenizer::literal::Literal as TokenLiteral;
use crate::tokenizer::symbol::{Delimiter, Operator};
use crate::tokenizer::token::{Token, TokenSpan};

/// Error type for parsing operations.
///
/// Every variant carries enough position information to point at the
/// offending token; a parse error always rejects the whole program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected {expected}, found {found} at line {line}, column {column}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },
    #[error("unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("duplicate bot name {name:?}")]
    DuplicateBot { name: String },
    #[error("invalid template: {message} at line {line}, column {column}")]
    Template {
        message: String,
        line: usize,
        column: usize,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a preprocessed token-span slice.
///
/// One token of lookahead: productions inspect [`Parser::peek_token`] and
/// commit via `bump`/`eat_*`.
pub struct Parser<'a> {
    tokens: &'a [TokenSpan],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [TokenSpan]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> Option<&'a TokenSpan> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn peek_token(&self) -> Option<&'a Token> {
        self.peek().map(|span| &span.token)
    }

    pub(crate) fn bump(&mut self) {
        self.pos += 1;
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line and column of the current token, for error anchoring.
    pub(crate) fn current_location(&self) -> (usize, usize) {
        self.peek().map(|span| (span.line, span.column)).unwrap_or((0, 0))
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(span) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: span.token.to_string(),
                line: span.line,
                column: span.column,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    pub(crate) fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.peek_token(), Some(Token::Keyword(k)) if *k == keyword)
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, keyword: Keyword) -> ParseResult<()> {
        if self.eat_keyword(keyword.clone()) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    pub(crate) fn check_delimiter(&self, delimiter: Delimiter) -> bool {
        matches!(self.peek_token(), Some(Token::Delimiter(d)) if *d == delimiter)
    }

    pub(crate) fn eat_delimiter(&mut self, delimiter: Delimiter) -> bool {
        if self.check_delimiter(delimiter) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_delimiter(&mut self, delimiter: Delimiter) -> ParseResult<()> {
        if self.eat_delimiter(delimiter) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", delimiter)))
        }
    }

    pub(crate) fn eat_operator(&mut self, operator: Operator) -> bool {
        if matches!(self.peek_token(), Some(Token::Operator(op)) if *op == operator) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_identifier(&mut self, expected: &str) -> ParseResult<String> {
        match self.peek_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Consumes an identifier with the exact given text, e.g. the `ai` in
    /// `ask ai` or the `model` option name.
    pub(crate) fn eat_identifier(&mut self, text: &str) -> bool {
        if matches!(self.peek_token(), Some(Token::Identifier(name)) if name == text) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_variable(&mut self) -> ParseResult<String> {
        match self.peek_token() {
            Some(Token::Variable(name)) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("a '$' variable")),
        }
    }

    pub(crate) fn expect_string(&mut self, expected: &str) -> ParseResult<String> {
        match self.peek_token() {
            Some(Token::Literal(TokenLiteral::Str { content, .. })) => {
                let content = content.clone();
                self.bump();
                Ok(content)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// A name position accepts identifiers and keywords alike: argument keys
    /// and property names such as `to`, `type`, or `output` collide with the
    /// reserved word list but are plain names here.
    pub(crate) fn expect_name(&mut self, expected: &str) -> ParseResult<String> {
        match self.peek_token() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.bump();
                Ok(name)
            }
            Some(Token::Keyword(keyword)) => {
                let name = keyword.to_string();
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Parses a dotted tool name (`namespace.verb`).
    ///
    /// The tokenizer merges `email.send` into one identifier but splits
    /// keyword-led names (`user.create`); both shapes are reassembled here.
    pub(crate) fn dotted_name(&mut self) -> ParseResult<String> {
        let mut name = self.expect_name("a tool name")?;
        while self.eat_operator(Operator::Dot) {
            name.push('.');
            name.push_str(&self.expect_name("a tool name segment")?);
        }
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessor::{Preprocessor, TokenPreprocessor};
    use crate::tokenizer::token::Tokenizer;

    fn spans(source: &str) -> Vec<TokenSpan> {
        let mut tokenizer = Tokenizer::new();
        TokenPreprocessor::default().process(tokenizer.tokenize(source).unwrap())
    }

    #[test]
    fn test_expect_keyword() {
        let tokens = spans("bot Test");
        let mut parser = Parser::new(&tokens);
        assert!(parser.expect_keyword(Keyword::Bot).is_ok());
        assert_eq!(parser.expect_identifier("bot name").unwrap(), "Test");
        assert!(parser.at_end());
    }

    #[test]
    fn test_unexpected_has_position() {
        let tokens = spans("bot\nend");
        let mut parser = Parser::new(&tokens);
        parser.bump();
        let error = parser.unexpected("bot name");
        assert_eq!(
            error,
            ParseError::UnexpectedToken {
                expected: "bot name".to_string(),
                found: "keyword 'end'".to_string(),
                line: 2,
                column: 1,
            }
        );
    }

    #[test]
    fn test_dotted_name_merged_token() {
        let tokens = spans("email.send");
        let mut parser = Parser::new(&tokens);
        assert_eq!(parser.dotted_name().unwrap(), "email.send");
    }

    #[test]
    fn test_dotted_name_keyword_led() {
        // `user` is a keyword, so the tokenizer splits the name at the dot.
        let tokens = spans("user.create");
        let mut parser = Parser::new(&tokens);
        assert_eq!(parser.dotted_name().unwrap(), "user.create");
    }

    #[test]
    fn test_eof_error() {
        let tokens = spans("");
        let mut parser = Parser::new(&tokens);
        assert_eq!(
            parser.expect_keyword(Keyword::Bot),
            Err(ParseError::UnexpectedEof {
                expected: "'bot'".to_string()
            })
        );
    }
}
