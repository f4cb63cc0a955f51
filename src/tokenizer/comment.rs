//! # Comment Token Handling
//!
//! HiveLang supports `#` line comments and `/* */` block comments. Comments
//! are lexed as tokens and filtered out by the preprocessor, keeping the
//! tokenizer lossless for tooling that needs the full source shape.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::char,
    combinator::{cut, map},
    error::context,
    sequence::{preceded, terminated},
};

use super::token::{CommentType, ParserResult, Token};

#[tracing::instrument(level = "debug", skip(input))]
fn parse_line_comment(input: &str) -> ParserResult<Token> {
    context(
        "line comment",
        map(
            preceded(char('#'), take_while(|c: char| c != '\n')),
            |content: &str| Token::Comment {
                content: content.trim().to_string(),
                comment_type: CommentType::Line,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_block_comment(input: &str) -> ParserResult<Token> {
    context(
        "block comment",
        map(
            preceded(tag("/*"), cut(terminated(take_until("*/"), tag("*/")))),
            |content: &str| Token::Comment {
                content: content.trim().to_string(),
                comment_type: CommentType::Block,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<Token> {
    alt((parse_line_comment, parse_block_comment))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        let (rest, token) = parse_comment("# greet the user\nsay").unwrap();
        assert_eq!(rest, "\nsay");
        assert_eq!(
            token,
            Token::Comment {
                content: "greet the user".to_string(),
                comment_type: CommentType::Line,
            }
        );
    }

    #[test]
    fn test_block_comment() {
        let (rest, token) = parse_comment("/* multi\nline */rest").unwrap();
        assert_eq!(rest, "rest");
        assert_eq!(
            token,
            Token::Comment {
                content: "multi\nline".to_string(),
                comment_type: CommentType::Block,
            }
        );
    }

    #[test]
    fn test_unterminated_block_comment_is_failure() {
        assert!(matches!(
            parse_comment("/* never closed"),
            Err(nom::Err::Failure(_))
        ));
    }
}
