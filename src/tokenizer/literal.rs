//! # Literal Token Handling
//!
//! String, triple-quoted string, and number literals.
//!
//! String content is kept raw here: `{expr}` template holes are segmented by
//! the parser, not during lexing, so evaluation works on pre-parsed segments
//! instead of rescanning text per statement.

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_until},
    character::complete::{char, digit1},
    combinator::{cut, map, map_res, opt, recognize, value},
    error::context,
    sequence::{pair, preceded, terminated, tuple},
};

use super::token::{ParserResult, Token};

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A string literal. `triple` marks `"""…"""` multiline strings whose
    /// content is kept verbatim (no escape processing).
    Str { content: String, triple: bool },
    Number(f64),
}

impl core::fmt::Display for Literal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Literal::Str { content, .. } => write!(f, "string {:?}", content),
            Literal::Number(n) => write!(f, "number {}", n),
        }
    }
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_triple_string(input: &str) -> ParserResult<Literal> {
    context(
        "triple-quoted string literal",
        map(
            preceded(
                tag("\"\"\""),
                cut(terminated(take_until("\"\"\""), tag("\"\"\""))),
            ),
            |content: &str| Literal::Str {
                content: content.to_string(),
                triple: true,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_double_quoted(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            preceded(
                char('"'),
                cut(terminated(
                    opt(escaped_transform(
                        is_not("\\\"\n"),
                        '\\',
                        alt((
                            value("\n", char('n')),
                            value("\t", char('t')),
                            value("\\", char('\\')),
                            value("\"", char('"')),
                            value("'", char('\'')),
                        )),
                    )),
                    char('"'),
                )),
            ),
            |content: Option<String>| Literal::Str {
                content: content.unwrap_or_default(),
                triple: false,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_single_quoted(input: &str) -> ParserResult<Literal> {
    context(
        "string literal",
        map(
            preceded(
                char('\''),
                cut(terminated(
                    opt(escaped_transform(
                        is_not("\\'\n"),
                        '\\',
                        alt((
                            value("\n", char('n')),
                            value("\t", char('t')),
                            value("\\", char('\\')),
                            value("\"", char('"')),
                            value("'", char('\'')),
                        )),
                    )),
                    char('\''),
                )),
            ),
            |content: Option<String>| Literal::Str {
                content: content.unwrap_or_default(),
                triple: false,
            },
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
fn parse_number(input: &str) -> ParserResult<Literal> {
    context(
        "number literal",
        map_res(
            alt((
                recognize(tuple((opt(char('-')), digit1, char('.'), digit1))),
                recognize(pair(opt(char('-')), digit1)),
            )),
            |s: &str| s.parse::<f64>().map(Literal::Number),
        ),
    )(input)
}

#[tracing::instrument(level = "debug", skip(input))]
pub fn parse_literal(input: &str) -> ParserResult<Token> {
    context(
        "literal",
        map(
            alt((
                // Triple quotes before plain quotes, longest match
                parse_triple_string,
                parse_double_quoted,
                parse_single_quoted,
                parse_number,
            )),
            Token::Literal,
        ),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_string() {
        let (rest, result) = parse_double_quoted("\"hello world\"").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            result,
            Literal::Str {
                content: "hello world".to_string(),
                triple: false
            }
        );
    }

    #[test]
    fn test_empty_string() {
        let (rest, result) = parse_double_quoted("\"\"").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            result,
            Literal::Str {
                content: String::new(),
                triple: false
            }
        );
    }

    #[test]
    fn test_escapes() {
        let (rest, result) = parse_double_quoted(r#""a\nb\t\"c\"""#).unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            result,
            Literal::Str {
                content: "a\nb\t\"c\"".to_string(),
                triple: false
            }
        );
    }

    #[test]
    fn test_single_quoted() {
        let (rest, result) = parse_single_quoted("'hi there'").unwrap();
        assert_eq!(rest, "");
        assert_eq!(
            result,
            Literal::Str {
                content: "hi there".to_string(),
                triple: false
            }
        );
    }

    #[test]
    fn test_template_holes_kept_raw() {
        // Hole segmentation happens in the parser, not here.
        let (_, result) = parse_double_quoted("\"hello {name}\"").unwrap();
        assert_eq!(
            result,
            Literal::Str {
                content: "hello {name}".to_string(),
                triple: false
            }
        );
    }

    #[test]
    fn test_triple_quoted_multiline() {
        let input = "\"\"\"line one\nline two {x}\"\"\" rest";
        let (rest, result) = parse_triple_string(input).unwrap();
        assert_eq!(rest, " rest");
        assert_eq!(
            result,
            Literal::Str {
                content: "line one\nline two {x}".to_string(),
                triple: true
            }
        );
    }

    #[test]
    fn test_number_literals() {
        let (rest, result) = parse_number("123").unwrap();
        assert_eq!(result, Literal::Number(123.0));
        assert_eq!(rest, "");

        let (rest, result) = parse_number("-123").unwrap();
        assert_eq!(result, Literal::Number(-123.0));
        assert_eq!(rest, "");

        let (rest, result) = parse_number("123.45").unwrap();
        assert_eq!(result, Literal::Number(123.45));
        assert_eq!(rest, "");

        let (rest, result) = parse_number("-0.5").unwrap();
        assert_eq!(result, Literal::Number(-0.5));
        assert_eq!(rest, "");
    }

    #[test]
    fn test_unterminated_string_is_failure() {
        // cut() escalates to a failure so the tokenizer stops immediately
        assert!(matches!(
            parse_double_quoted("\"oops"),
            Err(nom::Err::Failure(_))
        ));
    }
}
