//! # Token Preprocessor
//!
//! Bridges tokenization and parsing: the tokenizer preserves comments,
//! whitespace, and newlines for exact spans, while the parser wants only the
//! meaningful tokens. The preprocessor filters the stream in between.
//!
//! ```text
//! Source Code → Tokenizer → Preprocessor → Parser → Interpreter
//! ```

use crate::tokenizer::token::TokenSpan;

/// A trait for preprocessing different types of input
pub trait Preprocessor<T, U = T> {
    /// Process the input of type T and return the processed result
    fn process(&self, input: T) -> U;
}

/// Token-specific preprocessor implementation
#[derive(Default)]
pub struct TokenPreprocessor {}

impl TokenPreprocessor {
    pub fn new() -> Self {
        Self {}
    }
}

impl Preprocessor<Vec<TokenSpan>> for TokenPreprocessor {
    fn process(&self, input: Vec<TokenSpan>) -> Vec<TokenSpan> {
        input
            .into_iter()
            .filter(|span| {
                !span.token.is_comment() && !span.token.is_whitespace() && !span.token.is_newline()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::token::{Token, Tokenizer};

    #[test]
    fn test_filters_formatting_tokens() {
        let mut tokenizer = Tokenizer::new();
        let spans = tokenizer
            .tokenize("say \"hi\"  # greet\nend")
            .unwrap();
        let filtered = TokenPreprocessor::default().process(spans);

        assert!(filtered.iter().all(|span| {
            !span.token.is_comment() && !span.token.is_whitespace() && !span.token.is_newline()
        }));
        // say, "hi", end
        assert_eq!(filtered.len(), 3);
        assert!(matches!(filtered[0].token, Token::Keyword(_)));
    }

    #[test]
    fn test_spans_survive_filtering() {
        let mut tokenizer = Tokenizer::new();
        let spans = tokenizer.tokenize("say\n  end").unwrap();
        let filtered = TokenPreprocessor::default().process(spans);
        assert_eq!(filtered[1].line, 2);
        assert_eq!(filtered[1].column, 3);
    }
}
