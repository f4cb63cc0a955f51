//! # Statement Parsing
//!
//! Statements are dispatched on their leading keyword. A statement list ends
//! at `end`, `else`, or end of input; the caller owns the closing `end`.

use super::core::{ParseResult, Parser};
use crate::ast::{Expr, Statement, Statements};
use crate::tokenizer::keyword::Keyword;
use crate::tokenizer::symbol::Delimiter;
use crate::tokenizer::token::Token;

impl Parser<'_> {
    pub(crate) fn parse_statements(&mut self) -> ParseResult<Statements> {
        let mut statements = Vec::new();
        loop {
            match self.peek_token() {
                None
                | Some(Token::Keyword(Keyword::End))
                | Some(Token::Keyword(Keyword::Else)) => break,
                Some(Token::Keyword(Keyword::Say)) => statements.push(self.parse_say()?),
                Some(Token::Keyword(Keyword::Ask)) => statements.push(self.parse_ask_ai()?),
                Some(Token::Keyword(Keyword::Set)) => statements.push(self.parse_set()?),
                Some(Token::Keyword(Keyword::Call)) => statements.push(self.parse_call()?),
                Some(Token::Keyword(Keyword::If)) => statements.push(self.parse_if()?),
                Some(Token::Keyword(Keyword::Loop)) => statements.push(self.parse_loop()?),
                Some(Token::Keyword(Keyword::Remember)) => {
                    statements.push(self.parse_remember()?)
                }
                Some(Token::Keyword(Keyword::Recall)) => statements.push(self.parse_recall()?),
                _ => return Err(self.unexpected("a statement or 'end'")),
            }
        }
        Ok(statements)
    }

    fn parse_say(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Say)?;
        Ok(Statement::Say(self.parse_expression()?))
    }

    /// `ask ai <expr> [with model: "…"]`
    fn parse_ask_ai(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Ask)?;
        if !self.eat_identifier("ai") {
            return Err(self.unexpected("'ai'"));
        }
        let prompt = self.parse_expression()?;
        let model = if self.eat_keyword(Keyword::With) {
            if !self.eat_identifier("model") {
                return Err(self.unexpected("'model'"));
            }
            self.expect_delimiter(Delimiter::Colon)?;
            Some(self.expect_string("model name")?)
        } else {
            None
        };
        Ok(Statement::AskAi { prompt, model })
    }

    /// `set $x [=] <expr>` — the `=` is optional surface sugar.
    fn parse_set(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Set)?;
        let var = self.expect_variable()?;
        self.eat_delimiter(Delimiter::Equal);
        let value = self.parse_expression()?;
        Ok(Statement::Set { var, value })
    }

    /// `call ns.verb with { k: v, … } [as $x]`
    fn parse_call(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Call)?;
        let tool = self.dotted_name()?;
        self.expect_keyword(Keyword::With)?;
        self.expect_delimiter(Delimiter::OpenBrace)?;

        let mut args = Vec::new();
        if !self.check_delimiter(Delimiter::CloseBrace) {
            loop {
                let name = self.expect_name("argument name")?;
                self.expect_delimiter(Delimiter::Colon)?;
                let value = self.parse_expression()?;
                args.push((name, value));
                if !self.eat_delimiter(Delimiter::Comma) {
                    break;
                }
                // trailing comma
                if self.check_delimiter(Delimiter::CloseBrace) {
                    break;
                }
            }
        }
        self.expect_delimiter(Delimiter::CloseBrace)?;

        let bind_as = if self.eat_keyword(Keyword::As) {
            Some(self.expect_variable()?)
        } else {
            None
        };

        Ok(Statement::Call {
            tool,
            args,
            bind_as,
        })
    }

    /// `if <guard> … [else …] end`
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::If)?;
        let condition = self.parse_guard()?;
        let then_body = self.parse_statements()?;
        let else_body = if self.eat_keyword(Keyword::Else) {
            Some(self.parse_statements()?)
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;
        Ok(Statement::If {
            condition,
            then_body,
            else_body,
        })
    }

    /// `loop $item in $collection … end`
    fn parse_loop(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Loop)?;
        let item = self.expect_variable()?;
        self.expect_keyword(Keyword::In)?;
        if !matches!(self.peek_token(), Some(Token::Variable(_))) {
            return Err(self.unexpected("a '$' collection variable"));
        }
        let collection = self.parse_primary()?;
        let body = self.parse_statements()?;
        self.expect_keyword(Keyword::End)?;
        Ok(Statement::Loop {
            item,
            collection,
            body,
        })
    }

    /// `remember "key" as <expr>`
    fn parse_remember(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Remember)?;
        let key = self.parse_expression()?;
        self.expect_keyword(Keyword::As)?;
        let value = self.parse_expression()?;
        Ok(Statement::Remember { key, value })
    }

    /// `recall "key"` — binds the stored value as `result`.
    fn parse_recall(&mut self) -> ParseResult<Statement> {
        self.expect_keyword(Keyword::Recall)?;
        let key = self.parse_expression()?;
        Ok(Statement::Recall { key })
    }

    pub(crate) fn parse_guard(&mut self) -> ParseResult<Expr> {
        self.parse_expression()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use crate::preprocessor::{Preprocessor, TokenPreprocessor};
    use crate::tokenizer::token::{TokenSpan, Tokenizer};
    use pretty_assertions::assert_eq;

    fn spans(source: &str) -> Vec<TokenSpan> {
        let mut tokenizer = Tokenizer::new();
        TokenPreprocessor::default().process(tokenizer.tokenize(source).unwrap())
    }

    fn parse_one(source: &str) -> Statement {
        let tokens = spans(source);
        let mut parser = Parser::new(&tokens);
        let mut statements = parser.parse_statements().unwrap();
        assert_eq!(statements.len(), 1, "expected one statement");
        statements.remove(0)
    }

    #[test]
    fn test_say() {
        assert_eq!(
            parse_one(r#"say "hello""#),
            Statement::Say(Expr::Literal(Literal::String("hello".to_string())))
        );
    }

    #[test]
    fn test_ask_ai_with_model() {
        assert_eq!(
            parse_one(r#"ask ai "Summarize this" with model: "gpt-4""#),
            Statement::AskAi {
                prompt: Expr::Literal(Literal::String("Summarize this".to_string())),
                model: Some("gpt-4".to_string()),
            }
        );
    }

    #[test]
    fn test_ask_ai_without_model() {
        assert_eq!(
            parse_one(r#"ask ai "hello""#),
            Statement::AskAi {
                prompt: Expr::Literal(Literal::String("hello".to_string())),
                model: None,
            }
        );
    }

    #[test]
    fn test_set_with_and_without_equals() {
        let expected = Statement::Set {
            var: "x".to_string(),
            value: Expr::Literal(Literal::Number(1.0)),
        };
        assert_eq!(parse_one("set $x = 1"), expected);
        assert_eq!(parse_one("set $x 1"), expected);
    }

    #[test]
    fn test_set_list() {
        assert_eq!(
            parse_one("set $items = [1, 2, 3]"),
            Statement::Set {
                var: "items".to_string(),
                value: Expr::Literal(Literal::List(vec![
                    Literal::Number(1.0),
                    Literal::Number(2.0),
                    Literal::Number(3.0),
                ])),
            }
        );
    }

    #[test]
    fn test_call_with_binding() {
        let statement = parse_one(
            r#"call email.send with { to: "a@b.c", subject: $subject } as $sent"#,
        );
        match statement {
            Statement::Call {
                tool,
                args,
                bind_as,
            } => {
                assert_eq!(tool, "email.send");
                assert_eq!(args.len(), 2);
                assert_eq!(args[0].0, "to");
                assert_eq!(args[1].0, "subject");
                assert_eq!(args[1].1, Expr::Variable("subject".to_string()));
                assert_eq!(bind_as.as_deref(), Some("sent"));
            }
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn test_call_without_binding_or_args() {
        let statement = parse_one("call crm.sync with { }");
        assert_eq!(
            statement,
            Statement::Call {
                tool: "crm.sync".to_string(),
                args: vec![],
                bind_as: None,
            }
        );
    }

    #[test]
    fn test_call_missing_with_rejected() {
        let tokens = spans(r#"call email.send { to: "a" }"#);
        let mut parser = Parser::new(&tokens);
        assert!(parser.parse_statements().is_err());
    }

    #[test]
    fn test_if_else() {
        let statement = parse_one(
            r#"
            if $mode == "quiz"
                say "quiz"
            else
                say "chat"
            end
            "#,
        );
        match statement {
            Statement::If {
                condition,
                then_body,
                else_body,
            } => {
                assert!(matches!(condition, Expr::Equals(_, _)));
                assert_eq!(then_body.len(), 1);
                assert_eq!(else_body.unwrap().len(), 1);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_loop() {
        let statement = parse_one(
            r#"
            loop $x in $items
                say "{x}"
            end
            "#,
        );
        match statement {
            Statement::Loop {
                item,
                collection,
                body,
            } => {
                assert_eq!(item, "x");
                assert_eq!(collection, Expr::Variable("items".to_string()));
                assert_eq!(body.len(), 1);
            }
            other => panic!("expected loop, got {:?}", other),
        }
    }

    #[test]
    fn test_loop_requires_collection_variable() {
        let tokens = spans(r#"loop $x in [1, 2] say "no" end"#);
        let mut parser = Parser::new(&tokens);
        assert!(parser.parse_statements().is_err());
    }

    #[test]
    fn test_remember_and_recall() {
        assert_eq!(
            parse_one(r#"remember "topic" as $topic"#),
            Statement::Remember {
                key: Expr::Literal(Literal::String("topic".to_string())),
                value: Expr::Variable("topic".to_string()),
            }
        );
        assert_eq!(
            parse_one(r#"recall "topic""#),
            Statement::Recall {
                key: Expr::Literal(Literal::String("topic".to_string())),
            }
        );
    }
}
