//! # Top-Level Declarations
//!
//! Parses programs, bot/agent declarations, memory blocks, tool
//! declarations, and handlers.

use super::core::{ParseError, ParseResult, Parser};
use crate::ast::{BotDecl, BotKind, Handler, MemoryBlock, MemoryScope, MemoryVarDecl, Program};
use crate::tokenizer::keyword::Keyword;
use crate::tokenizer::symbol::Delimiter;

impl Parser<'_> {
    /// `Program := BotDecl+`
    ///
    /// Bot names must be unique within a program.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn parse_program(&mut self) -> ParseResult<Program> {
        let mut bots: Vec<BotDecl> = Vec::new();
        while !self.at_end() {
            let bot = self.parse_bot()?;
            if bots.iter().any(|existing| existing.name == bot.name) {
                return Err(ParseError::DuplicateBot { name: bot.name });
            }
            bots.push(bot);
        }
        if bots.is_empty() {
            return Err(self.unexpected("'bot' or 'agent' declaration"));
        }
        Ok(Program::new(bots))
    }

    /// `BotDecl := ('bot'|'agent') Ident BotBody 'end'`
    fn parse_bot(&mut self) -> ParseResult<BotDecl> {
        let kind = if self.eat_keyword(Keyword::Bot) {
            BotKind::Bot
        } else if self.eat_keyword(Keyword::Agent) {
            BotKind::Agent
        } else {
            return Err(self.unexpected("'bot' or 'agent'"));
        };
        let name = self.expect_identifier("bot name")?;

        let description = if self.eat_keyword(Keyword::Description) {
            Some(self.expect_string("description text")?)
        } else {
            None
        };

        let mut memory = Vec::new();
        let mut tools = Vec::new();
        loop {
            if self.check_keyword(Keyword::Memory) {
                memory.push(self.parse_memory_block()?);
            } else if self.eat_keyword(Keyword::Tools) {
                loop {
                    tools.push(self.dotted_name()?);
                    if !self.eat_delimiter(Delimiter::Comma) {
                        break;
                    }
                }
            } else {
                break;
            }
        }

        let mut handlers = Vec::new();
        while self.check_keyword(Keyword::On) {
            handlers.push(self.parse_handler()?);
        }
        if handlers.is_empty() {
            return Err(self.unexpected("'on input' handler"));
        }

        self.expect_keyword(Keyword::End)?;

        Ok(BotDecl {
            name,
            kind,
            description,
            memory,
            tools,
            handlers,
        })
    }

    /// `memory session|user (var name: type)* end`
    fn parse_memory_block(&mut self) -> ParseResult<MemoryBlock> {
        self.expect_keyword(Keyword::Memory)?;
        let scope = if self.eat_keyword(Keyword::Session) {
            MemoryScope::Session
        } else if self.eat_keyword(Keyword::User) {
            MemoryScope::User
        } else {
            return Err(self.unexpected("'session' or 'user'"));
        };

        let mut vars = Vec::new();
        while self.eat_keyword(Keyword::Var) {
            let name = self.expect_name("memory variable name")?;
            self.expect_delimiter(Delimiter::Colon)?;
            let type_name = self.expect_name("memory variable type")?;
            vars.push(MemoryVarDecl { name, type_name });
        }
        self.expect_keyword(Keyword::End)?;

        Ok(MemoryBlock { scope, vars })
    }

    /// `Handler := 'on' 'input' ('when' Expr)? Statement* 'end'`
    fn parse_handler(&mut self) -> ParseResult<Handler> {
        self.expect_keyword(Keyword::On)?;
        self.expect_keyword(Keyword::Input)?;
        let guard = if self.eat_keyword(Keyword::When) {
            Some(self.parse_guard()?)
        } else {
            None
        };
        let body = self.parse_statements()?;
        self.expect_keyword(Keyword::End)?;
        Ok(Handler { guard, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Literal, Statement};
    use crate::preprocessor::{Preprocessor, TokenPreprocessor};
    use crate::tokenizer::token::{TokenSpan, Tokenizer};
    use pretty_assertions::assert_eq;

    fn spans(source: &str) -> Vec<TokenSpan> {
        let mut tokenizer = Tokenizer::new();
        TokenPreprocessor::default().process(tokenizer.tokenize(source).unwrap())
    }

    fn parse(source: &str) -> ParseResult<Program> {
        let tokens = spans(source);
        Parser::new(&tokens).parse_program()
    }

    #[test]
    fn test_minimal_bot() {
        let program = parse(
            r#"
            bot Test
                on input
                    say "hello"
                end
            end
            "#,
        )
        .unwrap();

        assert_eq!(program.bots.len(), 1);
        let bot = &program.bots[0];
        assert_eq!(bot.name, "Test");
        assert_eq!(bot.kind, BotKind::Bot);
        assert_eq!(bot.handlers.len(), 1);
        assert!(bot.handlers[0].guard.is_none());
        assert_eq!(
            bot.handlers[0].body,
            vec![Statement::Say(Expr::Literal(Literal::String(
                "hello".to_string()
            )))]
        );
    }

    #[test]
    fn test_agent_with_description_memory_tools() {
        let program = parse(
            r#"
            agent Helper
                description "A helpful agent"

                memory session
                    var last_topic: string
                    var visits: number
                end

                memory user
                    var name: string
                end

                tools email.send, general.respond

                on input
                    say "hi"
                end
            end
            "#,
        )
        .unwrap();

        let bot = &program.bots[0];
        assert_eq!(bot.kind, BotKind::Agent);
        assert_eq!(bot.description.as_deref(), Some("A helpful agent"));
        assert_eq!(bot.memory.len(), 2);
        assert_eq!(bot.memory[0].scope, MemoryScope::Session);
        assert_eq!(bot.memory[0].vars.len(), 2);
        assert_eq!(bot.memory[0].vars[1].name, "visits");
        assert_eq!(bot.memory[0].vars[1].type_name, "number");
        assert_eq!(bot.memory[1].scope, MemoryScope::User);
        assert_eq!(
            bot.tools,
            vec!["email.send".to_string(), "general.respond".to_string()]
        );
    }

    #[test]
    fn test_guarded_and_fallback_handlers() {
        let program = parse(
            r#"
            bot Test
                on input when input contains "quiz"
                    say "Quiz mode"
                end
                on input
                    say "Default"
                end
            end
            "#,
        )
        .unwrap();

        let bot = &program.bots[0];
        assert_eq!(bot.handlers.len(), 2);
        assert!(bot.handlers[0].guard.is_some());
        assert!(bot.handlers[1].guard.is_none());
    }

    #[test]
    fn test_duplicate_bot_rejected() {
        let result = parse(
            r#"
            bot Twin
                on input
                    say "one"
                end
            end
            bot Twin
                on input
                    say "two"
                end
            end
            "#,
        );
        assert_eq!(
            result,
            Err(ParseError::DuplicateBot {
                name: "Twin".to_string()
            })
        );
    }

    #[test]
    fn test_missing_end_rejected() {
        let result = parse(
            r#"
            bot Broken
                on input
                    say "hello"
            end
            "#,
        );
        assert!(matches!(result, Err(ParseError::UnexpectedEof { .. })));
    }

    #[test]
    fn test_handler_required() {
        let result = parse("bot Empty end");
        assert!(matches!(
            result,
            Err(ParseError::UnexpectedToken { ref expected, .. }) if expected.contains("on input")
        ));
    }
}
