use core::fmt;

use thiserror::Error;

use crate::analyzer::ParseError;
use crate::tokenizer::token::TokenizerError;

/// Root AST definition: an ordered set of bot declarations.
///
/// A source file defines exactly one bot for execution purposes; the driver
/// selects the first declaration (or rejects multi-bot programs when
/// configured strictly). Bot names are unique within a program — the parser
/// enforces the invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub bots: Vec<BotDecl>,
}

impl Program {
    pub fn new(bots: Vec<BotDecl>) -> Self {
        Self { bots }
    }
}

/// HiveLang bot declaration.
///
/// A bot describes conversational/automation logic through guarded handlers:
///
/// ```text
/// bot Support
///     description "Answers account questions"
///
///     memory session
///         var last_topic: string
///     end
///
///     tools email.send, general.respond
///
///     on input when input contains "invoice"
///         call email.send with { to: "billing@example.com" } as $sent
///         say "Forwarded: {sent.output}"
///     end
///
///     on input
///         say "How can I help?"
///     end
/// end
/// ```
///
/// Exactly one handler executes per call: handlers are evaluated in source
/// order and the first whose guard matches (or which has no guard) wins.
#[derive(Debug, Clone, PartialEq)]
pub struct BotDecl {
    pub name: String,
    pub kind: BotKind,
    pub description: Option<String>,
    pub memory: Vec<MemoryBlock>,
    pub tools: Vec<String>,
    pub handlers: Vec<Handler>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotKind {
    Bot,
    Agent,
}

impl fmt::Display for BotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotKind::Bot => write!(f, "bot"),
            BotKind::Agent => write!(f, "agent"),
        }
    }
}

/// Declares the shape of persisted state. The block holds no values itself;
/// values live in the injected shared-memory backend keyed by
/// `(scope, bot_id/user_id, name)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryBlock {
    pub scope: MemoryScope,
    pub vars: Vec<MemoryVarDecl>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryScope {
    Session,
    User,
}

impl fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryScope::Session => write!(f, "session"),
            MemoryScope::User => write!(f, "user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryVarDecl {
    pub name: String,
    pub type_name: String,
}

/// A guarded or unconditional block of statements selected per input.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub guard: Option<Expr>,
    pub body: Vec<Statement>,
}

pub type Statements = Vec<Statement>;

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Append the rendered expression to the reply.
    Say(Expr),
    /// Invoke the built-in AI-response capability; binds `result`.
    AskAi {
        prompt: Expr,
        model: Option<String>,
    },
    /// Rebind a variable in the execution environment.
    Set { var: String, value: Expr },
    /// Invoke a registered tool with named arguments.
    ///
    /// `bind_as: None` binds the result under `result`, mirroring `ask ai`.
    Call {
        tool: String,
        args: Vec<(String, Expr)>,
        bind_as: Option<String>,
    },
    If {
        condition: Expr,
        then_body: Statements,
        else_body: Option<Statements>,
    },
    /// Iterate a list, shadow-binding the item variable per iteration.
    Loop {
        item: String,
        collection: Expr,
        body: Statements,
    },
    /// Write a value to shared memory.
    Remember { key: Expr, value: Expr },
    /// Read a value from shared memory; binds `result`.
    Recall { key: Expr },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// `$x`, the loop item, or a bare name (`input`, template holes).
    Variable(String),
    /// `input.task`, `$sent.output` — explicit, fallible field lookup.
    PropAccess { base: Box<Expr>, path: Vec<String> },
    /// Literal text interleaved with `{expr}` holes, segmented at parse time.
    Template(Vec<TemplateSegment>),
    Contains(Box<Expr>, Box<Expr>),
    Equals(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateSegment {
    Literal(String),
    Hole(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Literal>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    write!(f, "{}", item)?;
                    if i < items.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ProgramError {
    #[error("lex error: {0}")]
    Tokenize(#[from] TokenizerError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

pub type ProgramResult<T> = Result<T, ProgramError>;
