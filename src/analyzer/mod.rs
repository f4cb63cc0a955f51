//! # HiveLang Analyzer (Parser)
//!
//! Transforms the preprocessed token stream into an AST by recursive descent
//! with one token of lookahead.
//!
//! ## Architecture
//!
//! * [`core`]: the [`Parser`](core::Parser) cursor over token spans and the
//!   [`ParseError`](core::ParseError) type
//! * [`root`]: program, bot, memory, and handler declarations
//! * [`statement`]: statements dispatched by leading keyword
//! * [`expression`]: guard expressions (`not` > `and` > `or`), comparisons,
//!   primaries, and string-template segmentation
//!
//! ## Position in the Pipeline
//!
//! ```text
//! Source Code → Tokenizer → Preprocessor → Analyzer/Parser → Interpreter
//! ```
//!
//! Any structural mismatch aborts parsing with a positioned error — partial
//! ASTs are never returned, and parsing the same token stream twice yields
//! structurally identical results (no hidden state).

pub mod core;
pub mod expression;
pub mod root;
pub mod statement;

pub use self::core::ParseError;
pub use self::core::ParseResult;
pub use self::core::Parser;
