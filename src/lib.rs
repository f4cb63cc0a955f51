//! # HiveLang: Bot-Scripting Execution Engine
//!
//! HiveLang is a small scripting language that lets non-engineers describe
//! conversational and automation logic: match an incoming message, call
//! named external capabilities (AI completion, email, messaging, CRM,
//! payments), hold short- and long-lived memory, branch, loop, and produce a
//! textual reply. This crate is the engine that turns source text plus a
//! runtime input into a deterministic, traceable result.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Source Code → Tokenizer → Preprocessor → Parser → Interpreter → Result
//! ```
//!
//! ### Stage 1: Tokenization (Lexical Analysis)
//!
//! The [`tokenizer`] module transforms source code into a position-tracked
//! token stream: keywords, identifiers, `$variables`, string and
//! triple-quoted literals, numbers, operators, and comments.
//!
//! ### Stage 2: Preprocessing
//!
//! The [`preprocessor`] module filters comment and whitespace tokens to
//! prepare the stream for parsing.
//!
//! ### Stage 3: Parsing (Syntactic Analysis)
//!
//! The [`analyzer`] module builds the [`ast`] by recursive descent: bot
//! declarations, memory blocks, guarded handlers, statements, and
//! expressions, with string templates segmented once at parse time.
//!
//! ### Stage 4: Evaluation (Execution)
//!
//! The [`eval`] module walks a selected handler's statements against an
//! explicit execution state, consulting the [`tool`] registry and the
//! [`memory`] bridge, accumulating reply text and a step trace.
//!
//! ## Driver
//!
//! The [`executor`] module is the single entry point external collaborators
//! call:
//!
//! ```ignore
//! use hivelang::{ExecutionContext, Executor, ExecutorConfig, RunMetadata, Value};
//!
//! let executor = Executor::new(ExecutorConfig::default());
//! let result = executor.execute(source, input, &tools, &context).await;
//! ```
//!
//! Everything stateful is injected: tools implement [`tool::Tool`], and
//! persistence implements [`memory::SharedMemory`]. The engine holds no
//! global state, so independent executions are safe to run concurrently.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod eval;
pub mod executor;
pub mod memory;
pub mod preprocessor;
pub mod tokenizer;
pub mod tool;

// Re-exports
pub use ast::*;
pub use config::ExecutorConfig;
pub use eval::context::{
    CancelSignal, Environment, ExecutionContext, ExecutionState, RunMetadata, StepKind,
    StepOutcome, StepRecord,
};
pub use eval::evaluator::{EvalResult, EvalScope, Evaluator, RuntimeError};
pub use eval::expression::{PropertyError, Value};
pub use executor::{
    compile, execute_program, ExecutionResult, Executor, MULTIPLE_BOTS_UNSUPPORTED,
    NO_HANDLER_MATCHED,
};
pub use memory::{InMemorySharedMemory, MemoryBridge, MemoryError, SharedMemory};
pub use tool::registry::ToolRegistry;
pub use tool::{Tool, ToolArgs, ToolError, ToolOutput, AI_CAPABILITY, AI_FALLBACK_TOOL};

#[cfg(test)]
mod tests {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    #[ctor::ctor]
    fn init_tests() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}
