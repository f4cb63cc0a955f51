//! # HiveLang Evaluation System
//!
//! Executes a parsed handler at runtime, transforming the AST into reply
//! text, environment bindings, tool invocations, and a step trace.
//!
//! # Core Components
//!
//! ## Statement Evaluator
//! Dispatches individual statements, appending one step record per executed
//! statement so a failing step is visible in the trace.
//!
//! ## Expression Evaluator
//! Evaluates literals, variables, property access, templates, and guard
//! operators against the execution environment.
//!
//! ## Execution Context
//! The externally supplied run metadata and shared-memory handle, plus the
//! per-execution state (environment, output buffer, step trace) threaded
//! explicitly through every evaluator call — no shared mutable globals, so
//! independent executions are safe to run concurrently.
//!
//! # Evaluation Pipeline
//!
//! 1. The driver selects a handler by evaluating guards in source order
//! 2. The statement evaluator walks the handler body sequentially
//! 3. Tool calls and memory round trips are the only suspension points
//! 4. The first runtime error aborts the remaining statements (fail-fast)

pub mod context;
pub mod evaluator;
pub mod expression;
pub mod statement;
