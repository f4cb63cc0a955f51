use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::context::{CancelSignal, Environment, ExecutionContext, ExecutionState};
use super::expression::{as_bool, PropertyError};
use super::statement::StatementEvaluator;
use crate::ast::{BotDecl, Expr, Handler, MemoryScope};
use crate::memory::{scoped_key, MemoryBridge, MemoryError};
use crate::tool::registry::ToolRegistry;
use crate::tool::Tool;

/// Runtime error taxonomy.
///
/// Lex and parse errors are terminal and pre-execution; these abort only the
/// remainder of the current handler. Statements already executed keep their
/// external side effects — the engine performs no rollback and no retries.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("unbound variable: {0}")]
    UnboundVariable(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool execution failed: {0}")]
    Tool(String),
    #[error("type mismatch: expected {expected}, found {found}")]
    Type { expected: String, found: String },
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("memory bridge error: {0}")]
    Memory(#[from] MemoryError),
    #[error("execution timed out")]
    Timeout,
    #[error("execution cancelled")]
    Cancelled,
}

pub type EvalResult<T> = Result<T, RuntimeError>;

/// Borrowed collaborators for one handler execution: the per-call tool
/// registry, the memory bridge, the host context, the bot declaration
/// (memory-block shapes), and the execution bounds.
pub struct EvalScope<'a> {
    pub registry: &'a ToolRegistry,
    pub memory: &'a MemoryBridge,
    pub context: &'a ExecutionContext,
    pub bot: &'a BotDecl,
    pub cancel: CancelSignal,
    pub deadline: Option<Instant>,
    pub tool_timeout: Duration,
}

impl EvalScope<'_> {
    /// Checked between statements and before tool awaits: cancellation and
    /// the overall deadline both surface as runtime errors, never as hangs.
    pub fn ensure_active(&self) -> EvalResult<()> {
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RuntimeError::Timeout);
            }
        }
        Ok(())
    }

    /// Per-invocation tool timeout, clamped to the remaining overall
    /// deadline.
    pub fn remaining_tool_timeout(&self) -> Duration {
        match self.deadline {
            Some(deadline) => {
                let now = Instant::now();
                if deadline <= now {
                    Duration::ZERO
                } else {
                    self.tool_timeout.min(deadline - now)
                }
            }
            None => self.tool_timeout,
        }
    }

    /// Resolves the AI-response tool for `ask ai`.
    pub fn ai_responder(&self) -> EvalResult<Arc<dyn Tool>> {
        self.registry
            .ai_responder()
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownTool(crate::tool::AI_CAPABILITY.to_string()))
    }

    /// Scoped memory key for a name declared in one of the bot's memory
    /// blocks; `None` if the name is undeclared or the scope owner is
    /// missing (user scope without a user id).
    pub fn memory_key(&self, name: &str) -> Option<String> {
        for block in &self.bot.memory {
            if block.vars.iter().any(|var| var.name == name) {
                return match block.scope {
                    MemoryScope::Session => Some(scoped_key(
                        &block.scope,
                        &self.context.metadata.bot_id,
                        name,
                    )),
                    MemoryScope::User => self
                        .context
                        .metadata
                        .user_id
                        .as_ref()
                        .map(|user_id| scoped_key(&block.scope, user_id, name)),
                };
            }
        }
        None
    }
}

/// Top-level entry point for handler evaluation.
#[derive(Default)]
pub struct Evaluator {
    statement_evaluator: StatementEvaluator,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executes a selected handler's statement list against the shared
    /// state. Fail-fast: the first runtime error aborts the remainder.
    pub async fn eval_handler(
        &self,
        handler: &Handler,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<()> {
        self.statement_evaluator
            .eval_block(&handler.body, state, scope)
            .await
    }

    /// Evaluates a handler guard over the input environment. A guard must
    /// produce a boolean; anything else is a type error.
    pub async fn eval_guard(
        &self,
        guard: &Expr,
        env: &Environment,
        scope: &EvalScope<'_>,
    ) -> EvalResult<bool> {
        let value = self
            .statement_evaluator
            .expression_evaluator
            .eval(guard, env, scope)
            .await?;
        as_bool(value)
    }
}
