//! # Execution Driver
//!
//! The only entry point external collaborators call. Orchestrates
//! lex → preprocess → parse → handler selection → interpretation → result
//! assembly, converting every failure mode into a structured
//! [`ExecutionResult`] with the partial step trace preserved.
//!
//! Given identical source, input, and tool responses, two independent calls
//! produce identical output and steps — the engine itself is deterministic;
//! only injected tools may not be.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyzer::Parser;
use crate::ast::{BotDecl, Handler, Program, ProgramResult};
use crate::config::ExecutorConfig;
use crate::eval::context::{CancelSignal, ExecutionContext, ExecutionState, StepRecord};
use crate::eval::evaluator::{EvalResult, EvalScope, Evaluator};
use crate::eval::expression::Value;
use crate::memory::MemoryBridge;
use crate::preprocessor::{Preprocessor, TokenPreprocessor};
use crate::tokenizer::token::Tokenizer;
use crate::tool::registry::ToolRegistry;
use crate::tool::Tool;

/// Driver error string for a guard set that matches nothing and has no
/// unconditional fallback.
pub const NO_HANDLER_MATCHED: &str = "NoHandlerMatched";
/// Driver error string for multi-bot programs under strict single-bot mode.
pub const MULTIPLE_BOTS_UNSUPPORTED: &str = "MultipleBotsUnsupported";

/// Result of one `execute` call. Immutable after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<StepRecord>,
}

impl ExecutionResult {
    fn succeeded(output: String, steps: Vec<StepRecord>) -> Self {
        Self {
            success: true,
            output,
            error: None,
            steps,
        }
    }

    fn failed(error: impl Into<String>, steps: Vec<StepRecord>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
            steps,
        }
    }

    /// A successful execution may legitimately produce no reply text; hosts
    /// wanting a fallback (e.g. a raw model completion) branch here instead
    /// of treating empty output as a failure.
    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }
}

/// Lexes, preprocesses, and parses a source program.
pub fn compile(source: &str) -> ProgramResult<Program> {
    let mut tokenizer = Tokenizer::new();
    let spans = tokenizer.tokenize(source)?;
    let spans = TokenPreprocessor::default().process(spans);
    let mut parser = Parser::new(&spans);
    Ok(parser.parse_program()?)
}

/// The execution driver.
pub struct Executor {
    config: ExecutorConfig,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Executes a HiveLang program against a runtime input.
    ///
    /// Lex/parse failures return before any tool or memory traffic. Runtime
    /// failures return the partial step trace; side effects of statements
    /// already executed are not rolled back.
    pub async fn execute(
        &self,
        source: &str,
        input: Value,
        tools: &[Arc<dyn Tool>],
        context: &ExecutionContext,
    ) -> ExecutionResult {
        self.execute_cancellable(source, input, tools, context, CancelSignal::default())
            .await
    }

    /// [`Executor::execute`] with an external cancellation signal, checked
    /// between statements and before each tool await.
    #[tracing::instrument(
        level = "debug",
        skip(self, source, input, tools, context, cancel),
        fields(bot_id = %context.metadata.bot_id, run_id = %context.metadata.run_id)
    )]
    pub async fn execute_cancellable(
        &self,
        source: &str,
        input: Value,
        tools: &[Arc<dyn Tool>],
        context: &ExecutionContext,
        cancel: CancelSignal,
    ) -> ExecutionResult {
        let program = match compile(source) {
            Ok(program) => program,
            Err(error) => return ExecutionResult::failed(error.to_string(), Vec::new()),
        };

        let bot = match self.select_bot(&program) {
            Ok(bot) => bot,
            Err(error) => return ExecutionResult::failed(error, Vec::new()),
        };
        debug!(bot = %bot.name, handlers = bot.handlers.len(), "program compiled");

        let registry = ToolRegistry::new(tools);
        let memory = MemoryBridge::new(context.shared_memory.clone());
        let mut state = ExecutionState::new(input);
        let scope = EvalScope {
            registry: &registry,
            memory: &memory,
            context,
            bot,
            cancel,
            deadline: self.config.deadline.map(|d| Instant::now() + d),
            tool_timeout: self.config.tool_timeout,
        };

        let evaluator = Evaluator::new();
        let handler = match select_handler(&evaluator, bot, &state, &scope).await {
            Ok(Some(handler)) => handler,
            Ok(None) => return ExecutionResult::failed(NO_HANDLER_MATCHED, Vec::new()),
            Err(error) => return ExecutionResult::failed(error.to_string(), Vec::new()),
        };

        match evaluator.eval_handler(handler, &mut state, &scope).await {
            Ok(()) => ExecutionResult::succeeded(state.joined_output(), state.steps),
            Err(error) => ExecutionResult::failed(error.to_string(), state.steps),
        }
    }

    fn select_bot<'p>(&self, program: &'p Program) -> Result<&'p BotDecl, String> {
        if self.config.strict_single_bot && program.bots.len() > 1 {
            return Err(MULTIPLE_BOTS_UNSUPPORTED.to_string());
        }
        // The parser guarantees at least one declaration.
        Ok(&program.bots[0])
    }
}

/// Evaluates handler guards over the input in declaration order; the first
/// match (or the first unconditional handler) wins. Exactly one handler
/// executes per call.
async fn select_handler<'b>(
    evaluator: &Evaluator,
    bot: &'b BotDecl,
    state: &ExecutionState,
    scope: &EvalScope<'_>,
) -> EvalResult<Option<&'b Handler>> {
    for handler in &bot.handlers {
        match &handler.guard {
            None => return Ok(Some(handler)),
            Some(guard) => {
                if evaluator.eval_guard(guard, &state.env, scope).await? {
                    return Ok(Some(handler));
                }
            }
        }
    }
    Ok(None)
}

/// Convenience entry point with the default configuration.
pub async fn execute_program(
    source: &str,
    input: Value,
    tools: &[Arc<dyn Tool>],
    context: &ExecutionContext,
) -> ExecutionResult {
    Executor::default().execute(source, input, tools, context).await
}
