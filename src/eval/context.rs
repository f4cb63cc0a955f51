use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expression::Value;
use crate::memory::SharedMemory;

/// Variable environment scoped to one handler execution.
///
/// Seeded with `input` and mutated only by `set`, `call … as`, the implicit
/// `result` bindings, and loop item shadowing.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    /// Creates an environment seeded with the raw runtime input object.
    pub fn seeded(input: Value) -> Self {
        let mut vars = HashMap::new();
        vars.insert("input".to_string(), input);
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Restores a shadowed binding after a loop: `Some` reinstates the prior
    /// value, `None` unbinds the name.
    pub fn restore(&mut self, name: &str, prior: Option<Value>) {
        match prior {
            Some(value) => {
                self.vars.insert(name.to_string(), value);
            }
            None => {
                self.vars.remove(name);
            }
        }
    }
}

/// Per-execution mutable state threaded explicitly through the interpreter.
///
/// Owning this in one value (rather than module-level accumulators) is what
/// makes concurrent independent executions safe.
#[derive(Debug, Default)]
pub struct ExecutionState {
    pub env: Environment,
    pub output: Vec<String>,
    pub steps: Vec<StepRecord>,
}

impl ExecutionState {
    pub fn new(input: Value) -> Self {
        Self {
            env: Environment::seeded(input),
            output: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// The reply text: `say` outputs joined by newline.
    pub fn joined_output(&self) -> String {
        self.output.join("\n")
    }
}

/// One entry of the step trace: statement kind, a redacted summary of its
/// inputs, timing, and outcome. Appended in execution order, error outcomes
/// included, so a failing step is visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub kind: StepKind,
    pub summary: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: StepOutcome,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Say,
    AskAi,
    Set,
    Call,
    If,
    Loop,
    Remember,
    Recall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Ok,
    Error { message: String },
}

impl StepOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, StepOutcome::Ok)
    }
}

/// Externally supplied run metadata. Read by the engine, never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    pub bot_id: String,
    pub run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_name: Option<String>,
}

impl RunMetadata {
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            run_id: Uuid::new_v4().to_string(),
            user_id: None,
            bot_system_prompt: None,
            bot_name: None,
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.bot_system_prompt = Some(prompt.into());
        self
    }
}

/// Externally supplied execution context: run metadata plus the
/// shared-memory handle. The engine reads it and routes memory traffic
/// through it; it never mutates it in place.
#[derive(Clone)]
pub struct ExecutionContext {
    pub metadata: RunMetadata,
    pub shared_memory: Arc<dyn SharedMemory>,
}

impl ExecutionContext {
    pub fn new(metadata: RunMetadata, shared_memory: Arc<dyn SharedMemory>) -> Self {
        Self {
            metadata,
            shared_memory,
        }
    }
}

/// Cloneable cancellation handle checked between statements and before each
/// tool await. Cancelling aborts the execution with `RuntimeError::Cancelled`
/// rather than leaving a tool call un-awaited.
#[derive(Clone, Default)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
