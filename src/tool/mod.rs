//! # Tool System
//!
//! Tools are the named external capabilities a bot can invoke: AI completion,
//! email, messaging, CRM, payments. The engine never implements these itself;
//! hosts inject implementations of the [`Tool`] trait and the interpreter
//! dispatches to them through a per-execution [`registry::ToolRegistry`].
//!
//! ## Lifecycle
//!
//! A registry is built once per `execute` call from the injected tool slice
//! and dropped with it; the engine never persists tool instances.
//!
//! ## Capabilities
//!
//! Each tool declares a capability category (e.g. `integrations.notion`).
//! The built-in AI-response capability used by `ask ai` is itself a tool,
//! resolved by the [`AI_CAPABILITY`] category or the [`AI_FALLBACK_TOOL`]
//! name.

pub mod registry;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::eval::context::ExecutionContext;
use crate::eval::expression::Value;

/// Capability category of the built-in AI-response tool.
pub const AI_CAPABILITY: &str = "ai.completion";
/// Conventional tool name used when no tool declares [`AI_CAPABILITY`].
pub const AI_FALLBACK_TOOL: &str = "general.respond";

/// Evaluated, named arguments passed to a tool invocation.
pub type ToolArgs = HashMap<String, Value>;

#[derive(Error, Debug, Clone)]
pub enum ToolError {
    #[error("tool failed: {0}")]
    Execution(String),
    #[error("invalid tool input: {0}")]
    InvalidInput(String),
}

/// An externally supplied named capability.
///
/// Implementations run arbitrary host logic; the engine only requires that
/// invocations are awaited one at a time (later statements depend on earlier
/// bindings) and that failures are reported through the returned output or
/// error rather than panics.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Dotted invocation name, `namespace.verb` (e.g. `email.send`).
    fn name(&self) -> &str;

    /// Capability category string (e.g. `integrations.notion`).
    fn capability(&self) -> &str;

    /// Human-readable description, surfaced to authoring UIs.
    fn description(&self) -> &str;

    /// Executes the tool with evaluated arguments.
    async fn run(&self, args: ToolArgs, context: &ExecutionContext)
        -> Result<ToolOutput, ToolError>;
}

/// Result object returned by a tool run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    pub data: Option<Value>,
}

impl ToolOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: None,
        }
    }

    pub fn ok_with_data(output: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            output: output.into(),
            data: Some(data),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            data: None,
        }
    }

    /// The value bound into the environment by `call … as $x` and `ask ai`:
    /// the full result object, fields reachable via property access.
    pub fn into_value(self) -> Value {
        let mut map = HashMap::new();
        map.insert("success".to_string(), Value::Bool(self.success));
        map.insert("output".to_string(), Value::String(self.output));
        if let Some(data) = self.data {
            map.insert("data".to_string(), data);
        }
        Value::Map(map)
    }
}
