//! # Tool Registry and Dispatcher
//!
//! Maps dotted tool names to injected implementations and invokes them with
//! a per-call timeout. Built once per execution; calls are strictly
//! sequential because later statements depend on earlier `as $x` bindings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::{Tool, ToolArgs, ToolOutput, AI_CAPABILITY, AI_FALLBACK_TOOL};
use crate::eval::context::ExecutionContext;
use crate::eval::evaluator::RuntimeError;

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, for deterministic capability resolution.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Builds a registry from the injected tool slice. The first tool
    /// registered under a name wins; duplicates are logged and ignored.
    pub fn new(tools: &[Arc<dyn Tool>]) -> Self {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        let mut order = Vec::new();
        for tool in tools {
            let name = tool.name().to_string();
            if map.contains_key(&name) {
                warn!("duplicate tool registration ignored: {}", name);
                continue;
            }
            order.push(name.clone());
            map.insert(name, tool.clone());
        }
        Self { tools: map, order }
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Resolves the built-in AI-response capability used by `ask ai`:
    /// the first tool declaring [`AI_CAPABILITY`], else the tool named
    /// [`AI_FALLBACK_TOOL`].
    pub fn ai_responder(&self) -> Option<&Arc<dyn Tool>> {
        self.order
            .iter()
            .find(|name| {
                self.tools
                    .get(*name)
                    .map(|tool| tool.capability() == AI_CAPABILITY)
                    .unwrap_or(false)
            })
            .and_then(|name| self.tools.get(name))
            .or_else(|| self.tools.get(AI_FALLBACK_TOOL))
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invokes a tool, normalizing every failure mode into a
    /// [`RuntimeError`]: elapsed timeout, tool-reported error, and
    /// `success: false` outputs all short-circuit the handler.
    #[tracing::instrument(level = "debug", skip(self, tool, args, context), fields(tool = %tool.name()))]
    pub async fn invoke(
        &self,
        tool: &Arc<dyn Tool>,
        args: ToolArgs,
        context: &ExecutionContext,
        timeout: Duration,
    ) -> Result<ToolOutput, RuntimeError> {
        debug!("invoking tool {} with {} args", tool.name(), args.len());
        match tokio::time::timeout(timeout, tool.run(args, context)).await {
            Err(_) => Err(RuntimeError::Timeout),
            Ok(Err(error)) => Err(RuntimeError::Tool(error.to_string())),
            Ok(Ok(output)) if !output.success => Err(RuntimeError::Tool(output.output)),
            Ok(Ok(output)) => Ok(output),
        }
    }
}
