//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the execution driver.
///
/// Defaults mirror the hosting HTTP layer this engine is embedded in: a 30s
/// overall deadline and a 10s bound per tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound for one tool invocation; clamped to the remaining
    /// overall deadline.
    pub tool_timeout: Duration,
    /// Overall deadline for one `execute` call. `None` disables the bound.
    pub deadline: Option<Duration>,
    /// Reject programs declaring more than one bot instead of executing the
    /// first declaration.
    pub strict_single_bot: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(10),
            deadline: Some(Duration::from_secs(30)),
            strict_single_bot: false,
        }
    }
}
