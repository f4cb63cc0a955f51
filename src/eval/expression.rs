use core::fmt;
use std::collections::HashMap;

use async_recursion::async_recursion;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::context::Environment;
use super::evaluator::{EvalResult, EvalScope, RuntimeError};
use crate::ast::{Expr, Literal, TemplateSegment};

/// Runtime value type.
///
/// Arrays and objects are immutable once bound: `set` rebinds the name, it
/// never mutates in place.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    #[default]
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Null => "null",
        }
    }

    /// Explicit, fallible field lookup for `result.output`-style access.
    pub fn field(&self, name: &str) -> Result<Value, PropertyError> {
        match self {
            Value::Map(map) => map.get(name).cloned().ok_or_else(|| {
                PropertyError::MissingField {
                    field: name.to_string(),
                }
            }),
            other => Err(PropertyError::NotAnObject {
                field: name.to_string(),
                actual: other.type_name(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    write!(f, "{}", item)?;
                    if i < items.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    write!(f, "{}: {}", key, value)?;
                    if i < map.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "}}")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropertyError {
    #[error("field {field:?} not found on object")]
    MissingField { field: String },
    #[error("cannot access field {field:?} on {actual}")]
    NotAnObject {
        field: String,
        actual: &'static str,
    },
}

/// Renders a value the way `say` and template holes display it: strings
/// verbatim, everything else via `Display`.
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerces a value to a boolean, the only truthiness the engine accepts.
pub(crate) fn as_bool(value: Value) -> EvalResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::Type {
            expected: "bool".to_string(),
            found: other.type_name().to_string(),
        }),
    }
}

#[derive(Default)]
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self
    }

    #[async_recursion]
    pub async fn eval<'a>(
        &'a self,
        expr: &'a Expr,
        env: &'a Environment,
        scope: &'a EvalScope<'a>,
    ) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Self::eval_literal(literal)),
            Expr::Variable(name) => self.eval_variable(name, env, scope).await,
            Expr::PropAccess { base, path } => {
                let mut value = self.eval(base, env, scope).await?;
                for segment in path {
                    value = value.field(segment)?;
                }
                Ok(value)
            }
            Expr::Template(segments) => self.eval_template(segments, env, scope).await,
            Expr::Contains(left, right) => {
                let haystack = search_text(&self.eval(left, env, scope).await?);
                match self.eval(right, env, scope).await? {
                    Value::String(needle) => Ok(Value::Bool(haystack.contains(&needle))),
                    other => Err(RuntimeError::Type {
                        expected: "string".to_string(),
                        found: other.type_name().to_string(),
                    }),
                }
            }
            Expr::Equals(left, right) => {
                let left = self.eval(left, env, scope).await?;
                let right = self.eval(right, env, scope).await?;
                Ok(Value::Bool(left == right))
            }
            Expr::Not(inner) => {
                let value = as_bool(self.eval(inner, env, scope).await?)?;
                Ok(Value::Bool(!value))
            }
            // and/or short-circuit left to right
            Expr::And(left, right) => {
                if !as_bool(self.eval(left, env, scope).await?)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(as_bool(self.eval(right, env, scope).await?)?))
            }
            Expr::Or(left, right) => {
                if as_bool(self.eval(left, env, scope).await?)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(as_bool(self.eval(right, env, scope).await?)?))
            }
        }
    }

    fn eval_literal(literal: &Literal) -> Value {
        match literal {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => Value::Number(*n),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::List(items) => {
                Value::List(items.iter().map(Self::eval_literal).collect())
            }
        }
    }

    /// Environment lookup with memory-block fallthrough: a name declared in
    /// one of the bot's memory blocks reads through the bridge under its
    /// scoped key when it is not bound locally.
    async fn eval_variable(
        &self,
        name: &str,
        env: &Environment,
        scope: &EvalScope<'_>,
    ) -> EvalResult<Value> {
        if let Some(value) = env.get(name) {
            return Ok(value.clone());
        }
        if let Some(key) = scope.memory_key(name) {
            let stored = scope.memory.get(&key).await?;
            return Ok(stored.unwrap_or(Value::Null));
        }
        Err(RuntimeError::UnboundVariable(name.to_string()))
    }

    async fn eval_template(
        &self,
        segments: &[TemplateSegment],
        env: &Environment,
        scope: &EvalScope<'_>,
    ) -> EvalResult<Value> {
        let mut rendered = String::new();
        for segment in segments {
            match segment {
                TemplateSegment::Literal(text) => rendered.push_str(text),
                TemplateSegment::Hole(expr) => {
                    let value = self.eval(expr, env, scope).await?;
                    rendered.push_str(&display_text(&value));
                }
            }
        }
        Ok(Value::String(rendered))
    }
}

/// Coerces the left operand of `contains` to searchable text.
///
/// The observed host supplies input objects shaped `{task, message}` or
/// `{input}`; those fields are the natural search targets when the operand
/// is a map.
fn search_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Map(map) => ["input", "message", "text"]
            .iter()
            .find_map(|key| map.get(*key))
            .map(display_text)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::ast::{BotDecl, BotKind, MemoryBlock, MemoryScope, MemoryVarDecl};
    use crate::eval::context::{CancelSignal, ExecutionContext, RunMetadata};
    use crate::memory::{InMemorySharedMemory, MemoryBridge, SharedMemory};
    use crate::tool::registry::ToolRegistry;

    fn test_bot() -> BotDecl {
        BotDecl {
            name: "Test".to_string(),
            kind: BotKind::Bot,
            description: None,
            memory: vec![MemoryBlock {
                scope: MemoryScope::Session,
                vars: vec![MemoryVarDecl {
                    name: "visits".to_string(),
                    type_name: "number".to_string(),
                }],
            }],
            tools: vec![],
            handlers: vec![],
        }
    }

    struct Fixture {
        registry: ToolRegistry,
        memory: MemoryBridge,
        context: ExecutionContext,
        bot: BotDecl,
        backend: Arc<InMemorySharedMemory>,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(InMemorySharedMemory::new());
        let shared: Arc<dyn SharedMemory> = backend.clone();
        Fixture {
            registry: ToolRegistry::new(&[]),
            memory: MemoryBridge::new(shared.clone()),
            context: ExecutionContext::new(RunMetadata::new("bot-1"), shared),
            bot: test_bot(),
            backend,
        }
    }

    impl Fixture {
        fn scope(&self) -> EvalScope<'_> {
            EvalScope {
                registry: &self.registry,
                memory: &self.memory,
                context: &self.context,
                bot: &self.bot,
                cancel: CancelSignal::default(),
                deadline: None,
                tool_timeout: Duration::from_secs(1),
            }
        }
    }

    #[test]
    fn test_number_display_drops_integral_fraction() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(Value::Number(-3.0).to_string(), "-3");
    }

    #[test]
    fn test_field_lookup() {
        let mut map = HashMap::new();
        map.insert("output".to_string(), Value::String("done".to_string()));
        let value = Value::Map(map);
        assert_eq!(
            value.field("output").unwrap(),
            Value::String("done".to_string())
        );
        assert_eq!(
            value.field("missing"),
            Err(PropertyError::MissingField {
                field: "missing".to_string()
            })
        );
        assert_eq!(
            Value::Number(1.0).field("x"),
            Err(PropertyError::NotAnObject {
                field: "x".to_string(),
                actual: "number"
            })
        );
    }

    #[tokio::test]
    async fn test_variable_and_unbound() {
        let fixture = fixture();
        let scope = fixture.scope();
        let mut env = Environment::default();
        env.set("x", Value::Number(42.0));

        let evaluator = ExpressionEvaluator::new();
        let value = evaluator
            .eval(&Expr::Variable("x".to_string()), &env, &scope)
            .await
            .unwrap();
        assert_eq!(value, Value::Number(42.0));

        let error = evaluator
            .eval(&Expr::Variable("missing".to_string()), &env, &scope)
            .await;
        assert!(matches!(error, Err(RuntimeError::UnboundVariable(_))));
    }

    #[tokio::test]
    async fn test_memory_block_fallthrough() {
        let fixture = fixture();
        fixture
            .backend
            .set("session:bot-1:visits", Value::Number(7.0))
            .await
            .unwrap();
        let scope = fixture.scope();
        let env = Environment::default();

        let evaluator = ExpressionEvaluator::new();
        let value = evaluator
            .eval(&Expr::Variable("visits".to_string()), &env, &scope)
            .await
            .unwrap();
        assert_eq!(value, Value::Number(7.0));
    }

    #[tokio::test]
    async fn test_declared_but_unset_memory_var_is_null() {
        let fixture = fixture();
        let scope = fixture.scope();
        let env = Environment::default();

        let evaluator = ExpressionEvaluator::new();
        let value = evaluator
            .eval(&Expr::Variable("visits".to_string()), &env, &scope)
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_contains_on_input_map() {
        let fixture = fixture();
        let scope = fixture.scope();
        let mut input = HashMap::new();
        input.insert(
            "input".to_string(),
            Value::String("let's quiz".to_string()),
        );
        let env = Environment::seeded(Value::Map(input));

        let evaluator = ExpressionEvaluator::new();
        let expr = Expr::Contains(
            Box::new(Expr::Variable("input".to_string())),
            Box::new(Expr::Literal(Literal::String("quiz".to_string()))),
        );
        assert_eq!(
            evaluator.eval(&expr, &env, &scope).await.unwrap(),
            Value::Bool(true)
        );

        let expr = Expr::Contains(
            Box::new(Expr::Variable("input".to_string())),
            Box::new(Expr::Literal(Literal::String("hello".to_string()))),
        );
        assert_eq!(
            evaluator.eval(&expr, &env, &scope).await.unwrap(),
            Value::Bool(false)
        );
    }

    #[tokio::test]
    async fn test_short_circuit_or_skips_right() {
        let fixture = fixture();
        let scope = fixture.scope();
        let env = Environment::default();

        // Right operand is unbound; or must not evaluate it.
        let expr = Expr::Or(
            Box::new(Expr::Literal(Literal::Bool(true))),
            Box::new(Expr::Variable("boom".to_string())),
        );
        let evaluator = ExpressionEvaluator::new();
        assert_eq!(
            evaluator.eval(&expr, &env, &scope).await.unwrap(),
            Value::Bool(true)
        );
    }

    #[tokio::test]
    async fn test_template_render() {
        let fixture = fixture();
        let scope = fixture.scope();
        let mut env = Environment::default();
        env.set("x", Value::Number(2.0));

        let expr = Expr::Template(vec![
            TemplateSegment::Literal("item ".to_string()),
            TemplateSegment::Hole(Expr::Variable("x".to_string())),
        ]);
        let evaluator = ExpressionEvaluator::new();
        assert_eq!(
            evaluator.eval(&expr, &env, &scope).await.unwrap(),
            Value::String("item 2".to_string())
        );
    }

    #[tokio::test]
    async fn test_not_requires_bool() {
        let fixture = fixture();
        let scope = fixture.scope();
        let env = Environment::default();

        let expr = Expr::Not(Box::new(Expr::Literal(Literal::Number(1.0))));
        let evaluator = ExpressionEvaluator::new();
        assert!(matches!(
            evaluator.eval(&expr, &env, &scope).await,
            Err(RuntimeError::Type { .. })
        ));
    }
}
