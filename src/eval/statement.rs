use std::time::Instant;

use async_recursion::async_recursion;
use chrono::Utc;
use tracing::debug;

use super::context::{ExecutionState, StepKind, StepOutcome, StepRecord};
use super::evaluator::{EvalResult, EvalScope, RuntimeError};
use super::expression::{as_bool, display_text, ExpressionEvaluator, Value};
use crate::ast::{Expr, Statement, Statements};
use crate::tool::ToolArgs;

/// Longest prefix of a value kept in a step summary.
const SUMMARY_PREVIEW_CHARS: usize = 64;

/// Statement evaluator: dispatches statements, records one step per
/// executed statement, and fails fast on the first runtime error.
#[derive(Default)]
pub struct StatementEvaluator {
    pub expression_evaluator: ExpressionEvaluator,
}

impl StatementEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn eval_block(
        &self,
        statements: &Statements,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<()> {
        for statement in statements {
            scope.ensure_active()?;
            self.eval_statement(statement, state, scope).await?;
        }
        Ok(())
    }

    #[async_recursion]
    pub async fn eval_statement<'a>(
        &'a self,
        statement: &'a Statement,
        state: &'a mut ExecutionState,
        scope: &'a EvalScope<'a>,
    ) -> EvalResult<()> {
        match statement {
            // Control flow records its step before the body runs, so the
            // trace reads in execution order.
            Statement::If {
                condition,
                then_body,
                else_body,
            } => self.eval_if(condition, then_body, else_body, state, scope).await,
            Statement::Loop {
                item,
                collection,
                body,
            } => self.eval_loop(item, collection, body, state, scope).await,
            simple => {
                let started = Instant::now();
                let started_at = Utc::now();
                let kind = step_kind(simple);
                let result = self.eval_simple(simple, state, scope).await;
                match result {
                    Ok(summary) => {
                        state.steps.push(StepRecord {
                            kind,
                            summary,
                            started_at,
                            duration_ms: started.elapsed().as_millis() as u64,
                            outcome: StepOutcome::Ok,
                        });
                        Ok(())
                    }
                    Err(error) => {
                        state.steps.push(StepRecord {
                            kind,
                            summary: fallback_summary(simple),
                            started_at,
                            duration_ms: started.elapsed().as_millis() as u64,
                            outcome: StepOutcome::Error {
                                message: error.to_string(),
                            },
                        });
                        Err(error)
                    }
                }
            }
        }
    }

    async fn eval_simple(
        &self,
        statement: &Statement,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        match statement {
            Statement::Say(expr) => self.eval_say(expr, state, scope).await,
            Statement::AskAi { prompt, model } => {
                self.eval_ask_ai(prompt, model.as_deref(), state, scope).await
            }
            Statement::Set { var, value } => self.eval_set(var, value, state, scope).await,
            Statement::Call {
                tool,
                args,
                bind_as,
            } => {
                self.eval_call(tool, args, bind_as.as_deref(), state, scope)
                    .await
            }
            Statement::Remember { key, value } => {
                self.eval_remember(key, value, state, scope).await
            }
            Statement::Recall { key } => self.eval_recall(key, state, scope).await,
            Statement::If { .. } | Statement::Loop { .. } => {
                unreachable!("control flow handled in eval_statement")
            }
        }
    }

    async fn eval_say(
        &self,
        expr: &Expr,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let value = self
            .expression_evaluator
            .eval(expr, &state.env, scope)
            .await?;
        let text = display_text(&value);
        let summary = preview(&text);
        state.output.push(text);
        Ok(summary)
    }

    async fn eval_ask_ai(
        &self,
        prompt: &Expr,
        model: Option<&str>,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let prompt_value = self
            .expression_evaluator
            .eval(prompt, &state.env, scope)
            .await?;
        let prompt_text = display_text(&prompt_value);
        let summary = format!("ask ai {:?}", preview(&prompt_text));

        let tool = scope.ai_responder()?;
        let mut args = ToolArgs::new();
        args.insert("prompt".to_string(), Value::String(prompt_text));
        if let Some(model) = model {
            args.insert("model".to_string(), Value::String(model.to_string()));
        }
        if let Some(system_prompt) = &scope.context.metadata.bot_system_prompt {
            args.insert(
                "system_prompt".to_string(),
                Value::String(system_prompt.clone()),
            );
        }

        scope.ensure_active()?;
        let output = scope
            .registry
            .invoke(&tool, args, scope.context, scope.remaining_tool_timeout())
            .await?;
        state.env.set("result", output.into_value());
        Ok(summary)
    }

    async fn eval_set(
        &self,
        var: &str,
        value: &Expr,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let value = self
            .expression_evaluator
            .eval(value, &state.env, scope)
            .await?;
        debug!(var, kind = value.type_name(), "set variable");
        state.env.set(var, value);
        Ok(format!("set ${}", var))
    }

    async fn eval_call(
        &self,
        tool_name: &str,
        args: &[(String, Expr)],
        bind_as: Option<&str>,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let tool = scope
            .registry
            .resolve(tool_name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownTool(tool_name.to_string()))?;

        // Argument values are redacted from the trace; keys are enough to
        // identify the call shape.
        let keys: Vec<&str> = args.iter().map(|(name, _)| name.as_str()).collect();
        let summary = format!("call {} with {{{}}}", tool_name, keys.join(", "));

        let mut evaluated = ToolArgs::new();
        for (name, expr) in args {
            let value = self
                .expression_evaluator
                .eval(expr, &state.env, scope)
                .await?;
            evaluated.insert(name.clone(), value);
        }

        scope.ensure_active()?;
        let output = scope
            .registry
            .invoke(&tool, evaluated, scope.context, scope.remaining_tool_timeout())
            .await?;
        state
            .env
            .set(bind_as.unwrap_or("result"), output.into_value());
        Ok(summary)
    }

    async fn eval_if(
        &self,
        condition: &Expr,
        then_body: &Statements,
        else_body: &Option<Statements>,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<()> {
        let started = Instant::now();
        let started_at = Utc::now();
        let matched = match self
            .expression_evaluator
            .eval(condition, &state.env, scope)
            .await
            .and_then(as_bool)
        {
            Ok(matched) => {
                state.steps.push(StepRecord {
                    kind: StepKind::If,
                    summary: format!("if -> {}", matched),
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                    outcome: StepOutcome::Ok,
                });
                matched
            }
            Err(error) => {
                state.steps.push(StepRecord {
                    kind: StepKind::If,
                    summary: "if".to_string(),
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                    outcome: StepOutcome::Error {
                        message: error.to_string(),
                    },
                });
                return Err(error);
            }
        };

        if matched {
            self.eval_block(then_body, state, scope).await
        } else if let Some(else_body) = else_body {
            self.eval_block(else_body, state, scope).await
        } else {
            Ok(())
        }
    }

    async fn eval_loop(
        &self,
        item: &str,
        collection: &Expr,
        body: &Statements,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<()> {
        let started = Instant::now();
        let started_at = Utc::now();
        let items = match self
            .expression_evaluator
            .eval(collection, &state.env, scope)
            .await
        {
            Ok(Value::List(items)) => {
                state.steps.push(StepRecord {
                    kind: StepKind::Loop,
                    summary: format!("loop ${} over {} item(s)", item, items.len()),
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                    outcome: StepOutcome::Ok,
                });
                items
            }
            Ok(other) => {
                let error = RuntimeError::Type {
                    expected: "list".to_string(),
                    found: other.type_name().to_string(),
                };
                state.steps.push(StepRecord {
                    kind: StepKind::Loop,
                    summary: format!("loop ${}", item),
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                    outcome: StepOutcome::Error {
                        message: error.to_string(),
                    },
                });
                return Err(error);
            }
            Err(error) => {
                state.steps.push(StepRecord {
                    kind: StepKind::Loop,
                    summary: format!("loop ${}", item),
                    started_at,
                    duration_ms: started.elapsed().as_millis() as u64,
                    outcome: StepOutcome::Error {
                        message: error.to_string(),
                    },
                });
                return Err(error);
            }
        };

        // Shadow the item variable per iteration; the prior binding (if any)
        // is restored even when the body fails.
        let prior = state.env.get(item).cloned();
        let mut result = Ok(());
        for element in items {
            state.env.set(item, element);
            if let Err(error) = self.eval_block(body, state, scope).await {
                result = Err(error);
                break;
            }
        }
        state.env.restore(item, prior);
        result
    }

    async fn eval_remember(
        &self,
        key: &Expr,
        value: &Expr,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let key_value = self
            .expression_evaluator
            .eval(key, &state.env, scope)
            .await?;
        let key_text = display_text(&key_value);
        let value = self
            .expression_evaluator
            .eval(value, &state.env, scope)
            .await?;
        scope.memory.set(&key_text, value).await?;
        Ok(format!("remember {:?}", key_text))
    }

    async fn eval_recall(
        &self,
        key: &Expr,
        state: &mut ExecutionState,
        scope: &EvalScope<'_>,
    ) -> EvalResult<String> {
        let key_value = self
            .expression_evaluator
            .eval(key, &state.env, scope)
            .await?;
        let key_text = display_text(&key_value);
        let stored = scope.memory.get(&key_text).await?.unwrap_or(Value::Null);
        state.env.set("result", stored);
        Ok(format!("recall {:?}", key_text))
    }
}

fn step_kind(statement: &Statement) -> StepKind {
    match statement {
        Statement::Say(_) => StepKind::Say,
        Statement::AskAi { .. } => StepKind::AskAi,
        Statement::Set { .. } => StepKind::Set,
        Statement::Call { .. } => StepKind::Call,
        Statement::If { .. } => StepKind::If,
        Statement::Loop { .. } => StepKind::Loop,
        Statement::Remember { .. } => StepKind::Remember,
        Statement::Recall { .. } => StepKind::Recall,
    }
}

/// Summary used when a statement fails before its inputs were evaluated.
fn fallback_summary(statement: &Statement) -> String {
    match statement {
        Statement::Say(_) => "say".to_string(),
        Statement::AskAi { .. } => "ask ai".to_string(),
        Statement::Set { var, .. } => format!("set ${}", var),
        Statement::Call { tool, .. } => format!("call {}", tool),
        Statement::Remember { .. } => "remember".to_string(),
        Statement::Recall { .. } => "recall".to_string(),
        Statement::If { .. } => "if".to_string(),
        Statement::Loop { item, .. } => format!("loop ${}", item),
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= SUMMARY_PREVIEW_CHARS {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{}…", truncated)
    }
}
