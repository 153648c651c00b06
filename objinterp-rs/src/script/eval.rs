//! Evaluator.
//!
//! Walks the node sequence produced by the parser, left to right. Call
//! arguments are evaluated depth first, each one fully resolved (and awaited)
//! before the next begins, so side-effecting built-ins observe a strict
//! declaration order.

use std::collections::HashMap;

use super::error::ExprError;
use super::parser::Expr;
use super::registry::{BoxFuture, FunctionRegistry, Params};
use super::value::Value;

/// Flat name → value namespace for bare identifiers in argument lists.
#[derive(Debug, Clone)]
pub struct Variables {
    vars: HashMap<String, Value>,
}

impl Default for Variables {
    fn default() -> Self {
        let mut vars = HashMap::new();
        vars.insert("pi".to_owned(), Value::Num(std::f64::consts::PI));
        vars.insert("e".to_owned(), Value::Num(std::f64::consts::E));
        Variables { vars }
    }
}

impl Variables {
    /// The constant namespace: `pi` and `e`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Bind (or rebind) a name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn unset(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }
}

/// One evaluation pass over a parsed string.
pub struct Evaluator<'a> {
    registry: &'a FunctionRegistry,
    variables: &'a Variables,
    params: &'a Params,
}

impl<'a> Evaluator<'a> {
    pub fn new(registry: &'a FunctionRegistry, variables: &'a Variables, params: &'a Params) -> Self {
        Evaluator {
            registry,
            variables,
            params,
        }
    }

    /// Evaluate a top-level node sequence.
    ///
    /// A lone node keeps its type, so `@add(1, 2)` yields a number; any
    /// other sequence is concatenated into a string. Literal text and
    /// numbers at top level are carried through exactly as written.
    pub async fn evaluate(&self, nodes: &[Expr]) -> Result<Value, ExprError> {
        match nodes {
            [] => Ok(Value::default()),
            [Expr::Number(text)] => Ok(Value::Str(text.clone())),
            [only] => self.eval_node(only).await,
            _ => {
                let mut out = String::new();
                for node in nodes {
                    match node {
                        Expr::Text(t) | Expr::Number(t) | Expr::Str(t) => out.push_str(t),
                        other => out.push_str(&self.eval_node(other).await?.as_str()),
                    }
                }
                Ok(Value::Str(out))
            }
        }
    }

    fn eval_node<'s>(&'s self, node: &'s Expr) -> BoxFuture<'s, Result<Value, ExprError>> {
        Box::pin(async move {
            match node {
                Expr::Text(t) | Expr::Str(t) => Ok(Value::Str(t.clone())),
                Expr::Number(t) => Ok(Value::Num(t.parse().unwrap_or(f64::NAN))),
                Expr::Ident(name) => self
                    .variables
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ExprError::UndefinedVariable { name: name.clone() }),
                Expr::Call { name, args } => self.eval_call(name, args).await,
            }
        })
    }

    async fn eval_call(&self, name: &str, arg_nodes: &[Expr]) -> Result<Value, ExprError> {
        let mut args = Vec::with_capacity(arg_nodes.len());
        for node in arg_nodes {
            args.push(self.eval_node(node).await?.unquoted());
        }

        let Some(entry) = self.registry.get(name) else {
            return Err(ExprError::Call {
                function: name.to_owned(),
                args: args.iter().map(Value::as_str).collect(),
                cause: "function is not registered".into(),
            });
        };

        tracing::trace!(function = name, args = args.len(), "call");
        entry.call(&args, self.params).await.map_err(|cause| ExprError::Call {
            function: name.to_owned(),
            args: args.iter().map(Value::as_str).collect(),
            cause,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
