//! String expansion.
//!
//! Resolves every `@name(args)` island in a string and substitutes the result
//! into the surrounding text:
//!
//! | Input                        | Output (standard registry)  |
//! |------------------------------|-----------------------------|
//! | `plain text`                 | `plain text`                |
//! | `@upper('ab')`               | `AB`                        |
//! | `x=@add(1, 2);`              | `x=3;`                      |
//! | `@concat(@gv('a'), '-')`     | value of param `a`, then `-`|
//! | `mail@example.com`           | `mail@example.com`          |
//!
//! A string that is a single call yields the call's typed value; anything
//! else yields text.

use std::sync::Arc;

use super::error::ExprError;
use super::eval::{Evaluator, Variables};
use super::lexer::{tokenize, SIGIL};
use super::parser::parse;
use super::registry::{FunctionRegistry, Params};
use super::value::Value;

/// Registry plus variable namespace: everything needed to expand a string.
///
/// Cloning is cheap; both halves are shared.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<FunctionRegistry>,
    variables: Arc<Variables>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(FunctionRegistry::standard())
    }
}

impl Engine {
    pub fn new(registry: FunctionRegistry) -> Self {
        Engine {
            registry: Arc::new(registry),
            variables: Arc::new(Variables::new()),
        }
    }

    pub(crate) fn from_parts(registry: Arc<FunctionRegistry>, variables: Arc<Variables>) -> Self {
        Engine { registry, variables }
    }

    /// Replace the identifier namespace (defaults to `pi` and `e`).
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Arc::new(variables);
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Expand `src` against `params`.
    #[tracing::instrument(level = "debug", skip_all, fields(len = src.len()))]
    pub async fn expand(&self, src: &str, params: &Params) -> Result<Value, ExprError> {
        // No sigil, nothing to recognise.
        if !src.contains(SIGIL) {
            return Ok(Value::Str(src.to_owned()));
        }
        let nodes = parse(tokenize(src, &self.registry)?)?;
        Evaluator::new(&self.registry, &self.variables, params)
            .evaluate(&nodes)
            .await
    }
}

/// Expand `src` with `engine`; shorthand for [`Engine::expand`].
pub async fn expand(src: &str, engine: &Engine, params: &Params) -> Result<Value, ExprError> {
    engine.expand(src, params).await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
