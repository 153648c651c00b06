//! Error types for expansion and tree interpretation.

use std::fmt;

use serde_json::{Map, Value as Json};

/// Failure while tokenizing, parsing or evaluating a single string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("lex error at offset {offset}: {message}")]
    Lex { message: String, offset: usize },

    #[error("syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("{name} is undefined")]
    UndefinedVariable { name: String },

    #[error("@{function}({}) failed: {cause}", .args.join(", "))]
    Call {
        function: String,
        args: Vec<String>,
        cause: String,
    },
}

impl ExprError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        ExprError::Syntax {
            message: message.into(),
            offset,
        }
    }
}

/// Identifier of the chain or process a parameter object belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    Chain(String),
    Process(String),
}

impl Correlation {
    /// `CHAIN_ID` wins over `PROCESS_ID` when both are present.
    pub fn from_params(params: &Map<String, Json>) -> Option<Self> {
        let id = |key: &str| {
            params.get(key).filter(|v| !v.is_null()).map(|v| match v {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            })
        };
        id("CHAIN_ID")
            .map(Correlation::Chain)
            .or_else(|| id("PROCESS_ID").map(Correlation::Process))
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correlation::Chain(id) => write!(f, "CHAIN: {id}"),
            Correlation::Process(id) => write!(f, "PROCESS: {id}"),
        }
    }
}

fn correlation_prefix(correlation: &Option<Correlation>) -> String {
    correlation
        .as_ref()
        .map(|c| format!("{c}: "))
        .unwrap_or_default()
}

/// An [`ExprError`] enriched with the string that raised it and, when the
/// surrounding parameters carry one, the chain/process identifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Interpreter: {}{source} IN: {input}", correlation_prefix(.correlation))]
pub struct InterpretError {
    pub input: String,
    pub correlation: Option<Correlation>,
    #[source]
    pub source: ExprError,
}

impl InterpretError {
    pub fn new(input: impl Into<String>, correlation: Option<Correlation>, source: ExprError) -> Self {
        InterpretError {
            input: input.into(),
            correlation,
            source,
        }
    }

    /// The underlying expansion failure.
    pub fn cause(&self) -> &ExprError {
        &self.source
    }
}

/// Error returned by [`Interpreter::interpret_blocking`](super::Interpreter::interpret_blocking).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Interpret(#[from] InterpretError),

    #[error("cannot start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
