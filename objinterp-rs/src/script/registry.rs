//! Function registry.
//!
//! Maps a lowercase function name to a callable. The tokenizer consults it to
//! decide whether `@name` is a call island at all, the evaluator dispatches
//! through it. A registry is an ordinary value: build one, hand it to an
//! [`Engine`](super::Engine), and as many independent registries as needed can
//! live side by side.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value as Json};

use super::value::Value;

/// Flat, string-keyed substitution values visible to the lookup built-ins.
pub type Params = Map<String, Json>;

/// Boxed future returned by every callable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a callable produces: a value, or a human-readable failure cause.
pub type CallResult = Result<Value, String>;

/// A callable registered under a name.
///
/// `params` is `Some` only for entries registered with the parameter
/// capability; everything else sees `None`.
pub trait Function: Send + Sync {
    fn call<'a>(&'a self, args: &'a [Value], params: Option<&'a Params>) -> BoxFuture<'a, CallResult>;
}

struct SyncFn<F>(F);

impl<F> Function for SyncFn<F>
where
    F: Fn(&[Value]) -> CallResult + Send + Sync,
{
    fn call<'a>(&'a self, args: &'a [Value], _params: Option<&'a Params>) -> BoxFuture<'a, CallResult> {
        Box::pin(std::future::ready((self.0)(args)))
    }
}

struct ParamsFn<F>(F);

impl<F> Function for ParamsFn<F>
where
    F: Fn(&[Value], &Params) -> CallResult + Send + Sync,
{
    fn call<'a>(&'a self, args: &'a [Value], params: Option<&'a Params>) -> BoxFuture<'a, CallResult> {
        let out = match params {
            Some(p) => (self.0)(args, p),
            None => (self.0)(args, &Params::new()),
        };
        Box::pin(std::future::ready(out))
    }
}

struct AsyncFn<F>(F);

impl<F, Fut> Function for AsyncFn<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = CallResult> + Send + 'static,
{
    fn call<'a>(&'a self, args: &'a [Value], _params: Option<&'a Params>) -> BoxFuture<'a, CallResult> {
        Box::pin((self.0)(args.to_vec()))
    }
}

/// One registry slot.
#[derive(Clone)]
pub struct Entry {
    function: Arc<dyn Function>,
    wants_params: bool,
}

impl Entry {
    /// Whether the evaluator must hand this callable the active parameters.
    pub fn wants_params(&self) -> bool {
        self.wants_params
    }

    pub fn call<'a>(&'a self, args: &'a [Value], params: &'a Params) -> BoxFuture<'a, CallResult> {
        let params = self.wants_params.then_some(params);
        self.function.call(args, params)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("wants_params", &self.wants_params)
            .finish_non_exhaustive()
    }
}

/// Name → callable table.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    entries: HashMap<String, Entry>,
}

impl FunctionRegistry {
    /// An empty registry: no `@name` is special.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the standard library in
    /// [`builtins`](super::builtins).
    pub fn standard() -> Self {
        let mut registry = Self::new();
        super::builtins::install(&mut registry);
        registry
    }

    /// Register a synchronous callable.
    pub fn register<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> CallResult + Send + Sync + 'static,
    {
        self.register_function(name, Arc::new(SyncFn(f)), false)
    }

    /// Register a synchronous callable that reads the active parameters.
    pub fn register_with_params<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&[Value], &Params) -> CallResult + Send + Sync + 'static,
    {
        self.register_function(name, Arc::new(ParamsFn(f)), true)
    }

    /// Register an asynchronous callable. The evaluator awaits it before
    /// moving on to the next sibling.
    pub fn register_async<F, Fut>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallResult> + Send + 'static,
    {
        self.register_function(name, Arc::new(AsyncFn(f)), false)
    }

    /// Register an arbitrary [`Function`] implementation. Re-registering a
    /// name replaces the previous entry.
    pub fn register_function(
        &mut self,
        name: &str,
        function: Arc<dyn Function>,
        wants_params: bool,
    ) -> &mut Self {
        self.entries.insert(
            name.to_lowercase(),
            Entry {
                function,
                wants_params,
            },
        );
        self
    }

    /// Look up an entry by (already lowercased) name.
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// Case-insensitive membership test used by the tokenizer.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name) || self.entries.contains_key(&name.to_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(&name.to_lowercase()).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
