//! Tree interpreter.
//!
//! The [`Interpreter`] applies string expansion to every string in a JSON
//! value, keys included, and returns a value of the same shape. Before the
//! walk it builds the parameter mapping the lookup built-ins see:
//!
//! 1. the caller's local parameters, themselves interpreted first so that a
//!    parameter may be defined in terms of globals;
//! 2. the resolved global values layered underneath (local keys win).
//!
//! Both steps happen once per local-parameter object per call; every node of
//! the walk reuses the cached result.
//!
//! Every interpreter also binds `@forof(list, template)`, which interprets
//! `template` once per element of `list` with that element as the local
//! parameters, and yields the results as an array.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::{Map, Value as Json};

use crate::config::{Config, InterpretOptions};

use super::error::{Correlation, Error, InterpretError};
use super::eval::Variables;
use super::expand::Engine;
use super::globals::{layer, GlobalValues};
use super::registry::{BoxFuture, CallResult, Function, FunctionRegistry, Params};
use super::value::Value;

/// Expands a JSON tree against layered local and global parameters.
///
/// Clones share the engine and the global value store, so globals merged
/// through one handle are visible through all of them.
#[derive(Debug, Clone)]
pub struct Interpreter {
    engine: Engine,
    globals: Arc<RwLock<GlobalValues>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter over the standard function library.
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::standard())
    }

    /// An interpreter over `registry`. `forof` is added unless the registry
    /// already defines it.
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self::with_variables(registry, Variables::new())
    }

    pub fn with_variables(mut registry: FunctionRegistry, variables: Variables) -> Self {
        let globals: Arc<RwLock<GlobalValues>> = Arc::default();
        let variables = Arc::new(variables);
        let registry = Arc::new_cyclic(|this: &Weak<FunctionRegistry>| {
            if !registry.contains("forof") {
                let forof = ForOf {
                    registry: Weak::clone(this),
                    variables: Arc::clone(&variables),
                    globals: Arc::clone(&globals),
                };
                registry.register_function("forof", Arc::new(forof), false);
            }
            registry
        });
        Interpreter {
            engine: Engine::from_parts(registry, variables),
            globals,
        }
    }

    /// An interpreter whose global store starts with `config.global_values`.
    pub fn from_config(config: &Config) -> Self {
        let interp = Self::new();
        if let Some(values) = &config.global_values {
            interp.merge_globals(values);
        }
        interp
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// A snapshot of the current global values.
    pub fn globals(&self) -> GlobalValues {
        self.globals.read().clone()
    }

    pub fn merge_globals(&self, values: &Json) {
        self.globals.write().merge(values);
    }

    pub fn clear_globals(&self) {
        self.globals.write().clear();
    }

    /// Interpret `value`.
    ///
    /// `new_globals` is merged into the shared store before anything else,
    /// unless `options.ignore_global_values` is set, in which case the store
    /// is neither updated nor consulted. A value larger than
    /// `options.max_size` is returned as is.
    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn interpret(
        &self,
        value: &Json,
        local: Option<&Params>,
        options: &InterpretOptions,
        new_globals: Option<&Json>,
    ) -> Result<Json, InterpretError> {
        if options.exceeds_max_size(value) {
            tracing::debug!(max_size = ?options.max_size, "value over size limit, returned unchanged");
            return Ok(value.clone());
        }

        let globals = if options.ignore_global_values {
            None
        } else {
            let mut store = self.globals.write();
            if let Some(values) = new_globals {
                store.merge(values);
            }
            Some(store.clone())
        };

        let empty = Params::new();
        let scope = Scope::new(local.unwrap_or(&empty));
        let mut frame = Frame {
            engine: &self.engine,
            globals,
            options,
            cache: HashMap::new(),
        };
        frame.walk(value, &scope).await
    }

    /// [`interpret`](Self::interpret) on a private current-thread runtime,
    /// for callers outside async code. Must not be called from within a
    /// runtime.
    pub fn interpret_blocking(
        &self,
        value: &Json,
        local: Option<&Params>,
        options: &InterpretOptions,
        new_globals: Option<&Json>,
    ) -> Result<Json, Error> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        Ok(rt.block_on(self.interpret(value, local, options, new_globals))?)
    }
}

// ── Call frame ────────────────────────────────────────────────────────────────

/// Local parameters of one walk, with their cache key and correlation id.
struct Scope<'p> {
    local: &'p Params,
    key: u64,
    correlation: Option<Correlation>,
}

impl<'p> Scope<'p> {
    fn new(local: &'p Params) -> Self {
        Scope {
            local,
            key: fingerprint(local),
            correlation: Correlation::from_params(local),
        }
    }
}

/// Content hash of a parameter object; the memo key.
fn fingerprint(params: &Params) -> u64 {
    let mut h = DefaultHasher::new();
    params.len().hash(&mut h);
    for (key, value) in params {
        key.hash(&mut h);
        value.to_string().hash(&mut h);
    }
    h.finish()
}

/// State owned by one top-level `interpret` call.
struct Frame<'a> {
    engine: &'a Engine,
    /// Snapshot of the global store; `None` when globals are ignored.
    globals: Option<GlobalValues>,
    options: &'a InterpretOptions,
    /// Layered parameters per local-parameter fingerprint.
    cache: HashMap<u64, Arc<Params>>,
}

impl<'a> Frame<'a> {
    fn walk<'s>(&'s mut self, value: &'s Json, scope: &'s Scope<'s>) -> BoxFuture<'s, Result<Json, InterpretError>> {
        Box::pin(async move {
            match value {
                Json::String(s) => {
                    let params = self.params(scope).await?;
                    Ok(self.expand(s, &params, scope).await?.into_json())
                }
                Json::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for item in items {
                        out.push(self.walk(item, scope).await?);
                    }
                    Ok(Json::Array(out))
                }
                Json::Object(map) => {
                    let params = self.params(scope).await?;
                    let mut out = Map::with_capacity(map.len());
                    for (key, item) in map {
                        let item = self.walk(item, scope).await?;
                        let key = self.expand(key, &params, scope).await?.to_string();
                        out.insert(key, item);
                    }
                    Ok(Json::Object(out))
                }
                other => Ok(other.clone()),
            }
        })
    }

    /// The layered parameters for `scope`, computed at most once per frame.
    async fn params(&mut self, scope: &Scope<'_>) -> Result<Arc<Params>, InterpretError> {
        if let Some(hit) = self.cache.get(&scope.key) {
            return Ok(Arc::clone(hit));
        }

        let local = self.resolve_local(scope.local).await?;
        let layered = match &self.globals {
            Some(globals) => layer(globals.resolve(self.engine, &local).await?, &local),
            None => local,
        };
        tracing::trace!(params = layered.len(), "parameters resolved");

        let layered = Arc::new(layered);
        self.cache.insert(scope.key, Arc::clone(&layered));
        Ok(layered)
    }

    /// Interpret the local parameter object itself, against no local
    /// parameters of its own.
    async fn resolve_local(&mut self, local: &Params) -> Result<Params, InterpretError> {
        let tree = Json::Object(local.clone());
        if local.is_empty() || self.options.exceeds_max_size(&tree) {
            return Ok(local.clone());
        }
        let empty = Params::new();
        let inner = Scope::new(&empty);
        match self.walk(&tree, &inner).await? {
            Json::Object(resolved) => Ok(resolved),
            // An object always walks to an object.
            _ => Ok(local.clone()),
        }
    }

    async fn expand(&self, src: &str, params: &Params, scope: &Scope<'_>) -> Result<Value, InterpretError> {
        self.engine
            .expand(src, params)
            .await
            .map_err(|e| InterpretError::new(src, scope.correlation.clone(), e))
    }
}

// ── forof ─────────────────────────────────────────────────────────────────────

/// `@forof(list, template)`. Holds the registry weakly: the registry owns
/// this entry.
struct ForOf {
    registry: Weak<FunctionRegistry>,
    variables: Arc<Variables>,
    globals: Arc<RwLock<GlobalValues>>,
}

impl Function for ForOf {
    fn call<'a>(&'a self, args: &'a [Value], _params: Option<&'a Params>) -> BoxFuture<'a, CallResult> {
        Box::pin(self.run(args))
    }
}

impl ForOf {
    async fn run(&self, args: &[Value]) -> CallResult {
        let items = match args.first() {
            Some(Value::Json(Json::Array(items))) => items,
            other => {
                let got = other.map(Value::as_str).unwrap_or_default();
                return Err(format!("forof: invalid array -> {got}"));
            }
        };
        // A string template may be serialized JSON; otherwise it is used as is.
        let template = match args.get(1) {
            Some(Value::Str(s)) => serde_json::from_str(s).unwrap_or_else(|_| Json::String(s.clone())),
            Some(other) => other.clone().into_json(),
            None => Json::Null,
        };
        if template.is_null() {
            return Err("forof: null template".into());
        }

        let registry = self.registry.upgrade().ok_or("forof: registry dropped")?;
        let interp = Interpreter {
            engine: Engine::from_parts(registry, Arc::clone(&self.variables)),
            globals: Arc::clone(&self.globals),
        };
        let options = InterpretOptions::default();
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let Json::Object(local) = item else {
                return Err(format!("forof: element {i} is not an object: {item}"));
            };
            let value = interp
                .interpret(&template, Some(local), &options, None)
                .await
                .map_err(|e| format!("forof: {e}"))?;
            out.push(value);
        }
        Ok(Value::Json(Json::Array(out)))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
