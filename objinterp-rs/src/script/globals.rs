//! Global value store.
//!
//! Global values are registered once and then layered underneath the local
//! parameters of every interpretation. Each entry is either a plain value or
//! a formatting directive:
//!
//! | Entry                                             | Resolves to                      |
//! |---------------------------------------------------|----------------------------------|
//! | `"x"`, `3`, `[..]`                                | itself                           |
//! | `{"format":"text","value":[a,b],"quotechar":"'","delimiter":","}` | `'a','b'`        |
//! | `{"format":"text","value":v}`                     | `v`                              |
//! | `{"format":"json","value":v}`                     | `v` serialized, then expanded    |
//! | `{..}` without `format`, or `"verbatim"`          | the object itself                |
//! | `{"format":<other>,..}`                           | skipped                          |
//!
//! Values are merged either as a flat mapping, or as a sequence of
//! single-key groups whose members are stored as `group_key`.

use serde_json::{Map, Value as Json};

use super::error::{Correlation, InterpretError};
use super::expand::Engine;
use super::registry::Params;

/// Accumulated global values, keyed by their final parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalValues {
    entries: Map<String, Json>,
}

impl GlobalValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding exactly the entries of `values`.
    pub fn from_json(values: &Json) -> Self {
        let mut store = Self::new();
        store.merge(values);
        store
    }

    /// Merge `values` into the store; later writes replace earlier ones.
    pub fn merge(&mut self, values: &Json) {
        match values {
            Json::Object(map) => {
                for (key, entry) in map {
                    self.entries.insert(key.clone(), entry.clone());
                }
            }
            Json::Array(groups) => {
                for group in groups {
                    let Json::Object(group) = group else {
                        tracing::warn!(group = %group, "global value group is not an object, skipped");
                        continue;
                    };
                    // Only the first key of a group names it.
                    let Some((prefix, Json::Object(members))) = group.iter().next() else {
                        tracing::warn!("global value group has no members, skipped");
                        continue;
                    };
                    for (key, entry) in members {
                        self.entries.insert(format!("{prefix}_{key}"), entry.clone());
                    }
                }
            }
            Json::Null => {}
            other => tracing::warn!(values = %other, "global values must be an object or array"),
        }
        tracing::debug!(entries = self.entries.len(), "global values merged");
    }

    pub fn get(&self, key: &str) -> Option<&Json> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Json> {
        self.entries.remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Json)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve every entry into a flat parameter mapping.
    ///
    /// `json` entries are expanded against `local` alone; other globals are
    /// never visible to them, so resolution cannot recurse.
    pub async fn resolve(&self, engine: &Engine, local: &Params) -> Result<Params, InterpretError> {
        let mut out = Params::new();
        for (key, entry) in &self.entries {
            let Json::Object(directive) = entry else {
                out.insert(key.clone(), entry.clone());
                continue;
            };
            match directive.get("format") {
                None | Some(Json::Null) => {
                    out.insert(key.clone(), entry.clone());
                }
                Some(Json::String(format)) if format.is_empty() || format == "verbatim" => {
                    out.insert(key.clone(), entry.clone());
                }
                Some(Json::String(format)) if format == "text" => {
                    if let Some(value) = text_entry(directive) {
                        out.insert(key.clone(), value);
                    }
                }
                Some(Json::String(format)) if format == "json" => {
                    let src = directive.get("value").unwrap_or(&Json::Null).to_string();
                    let value = engine.expand(&src, local).await.map_err(|e| {
                        InterpretError::new(src.clone(), Correlation::from_params(local), e)
                    })?;
                    out.insert(key.clone(), value.into_json());
                }
                Some(format) => {
                    tracing::warn!(key = %key, format = %format, "unknown global value format, skipped");
                }
            }
        }
        Ok(out)
    }
}

/// `text` directive: a list is quoted and joined, anything else is taken as is.
fn text_entry(directive: &Map<String, Json>) -> Option<Json> {
    let value = directive.get("value")?;
    let Json::Array(items) = value else {
        return Some(value.clone());
    };
    let opt = |name: &str| match directive.get(name) {
        Some(Json::String(s)) => s.clone(),
        Some(Json::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    let (quote, delimiter) = (opt("quotechar"), opt("delimiter"));
    let joined = items
        .iter()
        .map(|item| {
            let text = match item {
                Json::String(s) => s.clone(),
                other => other.to_string(),
            };
            format!("{quote}{text}{quote}")
        })
        .collect::<Vec<_>>()
        .join(&delimiter);
    Some(Json::String(joined))
}

/// Layer `local` over `globals`; local keys win.
pub fn layer(mut globals: Params, local: &Params) -> Params {
    for (key, value) in local {
        globals.insert(key.clone(), value.clone());
    }
    globals
}

// ── Tests ─────────────────────────────────────────────────────────────────────
