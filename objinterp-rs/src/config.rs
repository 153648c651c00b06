//! Interpretation options and the JSON configuration document.
//!
//! A configuration file seeds an [`Interpreter`](crate::Interpreter) with
//! default options and an initial set of global values:
//!
//! ```json
//! {
//!   "options": { "maxSize": 65536, "ignoreGlobalValues": false },
//!   "globalValues": {
//!     "env": "prod",
//!     "ids": { "format": "text", "value": ["a", "b"], "quotechar": "'", "delimiter": "," }
//!   }
//! }
//! ```
//!
//! Keys are accepted in either `camelCase` or `snake_case`.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

// ── Public API ────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-call interpretation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpretOptions {
    /// Values whose serialized size exceeds this many bytes are returned
    /// untouched. `0` disables the guard.
    #[serde(alias = "maxSize")]
    pub max_size: Option<usize>,

    /// Neither merge nor layer global values for this call.
    #[serde(alias = "ignoreGlobalValues")]
    pub ignore_global_values: bool,
}

impl InterpretOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn ignoring_global_values(mut self) -> Self {
        self.ignore_global_values = true;
        self
    }

    /// Whether `value` serializes to more than `max_size` bytes.
    pub fn exceeds_max_size(&self, value: &Json) -> bool {
        let Some(max) = self.max_size.filter(|&max| max > 0) else {
            return false;
        };
        let mut counter = ByteCounter(0);
        // Writing into a counter cannot fail.
        if serde_json::to_writer(&mut counter, value).is_err() {
            return false;
        }
        counter.0 > max
    }
}

/// Counts bytes instead of buffering them.
struct ByteCounter(usize);

impl io::Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0 += buf.len();
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A loaded configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub options: InterpretOptions,

    /// Initial global values, either a flat mapping or a list of groups.
    #[serde(alias = "globalValues", skip_serializing_if = "Option::is_none")]
    pub global_values: Option<Json>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration document from a JSON string.
    pub fn load_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Read and parse a configuration file from disk.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::load_str(&s)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_options() {
        let opts = InterpretOptions::default();
        assert_eq!(opts.max_size, None);
        assert!(!opts.ignore_global_values);
        assert!(!opts.exceeds_max_size(&json!("anything at all")));
    }

    #[test]
    fn size_guard_counts_serialized_bytes() {
        let value = json!({"k": "vvvv"}); // {"k":"vvvv"} is 12 bytes
        assert!(!InterpretOptions::new().with_max_size(12).exceeds_max_size(&value));
        assert!(InterpretOptions::new().with_max_size(11).exceeds_max_size(&value));
    }

    #[test]
    fn zero_max_size_disables_guard() {
        let opts = InterpretOptions::new().with_max_size(0);
        assert!(!opts.exceeds_max_size(&json!({"big": "x".repeat(1000)})));
    }

    #[test]
    fn options_accept_both_spellings() {
        let camel: InterpretOptions = serde_json::from_value(json!({"maxSize": 10, "ignoreGlobalValues": true})).unwrap();
        let snake: InterpretOptions = serde_json::from_value(json!({"max_size": 10, "ignore_global_values": true})).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.max_size, Some(10));
        assert!(camel.ignore_global_values);
    }

    #[test]
    fn load_str_full_document() {
        let cfg = Config::load_str(
            r#"{
                "options": {"maxSize": 100},
                "globalValues": {"env": "prod"}
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.options.max_size, Some(100));
        assert_eq!(cfg.global_values, Some(json!({"env": "prod"})));
    }

    #[test]
    fn load_str_empty_object() {
        assert_eq!(Config::load_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn load_str_rejects_garbage() {
        assert!(matches!(Config::load_str("{options:"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn load_file_missing() {
        let err = Config::load_file(Path::new("/nonexistent/objinterp.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("cannot read /nonexistent/objinterp.json"));
    }
}
