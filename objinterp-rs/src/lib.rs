//! Selective `@call()` expansion over text and JSON trees.
//!
//! ```rust
//! use objinterp::{InterpretOptions, Interpreter};
//! use serde_json::json;
//!
//! let interp = Interpreter::new();
//! let local = json!({"user": "ann"});
//! let out = interp
//!     .interpret_blocking(
//!         &json!({"greeting": "hi @upper(@gv('user'))", "n": "@add(1, 2)"}),
//!         local.as_object(),
//!         &InterpretOptions::default(),
//!         None,
//!     )
//!     .unwrap();
//! assert_eq!(out, json!({"greeting": "hi ANN", "n": 3}));
//! ```

pub mod config;
pub mod script;

pub use config::{Config, ConfigError, InterpretOptions};
pub use script::{Engine, FunctionRegistry, InterpretError, Interpreter, Params, Value};
