//! The `@call()` expression language.
//!
//! Free-form text may contain islands of the form `@name(arg, ...)` where
//! `name` is registered in a [`FunctionRegistry`]. Everything else is literal
//! and passes through unchanged. One string goes through three stages:
//!
//! - [`lexer`] splits it into literal runs and call tokens,
//! - [`parser`] builds the nested call expressions,
//! - [`eval`] awaits every call depth first and stitches the results back
//!   into the surrounding text.
//!
//! [`Engine`] bundles the three for a single string; [`Interpreter`] applies
//! the engine to every key and value of a JSON tree, with parameter layering
//! over the [`GlobalValues`] store.
//!
//! # Quick start
//!
//! ```rust
//! use objinterp::script::{Engine, Params};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut params = Params::new();
//! params.insert("name".into(), "world".into());
//! let out = Engine::default().expand("Hello @upper(@gv('name'))!", &params).await.unwrap();
//! assert_eq!(out.to_string(), "Hello WORLD!");
//! # });
//! ```

pub mod builtins;
pub mod error;
pub mod eval;
pub mod expand;
pub mod globals;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

// Re-exports for convenience.
pub use error::{Correlation, Error, ExprError, InterpretError};
pub use eval::Variables;
pub use expand::{expand, Engine};
pub use globals::GlobalValues;
pub use interp::Interpreter;
pub use registry::{FunctionRegistry, Params};
pub use value::Value;
