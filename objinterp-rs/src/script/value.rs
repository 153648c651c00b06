//! Runtime value type for the expression language.
//!
//! Every expansion result is text at heart, but built-ins are free to return
//! numbers and booleans, and parameter lookups may hand back structured JSON.
//! Coercions are loose: empty strings are falsy, numeric strings compare as
//! numbers.

use std::cmp::Ordering;
use std::fmt;

use serde_json::{Number, Value as Json};

/// A script runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Num(f64),
    Bool(bool),
    /// Arrays, objects and `null` carried through from parameters untouched.
    Json(Json),
}

impl Default for Value {
    fn default() -> Self {
        Value::Str(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Num(x) => write!(f, "{}", format_number(*x)),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Json(j) => write!(f, "{j}"),
        }
    }
}

/// Format a float the way a script author expects to see it: integral values
/// without a fractional part, non-finite values spelled out.
fn format_number(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_owned()
    } else if x.is_infinite() {
        let sign = if x > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

impl Value {
    /// Truthiness: `""`, `0`, `NaN`, `false` and `null` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Str(s) => !s.is_empty(),
            Value::Num(x) => *x != 0.0 && !x.is_nan(),
            Value::Bool(b) => *b,
            Value::Json(j) => !j.is_null(),
        }
    }

    /// Coerce to `f64`; non-numeric text becomes `NaN`, blank text `0`.
    pub fn as_float(&self) -> f64 {
        match self {
            Value::Num(x) => *x,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
            Value::Json(Json::Null) => 0.0,
            Value::Json(_) => f64::NAN,
        }
    }

    /// Coerce to `i64`, truncating; `NaN` becomes 0.
    pub fn as_int(&self) -> i64 {
        let x = self.as_float();
        if x.is_nan() {
            0
        } else {
            x.trunc() as i64
        }
    }

    /// Coerce to a string (clones for Str, formats everything else).
    pub fn as_str(&self) -> String {
        self.to_string()
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Name of the type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::Num(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Json(Json::Null) => "null",
            Value::Json(Json::Array(_)) => "array",
            Value::Json(_) => "object",
        }
    }

    /// Remove one layer of enclosing single quotes from a string value.
    ///
    /// Applied to every argument before a call is dispatched, so `'abc'`
    /// reaches the callable as `abc`.
    pub fn unquoted(self) -> Value {
        match self {
            Value::Str(s) if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') => {
                Value::Str(s[1..s.len() - 1].to_owned())
            }
            other => other,
        }
    }

    // ── JSON bridging ─────────────────────────────────────────────────────────

    /// Lift a JSON value into the script domain.
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::String(s) => Value::Str(s.clone()),
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
            other => Value::Json(other.clone()),
        }
    }

    /// Lower back into JSON. Integral numbers stay integers; non-finite
    /// numbers have no JSON form and become `null`.
    pub fn into_json(self) -> Json {
        match self {
            Value::Str(s) => Json::String(s),
            Value::Bool(b) => Json::Bool(b),
            Value::Num(x) if x.fract() == 0.0 && x.abs() < 9.0e15 => Json::from(x as i64),
            Value::Num(x) => Number::from_f64(x).map(Json::Number).unwrap_or(Json::Null),
            Value::Json(j) => j,
        }
    }

    // ── Comparison helpers ────────────────────────────────────────────────────

    /// Loose equality: text compares as text, anything involving a number or
    /// boolean compares numerically.
    pub fn loose_eq(&self, rhs: &Value) -> bool {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Json(a), Value::Json(b)) => a == b,
            (Value::Json(Json::Null), _) | (_, Value::Json(Json::Null)) => false,
            _ => {
                let (a, b) = (self.as_float(), rhs.as_float());
                !a.is_nan() && !b.is_nan() && a == b
            }
        }
    }

    /// Relational comparison. Two strings compare lexicographically, any other
    /// pairing numerically; `None` when either side is `NaN`.
    pub fn cmp_value(&self, rhs: &Value) -> Option<Ordering> {
        match (self, rhs) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => self.as_float().partial_cmp(&rhs.as_float()),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
