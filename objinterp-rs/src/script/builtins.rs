//! Standard function library.
//!
//! Each function receives the already-evaluated, already-unquoted argument
//! values and returns `Result<Value, String>`. [`install`] registers all of
//! them (and their aliases) into a [`FunctionRegistry`]; hosts layer their own
//! functions on top or start from an empty registry instead.

use std::path::{Component, Path};

use regex::RegexBuilder;
use serde_json::Value as Json;
use uuid::Uuid;

use super::registry::{CallResult, FunctionRegistry, Params};
use super::value::Value;

type Plain = fn(&[Value]) -> CallResult;
type WithParams = fn(&[Value], &Params) -> CallResult;

const LOOKUP: &[(&str, WithParams)] = &[
    ("gv", getvalue),
    ("getvalue", getvalue),
    ("gvq", getvaluequoted),
    ("getvaluequoted", getvaluequoted),
    ("gvescape", getvalueescape),
    ("getvalueescape", getvalueescape),
    ("gvunescape", getvalueunescape),
    ("getvalueunescape", getvalueunescape),
];

const PLAIN: &[(&str, Plain)] = &[
    // environment
    ("genv", getenv),
    ("env", getenv),
    // logic
    ("if", if_),
    ("ifnull", ifnull),
    ("eq", |a| compare(a, "eq", |l, r| l.loose_eq(r))),
    ("ne", |a| compare(a, "ne", |l, r| !l.loose_eq(r))),
    ("gt", |a| compare(a, "gt", |l, r| l.cmp_value(r).is_some_and(|o| o.is_gt()))),
    ("gte", |a| compare(a, "gte", |l, r| l.cmp_value(r).is_some_and(|o| o.is_ge()))),
    ("lt", |a| compare(a, "lt", |l, r| l.cmp_value(r).is_some_and(|o| o.is_lt()))),
    ("lte", |a| compare(a, "lte", |l, r| l.cmp_value(r).is_some_and(|o| o.is_le()))),
    // math
    ("sin", |a| unary(a, "sin", f64::sin)),
    ("cos", |a| unary(a, "cos", f64::cos)),
    ("tan", |a| unary(a, "tan", f64::tan)),
    ("asin", |a| unary(a, "asin", f64::asin)),
    ("acos", |a| unary(a, "acos", f64::acos)),
    ("atan", |a| unary(a, "atan", f64::atan)),
    ("abs", |a| unary(a, "abs", f64::abs)),
    ("round", |a| unary(a, "round", |x| (x + 0.5).floor())),
    ("ceil", |a| unary(a, "ceil", f64::ceil)),
    ("floor", |a| unary(a, "floor", f64::floor)),
    ("log", |a| unary(a, "log", f64::ln)),
    ("exp", |a| unary(a, "exp", f64::exp)),
    ("sqrt", |a| unary(a, "sqrt", f64::sqrt)),
    ("pow", pow),
    ("max", |a| Ok(Value::Num(a.iter().map(Value::as_float).fold(f64::NEG_INFINITY, nan_max)))),
    ("min", |a| Ok(Value::Num(a.iter().map(Value::as_float).fold(f64::INFINITY, nan_min)))),
    ("random", random),
    ("add", add),
    ("subtract", subtract),
    ("multiply", multiply),
    ("divide", divide),
    ("modulus", modulus),
    // strings
    ("trim", |a| Ok(Value::Str(strip_quotes(&get_str(a, 0, "trim")?).trim().to_owned()))),
    ("ltrim", |a| Ok(Value::Str(strip_quotes(&get_str(a, 0, "ltrim")?).trim_start().to_owned()))),
    ("rtrim", |a| Ok(Value::Str(strip_quotes(&get_str(a, 0, "rtrim")?).trim_end().to_owned()))),
    ("lpad", |a| pad(a, "lpad", true)),
    ("rpad", |a| pad(a, "rpad", false)),
    ("concat", |a| Ok(Value::Str(a.iter().map(Value::as_str).collect()))),
    ("concatws", concatws),
    ("upper", |a| Ok(Value::Str(get_str(a, 0, "upper")?.to_uppercase()))),
    ("lower", |a| Ok(Value::Str(get_str(a, 0, "lower")?.to_lowercase()))),
    ("includes", |a| Ok(Value::Bool(get_str(a, 0, "includes")?.contains(&get_str(a, 1, "includes")?)))),
    ("indexof", indexof),
    ("substr", substr),
    ("length", |a| Ok(Value::Num(get_str(a, 0, "length")?.encode_utf16().count() as f64))),
    ("replace", replace),
    ("charcode", charcode),
    ("escape", |a| Ok(Value::Str(escape(&get_str(a, 0, "escape")?)))),
    ("unescape", |a| Ok(Value::Str(unescape(&get_str(a, 0, "unescape")?)))),
    ("htmlescape", |a| Ok(Value::Str(html_escape(&get_str(a, 0, "htmlescape")?)))),
    ("htmlunescape", |a| Ok(Value::Str(html_unescape(&get_str(a, 0, "htmlunescape")?)))),
    ("quote", quote),
    ("stringify", stringify),
    ("jsonstringify", stringify),
    // identifiers
    ("uuid", uuid_v4),
    ("uuidv4", uuid_v4),
    ("uuidv1", uuid_v1),
    ("uuidv3", |a| named_uuid(a, "uuidv3", Uuid::new_v3)),
    ("uuidv5", |a| named_uuid(a, "uuidv5", Uuid::new_v5)),
    ("uuidvalidate", |a| Ok(Value::Bool(parse_uuid(&opt_str(a, 0).unwrap_or_default()).is_some()))),
    ("uuidversion", uuid_version),
    // paths
    ("pathparse", pathparse),
    ("pathnormalize", |a| Ok(Value::Str(normalize(&get_str(a, 0, "pathnormalize")?)))),
    ("pathjoin", pathjoin),
];

/// Register the standard library into `registry`.
pub fn install(registry: &mut FunctionRegistry) {
    for &(name, f) in LOOKUP {
        registry.register_with_params(name, f);
    }
    for &(name, f) in PLAIN {
        registry.register(name, f);
    }
}

// ── Parameter lookup ──────────────────────────────────────────────────────────

/// `ENV_NAME` → environment variable `NAME`, empty when unset.
fn env_fallback(key: &str) -> Value {
    let value = key
        .strip_prefix("ENV_")
        .and_then(|name| std::env::var(name).ok())
        .unwrap_or_default();
    Value::Str(value)
}

/// Wrap `value` in `quote`; `\'` stands for a plain single quote.
fn quoted(value: Value, quote: Option<String>) -> Value {
    match quote.filter(|q| !q.is_empty()) {
        Some(q) => {
            let q = if q == "\\'" { "'".to_owned() } else { q };
            Value::Str(format!("{q}{value}{q}"))
        }
        None => value,
    }
}

/// A present parameter is returned unless it is empty or null; `0` and
/// `false` count as present.
fn lookup(key: &str, params: &Params) -> Value {
    match params.get(key) {
        Some(Json::Null) => Value::default(),
        Some(Json::String(s)) if s.is_empty() => Value::default(),
        Some(found) => Value::from_json(found),
        None => env_fallback(key),
    }
}

/// Looser lookup for the escaping variants: any falsy value falls through
/// to the environment.
fn lookup_truthy(key: &str, params: &Params) -> Value {
    match params.get(key).map(Value::from_json) {
        Some(found) if found.is_truthy() => found,
        _ => env_fallback(key),
    }
}

fn getvalue(args: &[Value], params: &Params) -> CallResult {
    let key = get_str(args, 0, "getvalue")?;
    Ok(quoted(lookup(&key, params), opt_str(args, 1)))
}

fn getvaluequoted(args: &[Value], params: &Params) -> CallResult {
    let key = get_str(args, 0, "getvaluequoted")?;
    let quote = opt_str(args, 1).unwrap_or_else(|| "'".to_owned());
    Ok(quoted(lookup(&key, params), Some(quote)))
}

fn getvalueescape(args: &[Value], params: &Params) -> CallResult {
    let key = get_str(args, 0, "getvalueescape")?;
    Ok(Value::Str(escape(&lookup_truthy(&key, params).as_str())))
}

fn getvalueunescape(args: &[Value], params: &Params) -> CallResult {
    let key = get_str(args, 0, "getvalueunescape")?;
    Ok(Value::Str(unescape(&lookup_truthy(&key, params).as_str())))
}

fn getenv(args: &[Value]) -> CallResult {
    let name = get_str(args, 0, "genv")?;
    let value = Value::Str(std::env::var(&name).unwrap_or_default());
    Ok(quoted(value, opt_str(args, 1)))
}

// ── Logic ─────────────────────────────────────────────────────────────────────

fn if_(args: &[Value]) -> CallResult {
    let cond = get_arg(args, 0, "if")?;
    let taken = match cond {
        Value::Bool(b) => *b,
        Value::Str(s) => s == "true",
        _ => false,
    };
    let pick = if taken { 1 } else { 2 };
    Ok(args.get(pick).cloned().unwrap_or_default())
}

fn ifnull(args: &[Value]) -> CallResult {
    let v = args.first().cloned().unwrap_or_default();
    if !v.is_truthy() {
        return Ok(args.get(1).cloned().unwrap_or_default());
    }
    match args.get(2) {
        Some(other) if other.is_truthy() => Ok(other.clone()),
        _ => Ok(v),
    }
}

fn compare(args: &[Value], name: &str, op: fn(&Value, &Value) -> bool) -> CallResult {
    let l = get_arg(args, 0, name)?;
    let r = get_arg(args, 1, name)?;
    Ok(Value::Bool(op(l, r)))
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

fn unary(args: &[Value], name: &str, f: fn(f64) -> f64) -> CallResult {
    Ok(Value::Num(f(get_float(args, 0, name)?)))
}

fn nan_max(acc: f64, x: f64) -> f64 {
    if acc.is_nan() || x.is_nan() {
        f64::NAN
    } else {
        acc.max(x)
    }
}

fn nan_min(acc: f64, x: f64) -> f64 {
    if acc.is_nan() || x.is_nan() {
        f64::NAN
    } else {
        acc.min(x)
    }
}

fn pow(args: &[Value]) -> CallResult {
    Ok(Value::Num(get_float(args, 0, "pow")?.powf(get_float(args, 1, "pow")?)))
}

/// Every argument as a number; text that is not numeric is an error.
fn numbers(args: &[Value], name: &str) -> Result<Vec<f64>, String> {
    args.iter()
        .enumerate()
        .map(|(i, v)| {
            let x = v.as_float();
            if x.is_nan() && !matches!(v, Value::Num(_)) {
                Err(format!("{name}: argument {i} is not a number: {v}"))
            } else {
                Ok(x)
            }
        })
        .collect()
}

fn add(args: &[Value]) -> CallResult {
    Ok(Value::Num(numbers(args, "add")?.into_iter().sum()))
}

fn subtract(args: &[Value]) -> CallResult {
    let nums = numbers(args, "subtract")?;
    let Some((first, rest)) = nums.split_first() else {
        return Ok(Value::Num(0.0));
    };
    Ok(Value::Num(rest.iter().fold(*first, |acc, x| acc - x)))
}

fn multiply(args: &[Value]) -> CallResult {
    Ok(Value::Num(get_float(args, 0, "multiply")? * get_float(args, 1, "multiply")?))
}

fn divide(args: &[Value]) -> CallResult {
    let x = get_float(args, 0, "divide")?;
    let y = get_float(args, 1, "divide")?;
    if y == 0.0 {
        return Err("divide: division by zero".into());
    }
    Ok(Value::Num(x / y))
}

fn modulus(args: &[Value]) -> CallResult {
    let x = get_float(args, 0, "modulus")?;
    let y = get_float(args, 1, "modulus")?;
    if y == 0.0 {
        return Err("modulus: modulo by zero".into());
    }
    Ok(Value::Num(x % y))
}

/// `random([decimals[, min, max]])`: a float in `[0, 1)`, or in
/// `[min, max + 1)` when both bounds are given, optionally rounded.
fn random(args: &[Value]) -> CallResult {
    let present = |i: usize| args.get(i).filter(|v| !v.as_str().is_empty()).map(Value::as_int);
    let unit = next_random();
    let x = match (present(1), present(2)) {
        // `as_int` saturates at the i64 bounds; the span stays in f64.
        (Some(min), Some(max)) => unit * (max as f64 + 1.0 - min as f64) + min as f64,
        _ => unit,
    };
    match present(0) {
        Some(decimals) => {
            let factor = 10f64.powi(decimals.clamp(0, 15) as i32);
            Ok(Value::Num((x * factor).round() / factor))
        }
        None => Ok(Value::Num(x)),
    }
}

/// xorshift64* over a clock-seeded state; good enough for test data, not
/// for anything that must be unpredictable.
fn next_random() -> f64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static STATE: AtomicU64 = AtomicU64::new(0);

    let mut s = STATE.load(Ordering::Relaxed);
    if s == 0 {
        s = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15)
            | 1;
    }
    s ^= s >> 12;
    s ^= s << 25;
    s ^= s >> 27;
    STATE.store(s, Ordering::Relaxed);
    (s.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
}

// ── Identifiers ───────────────────────────────────────────────────────────────

fn uuid_v4(_args: &[Value]) -> CallResult {
    Ok(Value::Str(Uuid::new_v4().to_string()))
}

/// Time-based, with a random node id per call.
fn uuid_v1(_args: &[Value]) -> CallResult {
    let mut node = [0u8; 6];
    node.copy_from_slice(&Uuid::new_v4().as_bytes()[..6]);
    Ok(Value::Str(Uuid::now_v1(&node).to_string()))
}

/// `uuidv3(name, namespace)` / `uuidv5(name, namespace)`.
fn named_uuid(args: &[Value], fname: &str, make: fn(&Uuid, &[u8]) -> Uuid) -> CallResult {
    let name = get_str(args, 0, fname)?;
    let namespace = get_str(args, 1, fname)?;
    let ns = parse_uuid(&namespace).ok_or_else(|| format!("{fname}: invalid namespace UUID: {namespace}"))?;
    Ok(Value::Str(make(&ns, name.as_bytes()).to_string()))
}

fn uuid_version(args: &[Value]) -> CallResult {
    let s = get_str(args, 0, "uuidversion")?;
    parse_uuid(&s)
        .map(|id| Value::Num(id.get_version_num() as f64))
        .ok_or_else(|| format!("uuidversion: invalid UUID: {s}"))
}

/// Hyphenated form only; nil, or an RFC 4122 variant with a known version.
fn parse_uuid(s: &str) -> Option<Uuid> {
    if s.len() != 36 {
        return None;
    }
    let id = Uuid::try_parse(s).ok()?;
    let known = id.get_variant() == uuid::Variant::RFC4122 && (1..=8).contains(&id.get_version_num());
    (id.is_nil() || known).then_some(id)
}

// ── Strings ───────────────────────────────────────────────────────────────────

fn strip_quotes(s: &str) -> String {
    s.replace('\'', "")
}

fn pad(args: &[Value], name: &str, left: bool) -> CallResult {
    let s = strip_quotes(&get_str(args, 0, name)?);
    let width = get_int(args, 1, name)?.max(0) as usize;
    let fill = strip_quotes(&opt_str(args, 2).unwrap_or_else(|| " ".to_owned()));
    let len = s.chars().count();
    if len >= width || fill.is_empty() {
        return Ok(Value::Str(s));
    }
    let padding: String = fill.chars().cycle().take(width - len).collect();
    Ok(Value::Str(if left { padding + &s } else { s + &padding }))
}

fn concatws(args: &[Value]) -> CallResult {
    let sep = get_str(args, 0, "concatws")?;
    let mut out = String::new();
    for arg in &args[1..] {
        if !out.is_empty() {
            out.push_str(&sep);
        }
        out.push_str(&arg.as_str());
    }
    Ok(Value::Str(out))
}

fn indexof(args: &[Value]) -> CallResult {
    let s = get_str(args, 0, "indexof")?;
    let needle = get_str(args, 1, "indexof")?;
    let pos = s
        .find(&needle)
        .map(|byte| s[..byte].chars().count() as f64)
        .unwrap_or(-1.0);
    Ok(Value::Num(pos))
}

/// `substr(s, start[, count])`; a negative start counts from the end.
fn substr(args: &[Value]) -> CallResult {
    let chars: Vec<char> = get_str(args, 0, "substr")?.chars().collect();
    let len = chars.len() as i64;
    let start = get_int(args, 1, "substr")?;
    let start = (if start < 0 { (len + start).max(0) } else { start.min(len) }) as usize;
    let end = match args.get(2).map(Value::as_int).filter(|&n| n != 0) {
        Some(n) if n < 0 => start,
        Some(n) => (start + n as usize).min(chars.len()),
        None => chars.len(),
    };
    Ok(Value::Str(chars[start..end].iter().collect()))
}

/// `replace(s, find, with[, flags])`. Without flags the first literal
/// occurrence is replaced; with flags `find` is a regular expression (`g`
/// replaces all matches, `i`, `m` and `s` map to the usual modifiers).
fn replace(args: &[Value]) -> CallResult {
    let s = get_str(args, 0, "replace")?;
    let find = get_str(args, 1, "replace")?;
    let with = opt_str(args, 2).unwrap_or_default();
    let Some(flags) = opt_str(args, 3).filter(|f| !f.is_empty()) else {
        return Ok(Value::Str(s.replacen(&find, &with, 1)));
    };

    let mut builder = RegexBuilder::new(&find);
    let mut global = false;
    for flag in flags.chars() {
        match flag {
            'g' => global = true,
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            'u' | 'y' => {}
            other => return Err(format!("replace: unsupported flag '{other}'")),
        }
    }
    let re = builder.build().map_err(|e| format!("replace: {e}"))?;
    let out = if global {
        re.replace_all(&s, with.as_str())
    } else {
        re.replace(&s, with.as_str())
    };
    Ok(Value::Str(out.into_owned()))
}

fn charcode(args: &[Value]) -> CallResult {
    let s = get_str(args, 0, "charcode")?;
    Ok(Value::Num(s.encode_utf16().next().map_or(f64::NAN, f64::from)))
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' | '\'' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses [`escape`] except for `\\`, which is left alone.
fn unescape(s: &str) -> String {
    const PAIRS: &[(&str, &str)] = &[
        ("\\'", "'"),
        ("\\\"", "\""),
        ("\\n", "\n"),
        ("\\r", "\r"),
        ("\\u2028", "\u{2028}"),
        ("\\u2029", "\u{2029}"),
    ];
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    'outer: while !rest.is_empty() {
        for (from, to) in PAIRS {
            if let Some(tail) = rest.strip_prefix(from) {
                out.push_str(to);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn html_unescape(s: &str) -> String {
    const ENTITIES: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
    ];
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(e, _)| rest.starts_with(e)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn quote(args: &[Value]) -> CallResult {
    let s = get_str(args, 0, "quote")?;
    let q = opt_str(args, 1).unwrap_or_else(|| "'".to_owned());
    Ok(Value::Str(format!("{q}{s}{q}")))
}

fn stringify(args: &[Value]) -> CallResult {
    let v = get_arg(args, 0, "stringify")?;
    if !v.is_truthy() {
        return Err(format!("stringifying non value variable -> {v}"));
    }
    serde_json::to_string(&v.clone().into_json())
        .map(Value::Str)
        .map_err(|e| format!("stringify: {e}"))
}

// ── Paths ─────────────────────────────────────────────────────────────────────

/// `pathparse(path, part)` where part is one of `root`, `dir`, `base`,
/// `ext` or `name`. An empty path yields an empty string.
fn pathparse(args: &[Value]) -> CallResult {
    let raw = get_str(args, 0, "pathparse")?;
    if raw.is_empty() {
        return Ok(Value::default());
    }
    let part = get_str(args, 1, "pathparse")?
        .replace(['\'', '"'], "")
        .trim()
        .to_lowercase();
    let path = Path::new(&raw);
    let base = path.file_name().map(|s| s.to_string_lossy().into_owned());
    let found = match part.as_str() {
        "root" => path.has_root().then(|| "/".to_owned()),
        "dir" => path.parent().map(|p| p.to_string_lossy().into_owned()),
        "base" => base,
        "ext" => path.extension().map(|e| format!(".{}", e.to_string_lossy())),
        "name" => path.file_stem().map(|s| s.to_string_lossy().into_owned()),
        _ => None,
    };
    match found.filter(|s| !s.is_empty()) {
        Some(s) => Ok(Value::Str(s)),
        None => Err(format!("pathparse ({raw}) wrong property {part}")),
    }
}

/// Lexical normalization: collapse separators, resolve `.` and `..` where
/// possible, keep a trailing separator. Never touches the filesystem.
fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return ".".to_owned();
    }
    let absolute = raw.starts_with('/');
    let trailing = raw.ends_with('/');
    let mut parts: Vec<String> = Vec::new();
    for comp in Path::new(raw).components() {
        match comp {
            Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
            Component::ParentDir => match parts.last() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push("..".to_owned()),
            },
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    let mut out = parts.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if out.is_empty() {
        out.push('.');
    }
    if trailing && !out.ends_with('/') {
        out.push('/');
    }
    out
}

fn pathjoin(args: &[Value]) -> CallResult {
    let joined = args
        .iter()
        .map(Value::as_str)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    Ok(Value::Str(normalize(&joined)))
}

// ── Argument accessors ────────────────────────────────────────────────────────

fn get_arg<'a>(args: &'a [Value], idx: usize, name: &str) -> Result<&'a Value, String> {
    args.get(idx)
        .ok_or_else(|| format!("{name}: argument {idx} missing"))
}

fn get_str(args: &[Value], idx: usize, name: &str) -> Result<String, String> {
    get_arg(args, idx, name).map(Value::as_str)
}

fn get_int(args: &[Value], idx: usize, name: &str) -> Result<i64, String> {
    get_arg(args, idx, name).map(Value::as_int)
}

fn get_float(args: &[Value], idx: usize, name: &str) -> Result<f64, String> {
    get_arg(args, idx, name).map(Value::as_float)
}

fn opt_str(args: &[Value], idx: usize) -> Option<String> {
    args.get(idx).map(Value::as_str)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Vec<Value>) -> Value {
        let f = PLAIN
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .expect("not a builtin");
        f(&args).expect("call failed")
    }

    fn params(v: Json) -> Params {
        match v {
            Json::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn every_name_is_registered() {
        let mut reg = FunctionRegistry::new();
        install(&mut reg);
        assert_eq!(reg.len(), LOOKUP.len() + PLAIN.len());
        for name in ["gv", "gvq", "concat", "if", "pathjoin", "jsonstringify"] {
            assert!(reg.contains(name), "{name}");
        }
    }

    #[test]
    fn getvalue_present_and_falsy() {
        let p = params(json!({"a": "x", "zero": 0, "no": false, "empty": "", "nul": null}));
        assert_eq!(getvalue(&["a".into()], &p), Ok(Value::from("x")));
        assert_eq!(getvalue(&["zero".into()], &p), Ok(Value::Num(0.0)));
        assert_eq!(getvalue(&["no".into()], &p), Ok(Value::Bool(false)));
        assert_eq!(getvalue(&["empty".into()], &p), Ok(Value::from("")));
        assert_eq!(getvalue(&["nul".into()], &p), Ok(Value::from("")));
        assert_eq!(getvalue(&["missing".into()], &p), Ok(Value::from("")));
    }

    #[test]
    fn getvalue_quoted() {
        let p = params(json!({"a": "x", "n": 5}));
        assert_eq!(getvalue(&["a".into(), "\"".into()], &p), Ok(Value::from("\"x\"")));
        assert_eq!(getvalue(&["a".into(), "\\'".into()], &p), Ok(Value::from("'x'")));
        assert_eq!(getvaluequoted(&["n".into()], &p), Ok(Value::from("'5'")));
    }

    #[test]
    fn getvalue_env_fallback() {
        std::env::set_var("OBJINTERP_TEST_GV", "from-env");
        let p = Params::new();
        assert_eq!(getvalue(&["ENV_OBJINTERP_TEST_GV".into()], &p), Ok(Value::from("from-env")));
        assert_eq!(getvalue(&["ENV_OBJINTERP_TEST_UNSET".into()], &p), Ok(Value::from("")));
        assert_eq!(call("genv", vec!["OBJINTERP_TEST_GV".into()]), Value::from("from-env"));
    }

    #[test]
    fn getvalue_escape_variants() {
        let p = params(json!({"s": "it's \"x\"", "e": "a\\nb"}));
        assert_eq!(getvalueescape(&["s".into()], &p), Ok(Value::from(r#"it\'s \"x\""#)));
        assert_eq!(getvalueunescape(&["e".into()], &p), Ok(Value::from("a\nb")));
    }

    #[test]
    fn if_and_ifnull() {
        assert_eq!(call("if", vec![Value::Bool(true), "a".into(), "b".into()]), Value::from("a"));
        assert_eq!(call("if", vec!["true".into(), "a".into(), "b".into()]), Value::from("a"));
        assert_eq!(call("if", vec!["yes".into(), "a".into(), "b".into()]), Value::from("b"));
        assert_eq!(call("ifnull", vec!["".into(), "alt".into()]), Value::from("alt"));
        assert_eq!(call("ifnull", vec!["v".into(), "alt".into()]), Value::from("v"));
        assert_eq!(call("ifnull", vec!["v".into(), "alt".into(), "other".into()]), Value::from("other"));
    }

    #[test]
    fn comparisons() {
        assert_eq!(call("eq", vec!["1".into(), Value::Num(1.0)]), Value::Bool(true));
        assert_eq!(call("ne", vec!["a".into(), "b".into()]), Value::Bool(true));
        assert_eq!(call("gt", vec![Value::Num(10.0), "9".into()]), Value::Bool(true));
        assert_eq!(call("lte", vec!["b".into(), "a".into()]), Value::Bool(false));
        assert_eq!(call("lt", vec!["x".into(), Value::Num(1.0)]), Value::Bool(false));
    }

    #[test]
    fn arithmetic() {
        assert_eq!(call("add", vec![Value::Num(1.0), "2".into(), Value::Num(0.5)]), Value::Num(3.5));
        assert_eq!(call("subtract", vec![Value::Num(10.0), Value::Num(3.0), Value::Num(2.0)]), Value::Num(5.0));
        assert_eq!(call("multiply", vec![Value::Num(4.0), Value::Num(2.5)]), Value::Num(10.0));
        assert_eq!(call("modulus", vec![Value::Num(7.0), Value::Num(3.0)]), Value::Num(1.0));
        assert_eq!(call("pow", vec![Value::Num(2.0), Value::Num(10.0)]), Value::Num(1024.0));
        assert_eq!(call("max", vec![Value::Num(2.0), Value::Num(7.0)]), Value::Num(7.0));
        assert_eq!(call("round", vec![Value::Num(2.5)]), Value::Num(3.0));
        assert_eq!(call("round", vec![Value::Num(-2.5)]), Value::Num(-2.0));
    }

    #[test]
    fn arithmetic_errors() {
        assert!(add(&["abc".into()]).is_err());
        assert_eq!(divide(&[Value::Num(1.0), Value::Num(0.0)]), Err("divide: division by zero".into()));
        assert!(multiply(&[Value::Num(1.0)]).is_err());
    }

    #[test]
    fn random_in_range() {
        for _ in 0..50 {
            let x = call("random", vec![Value::Num(0.0), Value::Num(5.0), Value::Num(7.0)]).as_float();
            assert!((5.0..=8.0).contains(&x), "{x}");
            assert_eq!(x.fract(), 0.0);
        }
        let unit = call("random", vec![]).as_float();
        assert!((0.0..1.0).contains(&unit));
    }

    #[test]
    fn random_with_saturated_bounds() {
        let huge = "99999999999999999999";
        let x = call("random", vec![Value::Num(0.0), Value::Num(0.0), huge.into()]).as_float();
        assert!(x.is_finite() && x >= 0.0, "{x}");

        let wide = call("random", vec!["".into(), format!("-{huge}").into(), huge.into()]).as_float();
        assert!(wide.is_finite(), "{wide}");
    }

    #[test]
    fn uuid_generation() {
        let a = call("uuid", vec![]).as_str();
        let b = call("uuidv4", vec![]).as_str();
        assert_ne!(a, b);
        assert_eq!(call("uuidversion", vec![a.clone().into()]), Value::Num(4.0));
        assert_eq!(call("uuidvalidate", vec![a.into()]), Value::Bool(true));

        let t = call("uuidv1", vec![]).as_str();
        assert_eq!(call("uuidversion", vec![t.into()]), Value::Num(1.0));
    }

    #[test]
    fn named_uuids_are_deterministic() {
        let dns = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";
        assert_eq!(
            call("uuidv3", vec!["python.org".into(), dns.into()]),
            Value::from("6fa459ea-ee8a-3ca4-894e-db77e160355e")
        );
        assert_eq!(
            call("uuidv5", vec!["python.org".into(), dns.into()]),
            Value::from("886313e1-3b8a-5372-9b90-0c9aee199e5d")
        );
        let bad = PLAIN.iter().find(|(n, _)| *n == "uuidv5").map(|(_, f)| *f).unwrap();
        assert_eq!(
            bad(&["x".into(), "not-a-uuid".into()]),
            Err("uuidv5: invalid namespace UUID: not-a-uuid".to_owned())
        );
    }

    #[test]
    fn uuid_validation() {
        let valid = |s: &str| call("uuidvalidate", vec![s.into()]);
        assert_eq!(valid("00000000-0000-0000-0000-000000000000"), Value::Bool(true));
        assert_eq!(valid("6ba7b8109dad11d180b400c04fd430c8"), Value::Bool(false));
        assert_eq!(valid("nope"), Value::Bool(false));
        assert_eq!(call("uuidvalidate", vec![]), Value::Bool(false));
        assert!(uuid_version(&["nope".into()]).is_err());
    }

    #[test]
    fn trim_and_pad() {
        assert_eq!(call("trim", vec!["  'a b'  ".into()]), Value::from("a b"));
        assert_eq!(call("ltrim", vec!["  a ".into()]), Value::from("a "));
        assert_eq!(call("lpad", vec!["7".into(), Value::Num(3.0), "0".into()]), Value::from("007"));
        assert_eq!(call("rpad", vec!["ab".into(), Value::Num(5.0), "xy".into()]), Value::from("abxyx"));
        assert_eq!(call("lpad", vec!["long".into(), Value::Num(2.0), "0".into()]), Value::from("long"));
    }

    #[test]
    fn concat_family() {
        assert_eq!(call("concat", vec!["a".into(), Value::Num(1.0), Value::Bool(true)]), Value::from("a1true"));
        assert_eq!(call("concatws", vec!["-".into(), "a".into(), "b".into(), "c".into()]), Value::from("a-b-c"));
        assert_eq!(call("concatws", vec!["-".into(), "".into(), "b".into()]), Value::from("b"));
    }

    #[test]
    fn search_and_slice() {
        assert_eq!(call("includes", vec!["foobar".into(), "oba".into()]), Value::Bool(true));
        assert_eq!(call("indexof", vec!["héllo".into(), "l".into()]), Value::Num(2.0));
        assert_eq!(call("indexof", vec!["abc".into(), "z".into()]), Value::Num(-1.0));
        assert_eq!(call("substr", vec!["hello".into(), Value::Num(1.0), Value::Num(3.0)]), Value::from("ell"));
        assert_eq!(call("substr", vec!["hello".into(), Value::Num(2.0)]), Value::from("llo"));
        assert_eq!(call("substr", vec!["hello".into(), Value::Num(-3.0)]), Value::from("llo"));
        assert_eq!(call("length", vec!["abc".into()]), Value::Num(3.0));
        assert_eq!(call("charcode", vec!["A".into()]), Value::Num(65.0));
    }

    #[test]
    fn replace_literal_and_regex() {
        assert_eq!(call("replace", vec!["a-b-c".into(), "-".into(), "+".into()]), Value::from("a+b-c"));
        assert_eq!(
            call("replace", vec!["a-b-c".into(), "-".into(), "+".into(), "g".into()]),
            Value::from("a+b+c")
        );
        assert_eq!(
            call("replace", vec!["Hello".into(), "h(e)".into(), "J$1".into(), "i".into()]),
            Value::from("Jello")
        );
        assert!(replace(&["a".into(), "(".into(), "".into(), "g".into()]).is_err());
    }

    #[test]
    fn escape_pairs() {
        assert_eq!(escape("a'b\"c\\d\ne"), "a\\'b\\\"c\\\\d\\ne");
        assert_eq!(unescape("a\\'b\\\"c\\ne"), "a'b\"c\ne");
        assert_eq!(html_escape("<a href=\"x\">'&'</a>"), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
        assert_eq!(html_unescape("&lt;b&gt; &amp;amp; &unknown;"), "<b> &amp; &unknown;");
    }

    #[test]
    fn quote_and_stringify() {
        assert_eq!(call("quote", vec!["x".into()]), Value::from("'x'"));
        assert_eq!(call("quote", vec!["x".into(), "\"".into()]), Value::from("\"x\""));
        assert_eq!(call("stringify", vec![Value::Json(json!({"a": [1]}))]), Value::from(r#"{"a":[1]}"#));
        assert_eq!(call("stringify", vec!["s".into()]), Value::from(r#""s""#));
        assert!(stringify(&["".into()]).is_err());
    }

    #[test]
    fn path_helpers() {
        let part = |p: &str, what: &str| call("pathparse", vec![p.into(), what.into()]);
        assert_eq!(part("/home/u/file.txt", "dir"), Value::from("/home/u"));
        assert_eq!(part("/home/u/file.txt", "base"), Value::from("file.txt"));
        assert_eq!(part("/home/u/file.txt", "ext"), Value::from(".txt"));
        assert_eq!(part("/home/u/file.txt", "NAME"), Value::from("file"));
        assert_eq!(part("/home/u/file.txt", "root"), Value::from("/"));
        assert!(pathparse(&["file".into(), "ext".into()]).is_err());

        assert_eq!(normalize("/a//b/./c/../d/"), "/a/b/d/");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize(""), ".");
        assert_eq!(call("pathjoin", vec!["/a".into(), "b/".into(), "../c".into()]), Value::from("/a/c"));
        assert_eq!(call("pathjoin", vec![]), Value::from("."));
    }
}
