use proptest::prelude::*;
use serde_json::{json, Value as Json};

use objinterp::script::lexer::tokenize;
use objinterp::script::parser::{parse, MAX_DEPTH};
use objinterp::script::{Engine, ExprError, FunctionRegistry, Params, Value};
use objinterp::{InterpretOptions, Interpreter};

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime")
        .block_on(fut)
}

/// Arbitrary JSON trees whose strings never contain the call sigil.
fn plain_tree() -> impl Strategy<Value = Json> {
    let leaf = prop_oneof![
        Just(Json::Null),
        any::<bool>().prop_map(Json::from),
        any::<i32>().prop_map(Json::from),
        "[^@]{0,12}".prop_map(Json::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Json::Array),
            prop::collection::btree_map("[^@]{0,6}", inner, 0..4)
                .prop_map(|m| Json::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// Text without an `@` is returned unchanged.
    #[test]
    fn sigil_free_text_passes_through(s in "[^@]*") {
        let out = block_on(Engine::default().expand(&s, &Params::new()));
        prop_assert_eq!(out, Ok(Value::Str(s)));
    }
}

proptest! {
    /// Unregistered `@names` are literal, whatever surrounds them.
    #[test]
    fn unregistered_names_pass_through(
        pre in "[a-z ,()]{0,8}",
        name in "[a-z]{1,8}",
        post in "[a-z ,()]{0,8}",
    ) {
        let s = format!("{pre}@{name}{post}");
        let out = block_on(Engine::new(FunctionRegistry::new()).expand(&s, &Params::new()));
        prop_assert_eq!(out, Ok(Value::Str(s)));
    }
}

proptest! {
    /// The tokenizer and parser never panic, and tokens tile the input.
    #[test]
    fn front_end_does_not_panic(s in "\\PC*") {
        let reg = FunctionRegistry::standard();
        if let Ok(tokens) = tokenize(&s, &reg) {
            let rebuilt: String = tokens.iter().map(|t| t.text).collect();
            prop_assert_eq!(&rebuilt, &s);
            let _ = parse(tokens);
        }
    }
}

proptest! {
    /// Sigil-free trees come back structurally identical.
    #[test]
    fn plain_trees_pass_through(tree in plain_tree()) {
        let interp = Interpreter::new();
        let out = block_on(interp.interpret(&tree, None, &InterpretOptions::default(), None));
        prop_assert_eq!(out, Ok(tree));
    }
}

proptest! {
    /// A quoted literal reaches the callable without its quotes.
    #[test]
    fn upper_matches_std(s in "[a-zA-Z0-9 ]{0,16}") {
        let src = format!("<@upper('{s}')>");
        let out = block_on(Engine::default().expand(&src, &Params::new()));
        prop_assert_eq!(out, Ok(Value::Str(format!("<{}>", s.to_uppercase()))));
    }
}

fn nested_upper(depth: usize) -> String {
    format!("{}'x'{}", "@upper(".repeat(depth), ")".repeat(depth))
}

proptest! {
    /// Nesting up to the limit evaluates; anything deeper is a syntax error.
    #[test]
    fn nested_calls_are_bounded(depth in 1usize..(MAX_DEPTH * 2)) {
        let out = block_on(Engine::default().expand(&nested_upper(depth), &Params::new()));
        if depth <= MAX_DEPTH {
            prop_assert_eq!(out, Ok(Value::Str("X".into())));
        } else {
            prop_assert!(matches!(out, Err(ExprError::Syntax { .. })), "{:?}", out);
        }
    }
}

proptest! {
    /// Unbalanced nesting of any depth returns an error, never a crash.
    #[test]
    fn unbalanced_nesting_fails_cleanly(open in 1usize..2000, close in 0usize..2000) {
        prop_assume!(open != close);
        let src = format!("{}'x'{}", "@upper(".repeat(open), ")".repeat(close));
        let out = block_on(Engine::default().expand(&src, &Params::new()));
        if open < close {
            // Surplus closers after a complete call are literal text.
            prop_assert!(out.is_ok() || matches!(out, Err(ExprError::Syntax { .. })), "{:?}", out);
        } else {
            prop_assert!(matches!(out, Err(ExprError::Syntax { .. })), "{:?}", out);
        }
    }
}

#[test]
fn very_deep_nesting_is_a_syntax_error() {
    let out = block_on(Engine::default().expand(&nested_upper(10_000), &Params::new()));
    assert!(matches!(out, Err(ExprError::Syntax { .. })), "{out:?}");
}

#[test]
fn oversized_trees_are_untouched() {
    let tree = json!({"a": "@upper('x')", "b": "y".repeat(200)});
    let interp = Interpreter::new();
    let out = block_on(interp.interpret(&tree, None, &InterpretOptions::new().with_max_size(100), None));
    assert_eq!(out, Ok(tree));
}
