//! Flattening properties of the variable store

use apid::variables::{flatten, EnvPair, Variables};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn pairs(pairs: Vec<EnvPair>) -> BTreeSet<(String, String)> {
    pairs.into_iter().map(|p| (p.key, p.value)).collect()
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z ]{0,6}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z-]{1,5}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_flatten_is_deterministic(value in arb_value()) {
        let first = pairs(flatten("ROOT", &value));
        let second = pairs(flatten("ROOT", &value));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_keys_are_upper_case_without_hyphens(value in arb_value()) {
        for pair in flatten("root", &value) {
            prop_assert!(!pair.key.contains('-'));
            prop_assert_eq!(pair.key.to_uppercase(), pair.key.clone());
        }
    }
}

#[test]
fn test_hyphenated_key_gets_blob_and_scalar() {
    let got = pairs(flatten("a", &json!({"b-c": 1})));
    let want: BTreeSet<(String, String)> = [
        ("A".to_string(), r#"{"b-c":1}"#.to_string()),
        ("A_B_C".to_string(), "1".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(got, want);
}

#[test]
fn test_store_flattens_every_root_key() {
    let mut vars = Variables::new();
    vars.insert("a-b", json!(1));
    vars.insert("list", json!(["x", {"k": "v"}]));

    let got = pairs(vars.flatten());
    assert!(got.contains(&("A_B".to_string(), "1".to_string())));
    assert!(got.contains(&("LIST_0".to_string(), "x".to_string())));
    assert!(got.contains(&("LIST_1".to_string(), r#"{"k":"v"}"#.to_string())));
    assert!(got.contains(&("LIST".to_string(), r#"["x",{"k":"v"}]"#.to_string())));
    // list elements are not exploded further
    assert!(!got.iter().any(|(k, _)| k == "LIST_1_K"));
}
