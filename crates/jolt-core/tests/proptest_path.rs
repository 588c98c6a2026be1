//! Property-based tests for the path-element grammar.
//!
//! Properties under test:
//! 1. a literal matches exactly its own key
//! 2. `pre*post` matches iff the key has the prefix and suffix plus at least
//!    one more character, and captures what lies between them
//! 3. canonical forms are fixed points: `canonical(parse(canonical(e))) == canonical(e)`
//! 4. `&n`, `&(n)` and `&(n,0)` resolve identically

use jolt_core::path::parse_key;
use jolt_core::{Shiftr, WalkedPath};
use proptest::prelude::*;
use serde_json::json;

/// Keys without grammar markers.
fn arb_plain_key() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("a".to_string()),
        Just("0".to_string()),
        Just("tuna".to_string()),
        "[a-zA-Z0-9_-]{1,12}",
    ]
}

/// Keys with escaped markers and dots, still literals once parsed.
fn arb_escaped_key() -> impl Strategy<Value = String> {
    ("[a-z]{0,4}", prop_oneof![Just("\\*"), Just("\\&"), Just("\\@"), Just("\\$"), Just("\\.")], "[a-z]{0,4}")
        .prop_map(|(a, marker, b)| format!("{a}{marker}{b}"))
}

fn arb_spec_key() -> impl Strategy<Value = String> {
    prop_oneof![
        arb_plain_key(),
        arb_escaped_key(),
        Just("*".to_string()),
        Just("@".to_string()),
        ("[a-z]{1,4}", "[a-z]{0,4}").prop_map(|(p, s)| format!("{p}*{s}")),
        ("[a-z]{0,3}", "[a-z]{1,3}", "[a-z]{0,3}").prop_map(|(p, m, s)| format!("{p}*{m}*{s}")),
        (0usize..5, 0usize..4).prop_map(|(p, k)| format!("&({p},{k})")),
        (0usize..5).prop_map(|p| format!("&{p}")),
        ("[a-z]{1,4}", 0usize..3).prop_map(|(l, p)| format!("{l}-&{p}")),
        (0usize..5, 0usize..4).prop_map(|(p, k)| format!("$({p},{k})")),
        "[a-z]{1,6}".prop_map(|l| format!("#{l}")),
        (0usize..4, "[a-z]{1,4}").prop_map(|(p, l)| format!("@({p},{l})")),
        (0usize..20).prop_map(|i| format!("[{i}]")),
        (0usize..4).prop_map(|p| format!("[#{p}]")),
        (0usize..4, 0usize..3).prop_map(|(p, k)| format!("[&({p},{k})]")),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..Default::default() })]

    /// Property: a literal element matches a key iff the key equals it.
    #[test]
    fn literal_matches_only_itself(raw in arb_plain_key(), key in arb_plain_key()) {
        let element = parse_key(&raw).unwrap();
        let walked = WalkedPath::new(4);
        let matched = element.matches(&key, &walked).unwrap();
        prop_assert_eq!(matched.is_some(), raw == key);
        if let Some(m) = matched {
            prop_assert_eq!(m.raw_key(), key.as_str());
        }
    }

    /// Property: `pre*post` captures the non-empty middle.
    #[test]
    fn single_star_captures_middle(
        prefix in "[a-c]{1,3}",
        suffix in "[a-c]{0,3}",
        key in "[a-c]{0,8}",
    ) {
        let element = parse_key(&format!("{prefix}*{suffix}")).unwrap();
        let walked = WalkedPath::new(4);
        let matched = element.matches(&key, &walked).unwrap();

        let fits = key.len() > prefix.len() + suffix.len()
            && key.starts_with(&prefix)
            && key.ends_with(&suffix);
        prop_assert_eq!(matched.is_some(), fits);
        if let Some(m) = matched {
            prop_assert_eq!(m.sub_key(0), Some(key.as_str()));
            prop_assert_eq!(m.sub_key(1), Some(&key[prefix.len()..key.len() - suffix.len()]));
        }
    }

    /// Property: re-parsing a canonical form reproduces it.
    #[test]
    fn canonical_form_is_a_fixed_point(key in arb_spec_key()) {
        let element = parse_key(&key).unwrap();
        let canonical = element.canonical_form();
        let reparsed = parse_key(&canonical).unwrap();
        prop_assert_eq!(reparsed.canonical_form(), canonical);
    }

    /// Property: reference sugar forms resolve to the same key.
    #[test]
    fn reference_sugar_is_equivalent(outer in arb_plain_key(), inner in arb_plain_key(), level in 0usize..2) {
        let input = json!({ outer.clone(): { inner.clone(): 1 } });
        let run = |reference: String| {
            Shiftr::new(&json!({"*": {"*": reference}})).unwrap().apply(&input).unwrap()
        };
        let expected_key = if level == 0 { &inner } else { &outer };
        let expected = json!({ expected_key.clone(): 1 });

        prop_assert_eq!(run(format!("&{level}")), expected.clone());
        prop_assert_eq!(run(format!("&({level})")), expected.clone());
        prop_assert_eq!(run(format!("&({level},0)")), expected.clone());
        if level == 0 {
            prop_assert_eq!(run("&".to_string()), expected);
        }
    }
}
