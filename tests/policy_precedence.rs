//! Access policy precedence tests
//!
//! Property checks over generated allow-lists and keys

use proptest::prelude::*;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;
use storage_access::iam::{
    can_change_policy, check_is_public, get_policy_attributes, PatternMatcher,
};
use storage_access::{Policy, PolicyResolver};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,6}"
}

fn key() -> impl Strategy<Value = String> {
    (prop::collection::vec(segment(), 1..5), "[a-z]{1,4}")
        .prop_map(|(dirs, ext)| format!("{}.{}", dirs.join("/"), ext))
}

fn rule() -> impl Strategy<Value = String> {
    prop_oneof![
        key(),
        prop::collection::vec(segment(), 1..3).prop_map(|d| format!("{}/", d.join("/"))),
        prop::collection::vec(segment(), 1..3).prop_map(|d| format!("{}/*", d.join("/"))),
        (segment(), "[a-z]{1,4}").prop_map(|(d, ext)| format!("{}/*.{}", d, ext)),
    ]
}

proptest! {
    #[test]
    fn prop_empty_allow_list_is_private(key in key()) {
        let empty: Vec<String> = Vec::new();
        let attrs = get_policy_attributes(&empty, &key);
        prop_assert_eq!(attrs.policy, Policy::Private);
        prop_assert!(attrs.can_change_policy);
    }

    #[test]
    fn prop_public_iff_some_rule_matches(
        rules in prop::collection::vec(rule(), 0..8),
        key in key(),
    ) {
        let expected = rules.iter().any(|r| PatternMatcher::matches(r, &key));
        prop_assert_eq!(check_is_public(&rules, &key), expected);
    }

    #[test]
    fn prop_private_keys_are_always_changeable(
        rules in prop::collection::vec(rule(), 0..8),
        key in key(),
    ) {
        let attrs = get_policy_attributes(&rules, &key);
        if attrs.policy == Policy::Private {
            prop_assert!(attrs.can_change_policy);
        }
    }

    #[test]
    fn prop_exact_rule_never_unlocks_inherited_key(
        dir in segment(),
        file in "[a-z]{1,8}\\.txt",
    ) {
        let key = format!("{}/{}", dir, file);
        let rules = vec![format!("{}/*", dir), key.clone()];

        let attrs = get_policy_attributes(&rules, &key);
        prop_assert_eq!(attrs.policy, Policy::Public);
        prop_assert!(!attrs.can_change_policy);
    }

    #[test]
    fn prop_rule_order_is_irrelevant(
        rules in prop::collection::vec(rule(), 1..8),
        key in key(),
        seed in any::<u64>(),
    ) {
        let mut shuffled = rules.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        prop_assert_eq!(
            get_policy_attributes(&rules, &key),
            get_policy_attributes(&shuffled, &key)
        );
    }

    #[test]
    fn prop_public_then_private_restores_rules(
        rules in prop::collection::vec(rule(), 0..6),
        key in key(),
    ) {
        let mut resolver = PolicyResolver::new(rules.clone()).unwrap();
        prop_assume!(!resolver.check_is_public(&key));

        resolver.set_policy(&key, Policy::Public).unwrap();
        prop_assert!(resolver.check_is_public(&key));
        prop_assert!(resolver.can_change_policy(&key));

        resolver.set_policy(&key, Policy::Private).unwrap();
        prop_assert_eq!(resolver.allow_list(), rules.as_slice());
    }

    #[test]
    fn prop_make_private_leaves_key_private(
        rules in prop::collection::vec(rule(), 0..6),
        key in key(),
        self_wildcard in any::<bool>(),
        exact in any::<bool>(),
    ) {
        let mut rules = rules;
        if self_wildcard {
            rules.push(format!("{}*", key));
        }
        if exact {
            rules.push(key.clone());
        }
        let mut resolver = PolicyResolver::new(rules).unwrap();

        if resolver.can_change_policy(&key) {
            resolver.set_policy(&key, Policy::Private).unwrap();
            prop_assert!(!resolver.check_is_public(&key));
        } else {
            prop_assert!(resolver.set_policy(&key, Policy::Private).is_err());
        }
    }
}

#[test]
fn test_directory_rule_covers_descendants_only() {
    let rules = ["team/shared/"];

    assert!(check_is_public(&rules, "team/shared/a.txt"));
    assert!(check_is_public(&rules, "team/shared/deep/b.txt"));
    assert!(!check_is_public(&rules, "team/shared-old/a.txt"));
    assert!(!check_is_public(&rules, "team/other.txt"));
}

#[test]
fn test_suffix_wildcard() {
    let rules = ["logs/*.gz"];

    assert!(check_is_public(&rules, "logs/2024/app.gz"));
    assert!(!check_is_public(&rules, "logs/2024/app.txt"));
    assert!(!can_change_policy(&rules, "logs/2024/app.gz"));
}

#[test]
fn test_directory_key_owns_its_wildcard() {
    let mut resolver = PolicyResolver::default();
    resolver.set_policy("reports/", Policy::Public).unwrap();

    let own = resolver.get_policy_attributes("reports/");
    assert_eq!(own.policy, Policy::Public);
    assert!(own.can_change_policy);

    let child = resolver.get_policy_attributes("reports/q3.pdf");
    assert_eq!(child.policy, Policy::Public);
    assert!(!child.can_change_policy);
}

#[test]
fn test_concurrent_resolution() {
    use std::sync::Arc;

    let resolver = Arc::new(PolicyResolver::new(["public/*", "docs/readme.md"]).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || {
                for i in 0..500 {
                    let key = format!("public/{}/{}.bin", t, i);
                    assert!(resolver.check_is_public(&key));
                    assert!(!resolver.can_change_policy(&key));
                    assert!(!resolver.check_is_public(&format!("private/{}", i)));
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
