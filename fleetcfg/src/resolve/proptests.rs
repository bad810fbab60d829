//! Property-based tests for placeholder scanning and expansion.

use super::expression::{ResolutionChain, ResolverRegistry};
use super::placeholder::{scan, Segment};
use super::strategy::{CompositeStrategy, OverrideStrategy};
use crate::model::{Component, ConfigType};
use proptest::prelude::*;
use std::collections::BTreeMap;

// Text that never contains a `${` token
fn plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ./:=,_{}$-]{0,40}".prop_filter("no placeholder opener", |s| !s.contains("${"))
}

fn override_registry(values: BTreeMap<String, String>) -> ResolverRegistry {
    let strategy = CompositeStrategy::new(vec![Box::new(OverrideStrategy::new(values))]);
    ResolverRegistry::new(
        &[ConfigType::new("app", [".yaml"], "application.yaml")],
        strategy,
    )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 2000,
        .. ProptestConfig::default()
    })]

    // Values without tokens resolve to themselves
    #[test]
    fn plain_values_are_identity(value in plain_text()) {
        let registry = override_registry(BTreeMap::new());
        let billing = Component::new("billing");
        let resolver = registry.get("app").unwrap();
        let mut chain = ResolutionChain::rooted(&billing, resolver.config_type(), "prod", "k");
        let resolved = resolver.resolve(&registry, &value, &billing, "prod", &mut chain).unwrap();
        prop_assert_eq!(resolved, value);
    }

    // Scanning loses no text
    #[test]
    fn scan_round_trips(value in "[a-z${}:@]{0,40}") {
        let rebuilt: String = scan(&value)
            .iter()
            .map(|s| match s {
                Segment::Literal(text) => (*text).to_string(),
                Segment::Placeholder(text) => format!("${{{text}}}"),
            })
            .collect();
        prop_assert_eq!(rebuilt, value);
    }

    // A linear chain k0 -> k1 -> ... -> kn resolves to the last literal
    #[test]
    fn linear_chains_reach_the_leaf(len in 1usize..20, leaf in "[a-z0-9]{1,12}") {
        let mut values = BTreeMap::new();
        for i in 0..len {
            values.insert(format!("k{i}"), format!("${{k{}}}", i + 1));
        }
        values.insert(format!("k{len}"), leaf.clone());

        let registry = override_registry(values);
        let billing = Component::new("billing");
        let resolver = registry.get("app").unwrap();
        let mut chain = ResolutionChain::rooted(&billing, resolver.config_type(), "prod", "root");
        let resolved = resolver.resolve(&registry, "${k0}", &billing, "prod", &mut chain).unwrap();
        prop_assert_eq!(resolved, leaf);
    }

    // A ring k0 -> k1 -> ... -> k0 always fails as a cycle
    #[test]
    fn rings_are_cycles(len in 1usize..20) {
        let values = (0..len)
            .map(|i| (format!("k{i}"), format!("${{k{}}}", (i + 1) % len)))
            .collect();

        let registry = override_registry(values);
        let billing = Component::new("billing");
        let resolver = registry.get("app").unwrap();
        let mut chain = ResolutionChain::rooted(&billing, resolver.config_type(), "prod", "root");
        let err = resolver.resolve(&registry, "${k0}", &billing, "prod", &mut chain).unwrap_err();
        prop_assert!(err.is_cycle());
    }
}
