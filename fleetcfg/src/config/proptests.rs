//! Property-based tests for configuration system.

use super::environment::EnvironmentConfig;
use super::merger::ConfigMerger;
use super::schema::Config;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn overrides_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,8}(@[a-z]{1,8})?", "[a-zA-Z0-9.]{0,12}", 0..6)
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (
        prop::option::of("[a-z]{1,12}"),
        prop::option::of(1usize..64),
        prop::option::of(any::<bool>()),
        prop::option::of(overrides_strategy()),
    )
        .prop_map(|(destination, threads, fail_fast, overrides)| Config {
            destination: destination.map(Into::into),
            threads,
            fail_fast,
            overrides,
            ..Default::default()
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // Merging preserves set values from the higher layer
    #[test]
    fn config_merge_higher_precedence_wins(low in config_strategy(), high in config_strategy()) {
        let mut merged = low.clone();
        ConfigMerger::merge_into(&mut merged, &high);

        prop_assert_eq!(merged.destination, high.destination.clone().or(low.destination.clone()));
        prop_assert_eq!(merged.threads, high.threads.or(low.threads));
        prop_assert_eq!(merged.fail_fast, high.fail_fast.or(low.fail_fast));
    }

    // Override tables are unions, higher layer wins per key
    #[test]
    fn config_merge_overrides_union(low in overrides_strategy(), high in overrides_strategy()) {
        let mut merged = Config { overrides: Some(low.clone()), ..Default::default() };
        ConfigMerger::merge_into(&mut merged, &Config { overrides: Some(high.clone()), ..Default::default() });
        let merged = merged.overrides.unwrap_or_default();

        for (key, value) in &high {
            prop_assert_eq!(merged.get(key), Some(value));
        }
        for (key, value) in &low {
            if !high.contains_key(key) {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        prop_assert!(merged.len() <= low.len() + high.len());
    }

    // Merging with an empty layer is the identity
    #[test]
    fn config_merge_empty_is_identity(config in config_strategy()) {
        let mut merged = config.clone();
        ConfigMerger::merge_into(&mut merged, &Config::default());
        prop_assert_eq!(merged, config);
    }

    // Joined key=value pairs parse back to the same table
    #[test]
    fn override_list_parsing(overrides in overrides_strategy()) {
        let joined = overrides
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = EnvironmentConfig::parse_overrides("test", &joined).unwrap();
        prop_assert_eq!(parsed, overrides);
    }
}
