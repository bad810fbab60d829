//! Recursive placeholder expansion with cycle detection.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::{Error, Result};
use crate::model::{Component, ConfigType, Source};
use crate::resolve::placeholder::{scan, Placeholder, Segment};
use crate::resolve::strategy::{CompositeStrategy, Resolution, ResolutionContext};

/// One step of a resolution chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEntry {
    /// Component owning the key.
    pub component: String,
    /// Config type owning the key.
    pub config_type: String,
    /// Environment the key is resolved in.
    pub environment: String,
    /// The key.
    pub key: String,
    /// Where the key's value came from.
    pub source: Source,
}

impl ChainEntry {
    fn label(&self) -> String {
        format!("{}@{}", self.component, self.key)
    }
}

/// Keys currently being resolved, outermost first.
///
/// # Examples
///
/// ```
/// use fleetcfg::model::Source;
/// use fleetcfg::resolve::{ChainEntry, ResolutionChain};
///
/// let entry = |key: &str| ChainEntry {
///     component: "billing".into(),
///     config_type: "app".into(),
///     environment: "prod".into(),
///     key: key.into(),
///     source: Source::File,
/// };
/// let mut chain = ResolutionChain::new();
/// chain.enter(entry("a")).unwrap();
/// chain.enter(entry("b")).unwrap();
/// let err = chain.enter(entry("a")).unwrap_err();
/// assert_eq!(err.to_string(), "cyclic reference detected: billing@a -> billing@b -> billing@a");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResolutionChain {
    entries: Vec<ChainEntry>,
}

impl ResolutionChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain seeded with the root property being resolved.
    #[must_use]
    pub fn rooted(component: &Component, config_type: &ConfigType, environment: &str, key: &str) -> Self {
        Self {
            entries: vec![ChainEntry {
                component: component.name().to_string(),
                config_type: config_type.name().to_string(),
                environment: environment.to_string(),
                key: key.to_string(),
                source: Source::File,
            }],
        }
    }

    /// Pushes an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicReference`] if the entry is already on the
    /// chain; the chain is left unchanged.
    pub fn enter(&mut self, entry: ChainEntry) -> Result<()> {
        if self.entries.contains(&entry) {
            let mut chain: Vec<String> = self.entries.iter().map(ChainEntry::label).collect();
            chain.push(entry.label());
            return Err(Error::CyclicReference { chain });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Pops the innermost entry.
    pub fn leave(&mut self) {
        self.entries.pop();
    }

    /// Key of the outermost entry.
    #[must_use]
    pub fn root_key(&self) -> Option<&str> {
        self.entries.first().map(|e| e.key.as_str())
    }

    /// Number of entries.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    component: String,
    environment: String,
    key: String,
    qualified: bool,
}

/// Expands placeholders in values of one config type.
///
/// Values are scanned for `${...}` tokens; each token is handed to the
/// registry's strategy chain and the answer is expanded again, in the
/// context the strategy reports. Successful lookups are memoized; default
/// fallbacks are not.
#[derive(Debug)]
pub struct ExpressionResolver {
    config_type: ConfigType,
    memo: Mutex<HashMap<MemoKey, String>>,
}

impl ExpressionResolver {
    /// Creates a resolver for one config type.
    #[must_use]
    pub fn new(config_type: ConfigType) -> Self {
        Self {
            config_type,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// The config type this resolver expands.
    #[must_use]
    pub fn config_type(&self) -> &ConfigType {
        &self.config_type
    }

    /// Number of memoized lookups.
    #[must_use]
    pub fn memo_len(&self) -> usize {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Expands every placeholder in `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CyclicReference`] when a key depends on itself,
    /// [`Error::UnresolvedPlaceholder`] when nothing resolves a placeholder
    /// without a default, [`Error::InvalidPlaceholder`] for malformed
    /// references, and any strategy error.
    pub fn resolve(
        &self,
        registry: &ResolverRegistry,
        value: &str,
        component: &Component,
        environment: &str,
        chain: &mut ResolutionChain,
    ) -> Result<String> {
        let segments = scan(value);
        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return Ok(value.to_string());
        }

        let mut out = String::with_capacity(value.len());
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(text) => {
                    let placeholder = Placeholder::parse(text)?;
                    let resolved =
                        self.resolve_placeholder(registry, &placeholder, component, environment, chain)?;
                    out.push_str(&resolved);
                }
            }
        }
        Ok(out)
    }

    fn resolve_placeholder(
        &self,
        registry: &ResolverRegistry,
        placeholder: &Placeholder,
        component: &Component,
        environment: &str,
        chain: &mut ResolutionChain,
    ) -> Result<String> {
        let ctx = ResolutionContext {
            component,
            environment,
            config_type: &self.config_type,
        };
        let memo_key = MemoKey {
            component: ctx.target_name(placeholder).to_string(),
            environment: ctx.target_environment(placeholder).to_string(),
            key: placeholder.key().to_string(),
            qualified: placeholder.is_qualified(),
        };
        if let Some(hit) = self.memo_get(&memo_key) {
            return Ok(hit);
        }

        match registry.strategy().resolve(placeholder, &ctx)? {
            Some(resolution) => {
                let value = self.expand_resolution(registry, placeholder, resolution, chain)?;
                self.memo_put(memo_key, value.clone());
                Ok(value)
            }
            None => match placeholder.default_value() {
                Some(default) => self.resolve(registry, default, component, environment, chain),
                None => Err(Error::UnresolvedPlaceholder {
                    placeholder: placeholder.text().to_string(),
                    component: component.name().to_string(),
                    environment: environment.to_string(),
                    property: chain.root_key().unwrap_or(placeholder.key()).to_string(),
                }),
            },
        }
    }

    fn expand_resolution(
        &self,
        registry: &ResolverRegistry,
        placeholder: &Placeholder,
        resolution: Resolution,
        chain: &mut ResolutionChain,
    ) -> Result<String> {
        chain.enter(ChainEntry {
            component: resolution.component.name().to_string(),
            config_type: resolution.config_type.clone(),
            environment: resolution.environment.clone(),
            key: placeholder.key().to_string(),
            source: resolution.source,
        })?;

        let resolver = registry.get(&resolution.config_type).unwrap_or(self);
        let expanded = resolver.resolve(
            registry,
            &resolution.value,
            &resolution.component,
            &resolution.environment,
            chain,
        );
        chain.leave();
        expanded
    }

    fn memo_get(&self, key: &MemoKey) -> Option<String> {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn memo_put(&self, key: MemoKey, value: String) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }
}

/// Expression resolvers for every registered config type, sharing one
/// strategy chain.
///
/// Built before resolution starts and read-only afterwards.
#[derive(Debug)]
pub struct ResolverRegistry {
    resolvers: Vec<ExpressionResolver>,
    by_type: HashMap<String, usize>,
    strategy: CompositeStrategy,
}

impl ResolverRegistry {
    /// Creates one resolver per config type. A later type with the same
    /// name replaces an earlier one.
    #[must_use]
    pub fn new(config_types: &[ConfigType], strategy: CompositeStrategy) -> Self {
        let mut resolvers = Vec::with_capacity(config_types.len());
        let mut by_type = HashMap::new();
        for config_type in config_types {
            match by_type.get(config_type.name()) {
                Some(&i) => resolvers[i] = ExpressionResolver::new(config_type.clone()),
                None => {
                    by_type.insert(config_type.name().to_string(), resolvers.len());
                    resolvers.push(ExpressionResolver::new(config_type.clone()));
                }
            }
        }
        Self {
            resolvers,
            by_type,
            strategy,
        }
    }

    /// The resolver for a config type.
    #[must_use]
    pub fn get(&self, config_type: &str) -> Option<&ExpressionResolver> {
        self.by_type.get(config_type).map(|&i| &self.resolvers[i])
    }

    /// The shared strategy chain.
    #[must_use]
    pub fn strategy(&self) -> &CompositeStrategy {
        &self.strategy
    }

    /// Registered config types, in registration order.
    pub fn config_types(&self) -> impl Iterator<Item = &ConfigType> {
        self.resolvers.iter().map(ExpressionResolver::config_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::strategy::{OverrideStrategy, PlaceholderStrategy};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Answers from a fixed `component@key -> value` table.
    struct TableStrategy {
        values: BTreeMap<String, String>,
        calls: Arc<AtomicUsize>,
    }

    impl PlaceholderStrategy for TableStrategy {
        fn name(&self) -> &'static str {
            "table"
        }

        fn try_resolve(
            &self,
            placeholder: &Placeholder,
            ctx: &ResolutionContext<'_>,
        ) -> Result<Option<Resolution>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let target = ctx.target_name(placeholder);
            let lookup = format!("{target}@{}", placeholder.key());
            Ok(self.values.get(&lookup).map(|v| Resolution {
                value: v.clone(),
                component: Component::new(target),
                environment: ctx.target_environment(placeholder).to_string(),
                config_type: ctx.config_type.name().to_string(),
                source: Source::File,
            }))
        }
    }

    fn registry(values: &[(&str, &str)], overrides: &[(&str, &str)]) -> (ResolverRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let table = TableStrategy {
            values: values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            calls: Arc::clone(&calls),
        };
        let overrides = OverrideStrategy::new(
            overrides.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        );
        let strategy = CompositeStrategy::new(vec![Box::new(overrides), Box::new(table)]);
        let types = [ConfigType::new("app", [".yaml"], "application.yaml")];
        (ResolverRegistry::new(&types, strategy), calls)
    }

    fn resolve_key(registry: &ResolverRegistry, key: &str, value: &str) -> Result<String> {
        let billing = Component::new("billing");
        let resolver = registry.get("app").unwrap();
        let mut chain = ResolutionChain::rooted(&billing, resolver.config_type(), "prod", key);
        resolver.resolve(registry, value, &billing, "prod", &mut chain)
    }

    #[test]
    fn test_plain_value_is_identity() {
        let (registry, calls) = registry(&[], &[]);
        for value in ["", "localhost", "cost $5", "${", "{braces}"] {
            assert_eq!(resolve_key(&registry, "k", value).unwrap(), value);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_chain_resolves_to_leaf_literal() {
        let (registry, _) = registry(
            &[("billing@a", "${b}"), ("billing@b", "${c}"), ("billing@c", "leaf")],
            &[],
        );
        assert!(resolve_key(&registry, "c", "${c}").unwrap_err().is_cycle());
        assert_eq!(resolve_key(&registry, "x", "${a}").unwrap(), "leaf");
        assert_eq!(resolve_key(&registry, "y", "${b}-${a}").unwrap(), "leaf-leaf");
    }

    #[test]
    fn test_direct_self_reference_is_a_cycle() {
        let (registry, _) = registry(&[("billing@a", "${a}")], &[]);
        let err = resolve_key(&registry, "a", "${a}").unwrap_err();
        assert!(err.is_cycle());
        assert_eq!(err.to_string(), "cyclic reference detected: billing@a -> billing@a");
    }

    #[test]
    fn test_indirect_cycle_lists_chain() {
        let (registry, _) = registry(&[("billing@a", "${b}"), ("billing@b", "${a}")], &[]);
        let err = resolve_key(&registry, "a", "${b}").unwrap_err();
        match err {
            Error::CyclicReference { chain } => {
                assert_eq!(chain, ["billing@a", "billing@b", "billing@a"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
    }

    #[test]
    fn test_cross_component_reference() {
        let (registry, _) = registry(
            &[("gateway@host", "gw.${domain}"), ("gateway@domain", "example.org")],
            &[],
        );
        assert_eq!(
            resolve_key(&registry, "upstream", "http://${gateway@host}/").unwrap(),
            "http://gw.example.org/"
        );
    }

    #[test]
    fn test_override_of_root_key_is_not_a_cycle() {
        let (registry, _) = registry(&[("billing@a", "${a}")], &[("a", "forced")]);
        assert_eq!(resolve_key(&registry, "a", "${a}").unwrap(), "forced");
    }

    #[test]
    fn test_default_used_when_unresolved() {
        let (registry, _) = registry(&[("billing@ip", "10.0.0.5")], &[]);
        assert_eq!(resolve_key(&registry, "k", "${host:${ip}}").unwrap(), "10.0.0.5");
        assert_eq!(resolve_key(&registry, "k", "${host:}").unwrap(), "");
    }

    #[test]
    fn test_unresolved_names_root_property() {
        let (registry, _) = registry(&[], &[]);
        let err = resolve_key(&registry, "dir", "${serviceDir}").unwrap_err();
        match err {
            Error::UnresolvedPlaceholder { placeholder, component, environment, property } => {
                assert_eq!(placeholder, "serviceDir");
                assert_eq!(component, "billing");
                assert_eq!(environment, "prod");
                assert_eq!(property, "dir");
            }
            other => panic!("expected unresolved, got {other}"),
        }
    }

    #[test]
    fn test_successful_lookups_are_memoized() {
        let (registry, calls) = registry(&[("billing@a", "1")], &[]);
        resolve_key(&registry, "x", "${a}").unwrap();
        let after_first = calls.load(Ordering::SeqCst);
        resolve_key(&registry, "y", "${a}${a}").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), after_first);
        assert_eq!(registry.get("app").unwrap().memo_len(), 1);
    }

    #[test]
    fn test_failed_lookup_leaves_chain_balanced() {
        let (registry, _) = registry(&[("billing@a", "${missing}")], &[]);
        let billing = Component::new("billing");
        let resolver = registry.get("app").unwrap();
        let mut chain = ResolutionChain::rooted(&billing, resolver.config_type(), "prod", "k");
        assert!(resolver.resolve(&registry, "${a}", &billing, "prod", &mut chain).is_err());
        assert_eq!(chain.depth(), 1);
    }

    #[test]
    fn test_registry_replaces_duplicate_types() {
        let types = [
            ConfigType::new("app", [".yaml"], "application.yaml"),
            ConfigType::new("app", [".yml"], "app.yaml"),
        ];
        let registry = ResolverRegistry::new(&types, CompositeStrategy::new(Vec::new()));
        assert_eq!(registry.config_types().count(), 1);
        assert_eq!(registry.get("app").unwrap().config_type().result_file_name(), "app.yaml");
        assert!(registry.get("process").is_none());
    }
}
