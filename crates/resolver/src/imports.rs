//! Import registry: unique aliases for every namespace a fake references
//!
//! Aliases are scoped to one generated file, so every resolution pass owns its
//! own registry. The reserved `sync` binding is created up front and can never
//! be taken over by another package that happens to be called `sync`.

use fakeforge_core::model::AliasBinding;
use fakeforge_core::namespace::{guess_package_name, unvendor, RESERVED_ALIAS, RESERVED_NAMESPACE};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Pick the first free alias of the form `requested` + letter suffix.
///
/// Suffixes run `a`, `b`, ... `z`, then `aa`, `ab`, ... so the result depends
/// only on which aliases are taken.
pub fn unique_alias(requested: &str, is_taken: impl Fn(&str) -> bool) -> String {
    let mut n = 0usize;
    loop {
        let candidate = format!("{requested}{}", alpha_suffix(n));
        if !is_taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Bijective base-26 numbering: 0 → `a`, 25 → `z`, 26 → `aa`
fn alpha_suffix(n: usize) -> String {
    let mut n = n + 1;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'a' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

/// Maps canonical namespaces to unique aliases, in binding order
#[derive(Debug, Clone)]
pub struct ImportRegistry {
    bindings: Vec<AliasBinding>,
    by_namespace: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
    preferred: BTreeMap<String, String>,
}

impl Default for ImportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRegistry {
    /// Create a registry holding only the reserved binding
    pub fn new() -> Self {
        let mut registry = Self {
            bindings: Vec::new(),
            by_namespace: HashMap::new(),
            by_alias: HashMap::new(),
            preferred: BTreeMap::new(),
        };
        registry.insert(AliasBinding::new(RESERVED_ALIAS, RESERVED_NAMESPACE));
        registry
    }

    /// Prefer `alias` whenever `namespace` is bound later on
    ///
    /// Collision rules still apply to preferred aliases.
    pub fn prefer(&mut self, namespace: &str, alias: &str) {
        let alias = alias.trim();
        if alias.is_empty() {
            return;
        }
        self.preferred.insert(unvendor(namespace), alias.to_string());
    }

    /// Bind a namespace, returning its existing binding if it has one
    pub fn bind(&mut self, requested_alias: &str, namespace: &str) -> AliasBinding {
        let canonical = unvendor(namespace);
        if let Some(&idx) = self.by_namespace.get(&canonical) {
            return self.bindings[idx].clone();
        }

        let requested = match self.preferred.get(&canonical) {
            Some(alias) => alias.clone(),
            None if requested_alias.trim().is_empty() => guess_package_name(&canonical),
            None => requested_alias.trim().to_string(),
        };

        let alias = if self.by_alias.contains_key(&requested) {
            let alias = unique_alias(&requested, |a| self.by_alias.contains_key(a));
            debug!("Alias {requested} is taken, binding {canonical} as {alias}");
            alias
        } else {
            requested
        };

        let binding = AliasBinding::new(alias, canonical);
        self.insert(binding.clone());
        binding
    }

    /// Alias of a namespace, if it was bound
    pub fn alias_for(&self, namespace: &str) -> Option<&str> {
        self.by_namespace
            .get(&unvendor(namespace))
            .map(|&idx| self.bindings[idx].alias.as_str())
    }

    /// Whether an alias is in use
    pub fn is_alias_taken(&self, alias: &str) -> bool {
        self.by_alias.contains_key(alias)
    }

    /// All bindings in binding order; the reserved binding is first
    pub fn bindings(&self) -> Vec<AliasBinding> {
        self.bindings.clone()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    fn insert(&mut self, binding: AliasBinding) {
        let idx = self.bindings.len();
        self.by_namespace.insert(binding.namespace.clone(), idx);
        self.by_alias.insert(binding.alias.clone(), idx);
        self.bindings.push(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_alpha_suffix_sequence() {
        assert_eq!(alpha_suffix(0), "a");
        assert_eq!(alpha_suffix(1), "b");
        assert_eq!(alpha_suffix(25), "z");
        assert_eq!(alpha_suffix(26), "aa");
        assert_eq!(alpha_suffix(27), "ab");
        assert_eq!(alpha_suffix(26 + 26 * 26 - 1), "zz");
        assert_eq!(alpha_suffix(26 + 26 * 26), "aaa");
    }

    #[test]
    fn test_unique_alias_skips_taken() {
        let taken: HashSet<&str> = ["foo", "fooa", "foob"].into_iter().collect();
        assert_eq!(unique_alias("foo", |a| taken.contains(a)), "fooc");
        assert_eq!(unique_alias("bar", |a| taken.contains(a)), "bara");
    }

    #[test]
    fn test_unique_alias_continues_past_z() {
        let taken: HashSet<String> = (b'a'..=b'z').map(|c| format!("x{}", c as char)).collect();
        assert_eq!(unique_alias("x", |a| taken.contains(a)), "xaa");
    }

    #[test]
    fn test_reserved_binding_is_first() {
        let registry = ImportRegistry::new();
        assert_eq!(
            registry.bindings(),
            vec![AliasBinding::new("sync", "sync")]
        );
        assert_eq!(registry.alias_for("sync"), Some("sync"));
    }

    #[test]
    fn test_colliding_short_names_get_suffixes() {
        let mut registry = ImportRegistry::new();
        let first = registry.bind("foo", "example.com/a/foo");
        let second = registry.bind("foo", "example.com/b/foo");
        let third = registry.bind("foo", "example.com/c/foo");
        assert_eq!(first.alias, "foo");
        assert_eq!(second.alias, "fooa");
        assert_eq!(third.alias, "foob");
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut registry = ImportRegistry::new();
        let first = registry.bind("foo", "example.com/a/foo");
        let again = registry.bind("other", "example.com/a/foo");
        assert_eq!(first, again);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_foreign_sync_is_disambiguated() {
        let mut registry = ImportRegistry::new();
        let foreign = registry.bind("sync", "github.com/acme/sync");
        assert_eq!(foreign.alias, "synca");
        assert_eq!(registry.bind("mysync", "sync").alias, "sync");
        assert_eq!(registry.alias_for("sync"), Some("sync"));
    }

    #[test]
    fn test_vendored_paths_share_binding() {
        let mut registry = ImportRegistry::new();
        let vendored = registry.bind("y", "example.com/app/vendor/github.com/x/y");
        let plain = registry.bind("y", "github.com/x/y");
        assert_eq!(vendored, plain);
        assert_eq!(vendored.namespace, "github.com/x/y");
    }

    #[test]
    fn test_preferred_alias_applies() {
        let mut registry = ImportRegistry::new();
        registry.prefer("example.com/app/storage", "store");
        registry.prefer("github.com/acme/sync", "sync");
        assert_eq!(
            registry.bind("storage", "example.com/app/storage").alias,
            "store"
        );
        assert_eq!(
            registry.bind("sync", "github.com/acme/sync").alias,
            "synca"
        );
    }

    #[test]
    fn test_alias_for_unbound_is_none() {
        let registry = ImportRegistry::new();
        assert_eq!(registry.alias_for("example.com/nowhere"), None);
    }
}
