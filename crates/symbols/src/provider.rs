//! The symbol provider boundary

use crate::namespace::LoadedNamespace;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::namespace::unvendor;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Loads type information for one import path
///
/// Implementations are called at most once per canonical path and run, so
/// they do not need to cache anything themselves.
pub trait SymbolProvider: Send + Sync {
    /// Load the namespace with the given canonical import path
    fn load(&self, path: &str) -> Result<LoadedNamespace>;
}

/// Provider backed by namespaces registered in memory
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    namespaces: RwLock<HashMap<String, LoadedNamespace>>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a namespace under its canonical path
    pub fn insert(&self, namespace: LoadedNamespace) {
        let key = unvendor(&namespace.path);
        let mut guard = self
            .namespaces
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.insert(key, namespace);
    }

    /// Builder-style registration
    pub fn with(self, namespace: LoadedNamespace) -> Self {
        self.insert(namespace);
        self
    }
}

impl SymbolProvider for InMemoryProvider {
    fn load(&self, path: &str) -> Result<LoadedNamespace> {
        let guard = self
            .namespaces
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&unvendor(path))
            .cloned()
            .ok_or_else(|| Error::namespace_load(path, "package not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::CompilationUnit;

    #[test]
    fn test_in_memory_provider_unvendors_lookups() {
        let provider = InMemoryProvider::new().with(LoadedNamespace::new(
            "github.com/x/y",
            vec![CompilationUnit::new("y", "package")],
        ));
        let loaded = provider
            .load("example.com/app/vendor/github.com/x/y")
            .expect("vendored path should resolve");
        assert_eq!(loaded.package_name(), Some("y"));
    }

    #[test]
    fn test_in_memory_provider_missing_namespace() {
        let provider = InMemoryProvider::new();
        let err = provider.load("nowhere").unwrap_err();
        assert!(matches!(err, Error::NamespaceLoadFailed { .. }));
    }

    #[test]
    fn test_registration_survives_poisoned_lock() {
        let provider = std::sync::Arc::new(InMemoryProvider::new());
        let poisoner = std::sync::Arc::clone(&provider);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.namespaces.write().expect("lock");
            panic!("poison the namespace map");
        })
        .join();
        assert!(provider.namespaces.is_poisoned());

        provider.insert(LoadedNamespace::new(
            "example.com/late",
            vec![CompilationUnit::new("late", "package")],
        ));
        let loaded = provider.load("example.com/late").expect("registered after poisoning");
        assert_eq!(loaded.package_name(), Some("late"));
    }
}
