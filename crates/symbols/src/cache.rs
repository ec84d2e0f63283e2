//! Load-once namespace cache shared across resolution passes

use crate::namespace::LoadedNamespace;
use crate::provider::SymbolProvider;
use dashmap::DashMap;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::namespace::unvendor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::debug;

type LoadOutcome = std::result::Result<Arc<LoadedNamespace>, String>;

/// Caches provider loads by canonical import path
///
/// Each key's loader runs exactly once, even when several threads ask for the
/// same path at the same time: late arrivals block on the slot until the first
/// load finishes. Failures are remembered as well, so a broken package is not
/// parsed again within the same run. Loaded namespaces are immutable and
/// handed out behind `Arc`.
pub struct NamespaceCache {
    provider: Arc<dyn SymbolProvider>,
    slots: DashMap<String, Arc<OnceLock<LoadOutcome>>>,
    loads: AtomicUsize,
}

impl NamespaceCache {
    pub fn new(provider: Arc<dyn SymbolProvider>) -> Self {
        Self {
            provider,
            slots: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Load a namespace, consulting the provider only on first request
    pub fn load(&self, path: &str) -> Result<Arc<LoadedNamespace>> {
        let key = unvendor(path);
        if key.is_empty() {
            return Err(Error::invalid_input("empty package path"));
        }

        // Clone the slot out so the map shard is not locked while loading
        let slot = Arc::clone(&self.slots.entry(key.clone()).or_default());

        let outcome = slot.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::SeqCst);
            debug!("Loading package {key}");
            self.provider
                .load(&key)
                .map(Arc::new)
                .map_err(|e| match e {
                    Error::NamespaceLoadFailed { message, .. } => message,
                    other => other.to_string(),
                })
        });

        match outcome {
            Ok(namespace) => Ok(Arc::clone(namespace)),
            Err(message) => Err(Error::namespace_load(key, message.clone())),
        }
    }

    /// Number of provider loads performed so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of distinct paths requested so far
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl std::fmt::Debug for NamespaceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceCache")
            .field("paths", &self.slots.len())
            .field("loads", &self.load_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::CompilationUnit;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Provider that counts calls and sleeps to widen race windows
    struct SlowProvider {
        calls: AtomicUsize,
    }

    impl SymbolProvider for SlowProvider {
        fn load(&self, path: &str) -> Result<LoadedNamespace> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            if path == "broken" {
                return Err(Error::namespace_load(path, "no Go files"));
            }
            Ok(LoadedNamespace::new(
                path,
                vec![CompilationUnit::new("pkg", "package")],
            ))
        }
    }

    #[test]
    fn test_same_path_loaded_once() {
        let cache = NamespaceCache::new(Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        }));
        let first = cache.load("example.com/a").expect("load");
        let second = cache.load("example.com/a").expect("load");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_vendored_path_shares_entry() {
        let cache = NamespaceCache::new(Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        }));
        let plain = cache.load("github.com/x/y").expect("load");
        let vendored = cache.load("app/vendor/github.com/x/y").expect("load");
        assert!(Arc::ptr_eq(&plain, &vendored));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let provider = Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(NamespaceCache::new(provider.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.load("example.com/shared").map(|_| ()))
            })
            .collect();
        for handle in handles {
            handle.join().expect("thread").expect("load");
        }

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_failures_are_memoised() {
        let cache = NamespaceCache::new(Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        }));
        let err = cache.load("broken").unwrap_err();
        assert_eq!(err.to_string(), "Failed to load package broken: no Go files");
        assert!(cache.load("broken").is_err());
        assert_eq!(cache.load_count(), 1);
    }

    #[test]
    fn test_empty_path_rejected() {
        let cache = NamespaceCache::new(Arc::new(SlowProvider {
            calls: AtomicUsize::new(0),
        }));
        assert!(matches!(cache.load(" "), Err(Error::InvalidInput(_))));
    }
}
