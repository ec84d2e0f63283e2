//! Batch runner behaviour

use fakeforge_core::{Error, FakeforgeConfig, GenerationRequest, Result};
use fakeforge_resolver::run_batch;
use fakeforge_symbols::{
    CompilationUnit, DeclKind, Declaration, Field, InterfaceMember, InterfaceType,
    LoadedNamespace, NamespaceCache, Signature, SymbolProvider, TypeExpr,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Serves one package after a delay and counts how often it is asked
struct CountingProvider {
    loads: AtomicUsize,
}

impl SymbolProvider for CountingProvider {
    fn load(&self, path: &str) -> Result<LoadedNamespace> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        if path != "example.com/svc" {
            return Err(Error::namespace_load(path, "not found"));
        }

        let unit = ["Reader", "Writer", "Closer"].into_iter().fold(
            CompilationUnit::new("svc", "package"),
            |unit, name| {
                unit.with_declaration(Declaration::new(
                    name,
                    "svc.go",
                    DeclKind::Interface(InterfaceType::new(vec![InterfaceMember::Method {
                        name: format!("Do{name}"),
                        signature: Signature::new(
                            vec![],
                            vec![Field::unnamed(TypeExpr::basic("error"))],
                        ),
                    }])),
                ))
            },
        );
        Ok(LoadedNamespace::new(path, vec![unit]))
    }
}

fn setup() -> (Arc<CountingProvider>, Arc<NamespaceCache>, Arc<FakeforgeConfig>) {
    let provider = Arc::new(CountingProvider {
        loads: AtomicUsize::new(0),
    });
    let cache = Arc::new(NamespaceCache::new(provider.clone()));
    (provider, cache, Arc::new(FakeforgeConfig::default()))
}

#[tokio::test]
async fn test_failure_does_not_abort_batch() {
    let (_, cache, config) = setup();
    let requests = vec![
        GenerationRequest::new("example.com/svc", "Reader"),
        GenerationRequest::new("example.com/svc", "Missing"),
        GenerationRequest::new("example.com/elsewhere", "Thing"),
        GenerationRequest::new("example.com/svc", "Closer"),
    ];

    let outcomes = run_batch(cache, config, requests).await;

    assert_eq!(outcomes.len(), 4);
    let statuses: Vec<bool> = outcomes.iter().map(|o| o.is_ok()).collect();
    assert_eq!(statuses, vec![true, false, false, true]);

    let names: Vec<&str> = outcomes
        .iter()
        .map(|o| o.request.target_name.as_deref().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["Reader", "Missing", "Thing", "Closer"]);

    match &outcomes[1].result {
        Err(Error::TargetNotFound { name, .. }) => assert_eq!(name, "Missing"),
        other => panic!("unexpected outcome {other:?}"),
    }
    match &outcomes[3].result {
        Ok(model) => assert_eq!(model.methods[0].name, "DoCloser"),
        Err(e) => panic!("unexpected error {e}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_cache_loads_each_package_once() {
    let (provider, cache, config) = setup();
    let requests: Vec<GenerationRequest> = (0..12)
        .map(|i| {
            let name = ["Reader", "Writer", "Closer"][i % 3];
            GenerationRequest::new("example.com/svc", name)
        })
        .collect();

    let outcomes = run_batch(cache.clone(), config, requests).await;

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert_eq!(provider.loads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.load_count(), 1);
}

#[tokio::test]
async fn test_each_request_gets_its_own_registry() {
    let (_, cache, config) = setup();
    let requests = vec![
        GenerationRequest::new("example.com/svc", "Reader").with_alias("example.com/svc", "one"),
        GenerationRequest::new("example.com/svc", "Writer"),
    ];

    let outcomes = run_batch(cache, config, requests).await;

    let aliases: Vec<String> = outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(model) => model.target.alias.clone(),
            Err(e) => panic!("unexpected error {e}"),
        })
        .collect();
    assert_eq!(aliases, vec!["one", "svc"]);
}

#[tokio::test]
async fn test_empty_batch() {
    let (_, cache, config) = setup();
    let outcomes = run_batch(cache, config, Vec::new()).await;
    assert!(outcomes.is_empty());
}
