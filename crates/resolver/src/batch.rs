//! Concurrent resolution of many independent requests

use crate::assembler::FakeModelAssembler;
use fakeforge_core::config::FakeforgeConfig;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::model::FakeModel;
use fakeforge_core::request::GenerationRequest;
use fakeforge_symbols::NamespaceCache;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{error, info};

/// Result of one batch entry
#[derive(Debug)]
pub struct BatchOutcome {
    pub request: GenerationRequest,
    pub result: Result<FakeModel>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Resolve every request, at most `config.batch.max_concurrent_targets` at a time
///
/// Each request runs on the blocking pool with its own assembler; only the
/// namespace cache is shared. Outcomes come back in request order and a
/// failing request never stops the others.
pub async fn run_batch(
    cache: Arc<NamespaceCache>,
    config: Arc<FakeforgeConfig>,
    requests: Vec<GenerationRequest>,
) -> Vec<BatchOutcome> {
    let concurrency = config.batch.max_concurrent_targets.max(1);
    let total = requests.len();

    let outcomes = stream::iter(requests)
        .map(|request| {
            let cache = Arc::clone(&cache);
            let config = Arc::clone(&config);
            async move {
                let label = request.label();
                let task_request = request.clone();
                let result = tokio::task::spawn_blocking(move || {
                    FakeModelAssembler::new(&cache, &config).assemble(&task_request)
                })
                .await
                .unwrap_or_else(|e| {
                    Err(Error::Other(anyhow::anyhow!(
                        "resolution task for {label} failed: {e}"
                    )))
                });

                if let Err(e) = &result {
                    error!("Failed to resolve {label}: {e}");
                }
                BatchOutcome { request, result }
            }
        })
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await;

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!(
        "Resolved {} of {total} targets ({failed} failed)",
        total - failed
    );
    outcomes
}
