//! JSON report of a batch run

use fakeforge_core::FakeModel;
use fakeforge_resolver::BatchOutcome;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
}

/// Outcome of one target
#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub package: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<FakeModel>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub targets: Vec<TargetReport>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: Vec<BatchOutcome>) -> Self {
        let targets: Vec<TargetReport> = outcomes
            .into_iter()
            .map(|outcome| {
                let BatchOutcome { request, result } = outcome;
                let (status, error_kind, error, model) = match result {
                    Ok(model) => (Status::Ok, None, None, Some(model)),
                    Err(e) => (Status::Failed, Some(e.kind()), Some(e.to_string()), None),
                };
                TargetReport {
                    package: request.namespace_path,
                    name: request.target_name,
                    status,
                    error_kind,
                    error,
                    model,
                }
            })
            .collect();

        let failed = targets.iter().filter(|t| t.status == Status::Failed).count();
        Self {
            succeeded: targets.len() - failed,
            failed,
            targets,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
