//! Generation requests supplied by directive discovery or the CLI

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the target is looked up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// Look up one named declaration and classify it as interface or function type
    #[default]
    Auto,
    /// Fake every exported free function of the package
    Package,
}

/// One fake to generate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Import path of the package declaring the target
    pub namespace_path: String,
    /// Declaration name; optional in package mode
    #[serde(default)]
    pub target_name: Option<String>,
    #[serde(default)]
    pub mode: ResolveMode,
    /// Package name of the generated file; derived from configuration when absent
    #[serde(default)]
    pub destination_package: Option<String>,
    /// Name of the fake type; derived from configuration when absent
    #[serde(default)]
    pub fake_name: Option<String>,
    /// Preferred aliases keyed by import path
    #[serde(default)]
    pub alias_overrides: BTreeMap<String, String>,
}

impl GenerationRequest {
    /// Request a fake for one named interface or function type
    pub fn new(namespace_path: impl Into<String>, target_name: impl Into<String>) -> Self {
        Self {
            namespace_path: namespace_path.into(),
            target_name: Some(target_name.into()),
            mode: ResolveMode::Auto,
            destination_package: None,
            fake_name: None,
            alias_overrides: BTreeMap::new(),
        }
    }

    /// Request a fake covering every exported function of a package
    pub fn package(namespace_path: impl Into<String>) -> Self {
        Self {
            namespace_path: namespace_path.into(),
            target_name: None,
            mode: ResolveMode::Package,
            destination_package: None,
            fake_name: None,
            alias_overrides: BTreeMap::new(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination_package = Some(destination.into());
        self
    }

    pub fn with_fake_name(mut self, fake_name: impl Into<String>) -> Self {
        self.fake_name = Some(fake_name.into());
        self
    }

    pub fn with_alias(mut self, namespace: impl Into<String>, alias: impl Into<String>) -> Self {
        self.alias_overrides.insert(namespace.into(), alias.into());
        self
    }

    /// Human readable label for logs and batch reports
    pub fn label(&self) -> String {
        match &self.target_name {
            Some(name) => format!("{}.{name}", self.namespace_path),
            None => format!("{} (package)", self.namespace_path),
        }
    }
}
