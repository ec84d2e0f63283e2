//! TOML batch files listing many targets
//!
//! ```toml
//! [[target]]
//! package = "./storage"
//! name = "Repository"
//! destination = "storagefakes"
//!
//! [target.aliases]
//! "example.com/app/internal/sync" = "isync"
//!
//! [[target]]
//! package = "os"
//! mode = "package"
//! name = "OS"
//! ```

use anyhow::{anyhow, Context, Result};
use fakeforge_core::{GenerationRequest, ResolveMode};
use fakeforge_symbols::go::PackageLocator;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed batch file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchFile {
    #[serde(default, rename = "target")]
    pub targets: Vec<BatchTarget>,
}

/// One `[[target]]` entry
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchTarget {
    /// Import path, or a `./` path relative to the module root
    pub package: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mode: ResolveMode,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub fake_name: Option<String>,
    /// Preferred aliases keyed by package
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl BatchFile {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse batch file")
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid batch file {}", path.display()))
    }

    /// Convert every entry into a request with canonical package paths
    pub fn into_requests(self, locator: &PackageLocator) -> Result<Vec<GenerationRequest>> {
        if self.targets.is_empty() {
            return Err(anyhow!("batch file lists no targets"));
        }
        self.targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                target
                    .to_request(locator)
                    .with_context(|| format!("target #{} ({})", i + 1, target.package))
            })
            .collect()
    }
}

impl BatchTarget {
    pub fn to_request(&self, locator: &PackageLocator) -> Result<GenerationRequest> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        if self.mode == ResolveMode::Auto && name.is_none() {
            return Err(anyhow!("name is required unless mode = \"package\""));
        }

        let mut aliases = BTreeMap::new();
        for (package, alias) in &self.aliases {
            aliases.insert(locator.canonical_path(package)?, alias.clone());
        }

        Ok(GenerationRequest {
            namespace_path: locator.canonical_path(&self.package)?,
            target_name: name.map(str::to_string),
            mode: self.mode,
            destination_package: self.destination.clone(),
            fake_name: self.fake_name.clone(),
            alias_overrides: aliases,
        })
    }
}
