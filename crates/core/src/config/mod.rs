//! Configuration module for fakeforge
//!
//! Configuration can be loaded from a TOML file and/or environment variables.
//! Every field has a default, so an empty file (or no file at all) is valid.

mod defaults;
mod loading;


use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use defaults::*;

/// Name of the configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "fakeforge.toml";

/// Symbol provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Directory containing the `go.mod` of the module being processed
    #[serde(default = "default_module_root")]
    pub module_root: PathBuf,

    /// Go installation root; standard library packages are read from `<goroot>/src`
    #[serde(default)]
    pub goroot: Option<PathBuf>,

    /// Module cache holding required third-party modules as `<path>@<version>`
    #[serde(default)]
    pub gomodcache: Option<PathBuf>,

    /// Whether `_test.go` files form additional compilation units
    #[serde(default = "default_include_tests")]
    pub include_tests: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            module_root: default_module_root(),
            goroot: None,
            gomodcache: None,
            include_tests: default_include_tests(),
        }
    }
}

/// Naming rules for generated fakes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Prefix of the default fake name (`Fake` + target name)
    #[serde(default = "default_fake_prefix")]
    pub fake_prefix: String,

    /// Suffix of the default destination package (package name + suffix)
    #[serde(default = "default_destination_suffix")]
    pub destination_suffix: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fake_prefix: default_fake_prefix(),
            destination_suffix: default_destination_suffix(),
        }
    }
}

/// Batch runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Maximum number of targets resolved at the same time
    #[serde(default = "default_max_concurrent_targets")]
    pub max_concurrent_targets: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_targets: default_max_concurrent_targets(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FakeforgeConfig {
    /// Symbol provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Fake naming configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Batch configuration
    #[serde(default)]
    pub batch: BatchConfig,
}

impl FakeforgeConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.generation.fake_prefix.trim().is_empty() {
            return Err(Error::config("generation.fake_prefix must not be empty"));
        }

        if !is_identifier(&self.generation.fake_prefix) {
            return Err(Error::config(format!(
                "generation.fake_prefix '{}' is not a valid identifier",
                self.generation.fake_prefix
            )));
        }

        if self.generation.destination_suffix.trim().is_empty() {
            return Err(Error::config(
                "generation.destination_suffix must not be empty",
            ));
        }

        if self.batch.max_concurrent_targets == 0 {
            return Err(Error::config(
                "batch.max_concurrent_targets must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Default fake name for a target
    pub fn fake_name_for(&self, target_name: &str) -> String {
        format!("{}{target_name}", self.generation.fake_prefix)
    }

    /// Default destination package for fakes of a package
    pub fn destination_for(&self, package_name: &str) -> String {
        format!("{package_name}{}", self.generation.destination_suffix)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
