//! Configuration loading from files and environment variables

use crate::error::{Error, Result};
use config::{Config as ConfigLib, ConfigBuilder as LibConfigBuilder, Environment, File};
use std::path::Path;

use super::defaults::*;
use super::{FakeforgeConfig, DEFAULT_CONFIG_FILE};

/// Helper to set a config default with consistent error mapping
fn set_config_default<T: Into<config::Value>>(
    builder: LibConfigBuilder<config::builder::DefaultState>,
    key: &str,
    value: T,
) -> Result<LibConfigBuilder<config::builder::DefaultState>> {
    builder
        .set_default(key, value)
        .map_err(|e| Error::config(format!("Failed to set {key} default: {e}")))
}

/// Module cache location the go tool would use
fn module_cache_from_env() -> Option<String> {
    let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
    if let Some(cache) = non_empty("GOMODCACHE") {
        return Some(cache);
    }
    let gopath = non_empty("GOPATH")?;
    let first = std::env::split_paths(&gopath).next()?;
    Some(first.join("pkg").join("mod").to_string_lossy().into_owned())
}

impl FakeforgeConfig {
    /// Loads configuration from a TOML file with environment variable overrides
    ///
    /// Environment variables are prefixed with `FAKEFORGE_` and use double underscores
    /// for nested values. For example:
    /// - `FAKEFORGE_GENERATION__FAKE_PREFIX=Stub`
    /// - `FAKEFORGE_PROVIDER__MODULE_ROOT=/src/app`
    ///
    /// `GOROOT` is used for `provider.goroot` when nothing else sets it, and
    /// `GOMODCACHE` (or `$GOPATH/pkg/mod`) for `provider.gomodcache`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let builder = ConfigLib::builder();

        // The config crate does not apply serde defaults for missing sections
        let builder = set_config_default(builder, "provider.module_root", DEFAULT_MODULE_ROOT)?;
        let builder =
            set_config_default(builder, "provider.include_tests", default_include_tests())?;
        let builder = set_config_default(builder, "generation.fake_prefix", DEFAULT_FAKE_PREFIX)?;
        let builder = set_config_default(
            builder,
            "generation.destination_suffix",
            DEFAULT_DESTINATION_SUFFIX,
        )?;
        let mut builder = set_config_default(
            builder,
            "batch.max_concurrent_targets",
            default_max_concurrent_targets() as i64,
        )?;

        if let Ok(goroot) = std::env::var("GOROOT") {
            if !goroot.trim().is_empty() {
                builder = set_config_default(builder, "provider.goroot", goroot)?;
            }
        }

        if let Some(cache) = module_cache_from_env() {
            builder = set_config_default(builder, "provider.gomodcache", cache)?;
        }

        // Add the config file if it exists
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
        }

        // Add environment variables with FAKEFORGE_ prefix
        builder = builder.add_source(
            Environment::with_prefix("FAKEFORGE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from a TOML string, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration
    ///
    /// Precedence (lowest to highest):
    /// 1. Hardcoded defaults
    /// 2. Config file (`fakeforge.toml` in the working directory or custom --config path)
    /// 3. Environment variables (FAKEFORGE_*)
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => {
                if !p.exists() {
                    return Err(Error::config(format!(
                        "Config file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => Path::new(DEFAULT_CONFIG_FILE).to_path_buf(),
        };
        Self::from_file(&path)
    }
}
