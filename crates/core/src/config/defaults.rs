//! Default values and functions for configuration

use std::path::PathBuf;

// Default constants
pub(crate) const DEFAULT_FAKE_PREFIX: &str = "Fake";
pub(crate) const DEFAULT_DESTINATION_SUFFIX: &str = "fakes";
pub(crate) const DEFAULT_MODULE_ROOT: &str = ".";

pub(crate) fn default_module_root() -> PathBuf {
    PathBuf::from(DEFAULT_MODULE_ROOT)
}

pub(crate) fn default_include_tests() -> bool {
    true
}

pub(crate) fn default_fake_prefix() -> String {
    DEFAULT_FAKE_PREFIX.to_string()
}

pub(crate) fn default_destination_suffix() -> String {
    DEFAULT_DESTINATION_SUFFIX.to_string()
}

pub(crate) fn default_max_concurrent_targets() -> usize {
    4
}
