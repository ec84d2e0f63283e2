//! Core types for the fakeforge test-double generator
//!
//! This crate provides the foundational pieces shared by the other crates:
//!
//! - **Error handling**: the unified error taxonomy
//! - **Configuration**: provider, naming and batch settings
//! - **Namespaces**: Go import path normalization and naming helpers
//! - **Model**: the finished, rendered fake model
//! - **Requests**: what to generate

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod config;
pub mod error;
pub mod model;
pub mod namespace;
pub mod request;

// Re-export main types for convenience
pub use config::FakeforgeConfig;
pub use error::{Error, Result, ResultExt};
pub use model::{
    AliasBinding, FakeModel, GenericParam, Method, Param, Return, TargetKind, TargetMetadata,
};
pub use request::{GenerationRequest, ResolveMode};

/// Version of the core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
