//! Resolution engine for fakeforge
//!
//! Turns a [`GenerationRequest`](fakeforge_core::GenerationRequest) into a
//! [`FakeModel`](fakeforge_core::FakeModel):
//!
//! 1. [`TargetResolver`] finds the target and classifies it once
//! 2. [`MethodSetExtractor`] flattens it into ordered methods
//! 3. [`TypeRenderer`] writes each type using aliases from the [`ImportRegistry`]
//! 4. [`FakeModelAssembler`] packages the result
//!
//! [`run_batch`] drives many requests concurrently over one shared
//! [`NamespaceCache`](fakeforge_symbols::NamespaceCache).

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod assembler;
pub mod batch;
pub mod imports;
pub mod methods;
pub mod render;
pub mod target;

pub use assembler::FakeModelAssembler;
pub use batch::{run_batch, BatchOutcome};
pub use imports::{unique_alias, ImportRegistry};
pub use methods::MethodSetExtractor;
pub use render::TypeRenderer;
pub use target::{BulkFunction, ResolvedTarget, TargetInfo, TargetResolver};
