//! Symbol provider boundary for fakeforge
//!
//! The resolution engine never parses source itself. It asks a
//! [`SymbolProvider`] for a [`LoadedNamespace`] and works on the abstract
//! [`TypeExpr`] shapes it returns. [`NamespaceCache`] sits in front of the
//! provider so each package is loaded once per run, and [`go::GoSourceProvider`]
//! reads Go packages from disk.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod cache;
pub mod go;
pub mod namespace;
pub mod provider;
pub mod types;

pub use cache::NamespaceCache;
pub use namespace::{CompilationUnit, DeclKind, Declaration, LoadedNamespace, TypeParamDecl};
pub use provider::{InMemoryProvider, SymbolProvider};
pub use types::{
    ArrayLen, ChanDir, Field, InterfaceMember, InterfaceType, NamedType, PackageRef, Signature,
    StructField, TypeExpr, UnionTerm,
};
