//! Target resolution and classification

use crate::imports::ImportRegistry;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::model::TargetKind;
use fakeforge_core::namespace::{is_exported, to_pascal_case, unvendor};
use fakeforge_core::request::ResolveMode;
use fakeforge_symbols::{
    DeclKind, Declaration, Field, InterfaceMember, InterfaceType, NamedType, NamespaceCache,
    Signature, TypeExpr, TypeParamDecl,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// How many `type X Y` hops are followed before giving up
const MAX_DEFINITION_DEPTH: usize = 32;

/// Identity of a resolved target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetInfo {
    pub name: String,
    /// Canonical import path of the owning package
    pub namespace: String,
    pub package_name: String,
    /// Alias the owning package was bound to
    pub alias: String,
    pub type_params: Vec<TypeParamDecl>,
}

/// One exported free function of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFunction {
    pub name: String,
    pub signature: Signature,
}

/// A classified target; later stages match on this once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    Interface {
        info: TargetInfo,
        interface: InterfaceType,
    },
    Function {
        info: TargetInfo,
        signature: Signature,
    },
    PackageBulk {
        info: TargetInfo,
        functions: Vec<BulkFunction>,
    },
}

impl ResolvedTarget {
    pub fn info(&self) -> &TargetInfo {
        match self {
            ResolvedTarget::Interface { info, .. }
            | ResolvedTarget::Function { info, .. }
            | ResolvedTarget::PackageBulk { info, .. } => info,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            ResolvedTarget::Interface { .. } => TargetKind::Interface,
            ResolvedTarget::Function { .. } => TargetKind::Function,
            ResolvedTarget::PackageBulk { .. } => TargetKind::PackageBulk,
        }
    }
}

/// Underlying shape of a declaration after following defined types
enum Shape {
    Interface(InterfaceType),
    Function(Signature),
    Other(String),
}

/// A declaration together with the package it was found in
struct Located {
    namespace: String,
    package_name: String,
    declaration: Declaration,
}

/// Method sets of the interfaces Go predeclares
pub(crate) fn predeclared_interface(name: &str) -> Option<InterfaceType> {
    match name {
        "any" => Some(InterfaceType::default()),
        "error" => Some(InterfaceType::new(vec![InterfaceMember::Method {
            name: "Error".to_string(),
            signature: Signature::new(vec![], vec![Field::unnamed(TypeExpr::basic("string"))]),
        }])),
        _ => None,
    }
}

/// Finds and classifies declarations through the shared namespace cache
pub struct TargetResolver<'c> {
    cache: &'c NamespaceCache,
}

impl<'c> TargetResolver<'c> {
    pub fn new(cache: &'c NamespaceCache) -> Self {
        Self { cache }
    }

    /// Resolve a request's target and bind its owning namespace
    pub fn resolve(
        &self,
        registry: &mut ImportRegistry,
        mode: ResolveMode,
        target_name: Option<&str>,
        namespace_path: &str,
    ) -> Result<ResolvedTarget> {
        match mode {
            ResolveMode::Package => self.resolve_package(registry, target_name, namespace_path),
            ResolveMode::Auto => {
                let name = target_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .ok_or_else(|| {
                        Error::invalid_input(format!(
                            "a target name is required for package {namespace_path}"
                        ))
                    })?;
                self.resolve_declaration(registry, name, namespace_path)
            }
        }
    }

    fn resolve_declaration(
        &self,
        registry: &mut ImportRegistry,
        name: &str,
        namespace_path: &str,
    ) -> Result<ResolvedTarget> {
        let located = self.locate(name, namespace_path)?;
        let shape = self.classify(&located.declaration, &[], 0)?;

        let binding = registry.bind(&located.package_name, &located.namespace);
        let info = TargetInfo {
            name: located.declaration.name.clone(),
            namespace: located.namespace,
            package_name: located.package_name,
            alias: binding.alias,
            type_params: located.declaration.type_params.clone(),
        };

        match shape {
            Shape::Interface(interface) => {
                debug!("Resolved {}.{} as an interface", info.namespace, info.name);
                Ok(ResolvedTarget::Interface { info, interface })
            }
            Shape::Function(signature) => {
                debug!("Resolved {}.{} as a function", info.namespace, info.name);
                Ok(ResolvedTarget::Function { info, signature })
            }
            Shape::Other(kind) => Err(Error::unsupported_target_kind(info.name, kind)),
        }
    }

    fn resolve_package(
        &self,
        registry: &mut ImportRegistry,
        target_name: Option<&str>,
        namespace_path: &str,
    ) -> Result<ResolvedTarget> {
        let namespace = self.cache.load(namespace_path)?;
        let unit = namespace.units.first().ok_or_else(|| {
            Error::namespace_load(&namespace.path, "package has no compilation units")
        })?;
        if !unit.is_usable() {
            return Err(Error::namespace_load(
                &namespace.path,
                format!("no usable type information: {}", unit.errors.join("; ")),
            ));
        }

        let mut candidates: Vec<&Declaration> = unit
            .declarations
            .iter()
            .filter(|d| matches!(d.kind, DeclKind::Func { receiver: None, .. }))
            .filter(|d| is_exported(&d.name))
            .collect();
        candidates.sort_by(|a, b| a.file.cmp(&b.file));

        let mut seen = HashSet::new();
        let mut functions = Vec::new();
        for decl in candidates {
            let DeclKind::Func { signature, .. } = &decl.kind else {
                continue;
            };
            if !seen.insert(decl.name.as_str()) {
                debug!("Ignoring later declaration of {} in {}", decl.name, decl.file);
                continue;
            }
            if !decl.type_params.is_empty() {
                warn!(
                    "Skipping generic function {}.{}: it cannot be an interface method",
                    namespace.path, decl.name
                );
                continue;
            }
            functions.push(BulkFunction {
                name: decl.name.clone(),
                signature: signature.clone(),
            });
        }

        let binding = registry.bind(&unit.package_name, &namespace.path);
        let name = match target_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => to_pascal_case(&unit.package_name),
        };
        debug!(
            "Resolved package {} in bulk ({} functions)",
            namespace.path,
            functions.len()
        );

        Ok(ResolvedTarget::PackageBulk {
            info: TargetInfo {
                name,
                namespace: namespace.path.clone(),
                package_name: unit.package_name.clone(),
                alias: binding.alias,
                type_params: Vec::new(),
            },
            functions,
        })
    }

    /// Resolve an embedded named type to its method-bearing interface
    ///
    /// The embedded type's namespace is bound on success.
    pub(crate) fn resolve_embedded(
        &self,
        registry: &mut ImportRegistry,
        embedded: &NamedType,
    ) -> Result<InterfaceType> {
        let located = self.locate(&embedded.name, &embedded.package.path)?;
        match self.classify(&located.declaration, &embedded.type_args, 0)? {
            Shape::Interface(interface) => {
                registry.bind(&located.package_name, &located.namespace);
                Ok(interface)
            }
            Shape::Function(_) => Err(Error::unsupported_target_kind(
                &embedded.name,
                "function type",
            )),
            Shape::Other(kind) => Err(Error::unsupported_target_kind(&embedded.name, kind)),
        }
    }

    /// Find a declaration, trying usable units in provider order
    fn locate(&self, name: &str, namespace_path: &str) -> Result<Located> {
        let namespace = self.cache.load(namespace_path)?;

        let mut usable = 0;
        for unit in &namespace.units {
            if !unit.is_usable() {
                debug!(
                    "Skipping {} ({}): {}",
                    namespace.path,
                    unit.label,
                    unit.errors.join("; ")
                );
                continue;
            }
            usable += 1;
            if let Some(declaration) = unit.lookup(name) {
                return Ok(Located {
                    namespace: namespace.path.clone(),
                    package_name: unit.package_name.clone(),
                    declaration: declaration.clone(),
                });
            }
        }

        if usable == 0 {
            let errors: Vec<String> = namespace
                .units
                .iter()
                .flat_map(|u| u.errors.iter().cloned())
                .collect();
            return Err(Error::namespace_load(
                &namespace.path,
                format!("no usable type information: {}", errors.join("; ")),
            ));
        }
        Err(Error::target_not_found(name, unvendor(namespace_path)))
    }

    fn classify(&self, decl: &Declaration, args: &[TypeExpr], depth: usize) -> Result<Shape> {
        let bindings: HashMap<String, TypeExpr> = decl
            .type_params
            .iter()
            .zip(args)
            .map(|(param, arg)| (param.name.clone(), arg.clone()))
            .collect();

        Ok(match &decl.kind {
            DeclKind::Interface(interface) => Shape::Interface(interface.substitute(&bindings)),
            DeclKind::FuncType(signature) => Shape::Function(signature.substitute(&bindings)),
            DeclKind::Func {
                receiver: None,
                signature,
            } => Shape::Function(signature.clone()),
            DeclKind::Func { .. } => Shape::Other(decl.kind.describe()),
            DeclKind::Defined(underlying) => match underlying.substitute(&bindings) {
                TypeExpr::Interface(interface) => Shape::Interface(interface),
                TypeExpr::Func(signature) => Shape::Function(signature),
                TypeExpr::Basic(name) => match predeclared_interface(&name) {
                    Some(interface) => Shape::Interface(interface),
                    None => Shape::Other(decl.kind.describe()),
                },
                TypeExpr::Named(next) => {
                    if depth >= MAX_DEFINITION_DEPTH {
                        return Ok(Shape::Other(format!(
                            "type definition chain through {} is too deep",
                            next.name
                        )));
                    }
                    let located = self.locate(&next.name, &next.package.path)?;
                    self.classify(&located.declaration, &next.type_args, depth + 1)?
                }
                _ => Shape::Other(decl.kind.describe()),
            },
        })
    }
}
