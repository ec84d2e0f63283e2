//! Flattening targets into the ordered methods a fake implements

use crate::imports::{unique_alias, ImportRegistry};
use crate::render::TypeRenderer;
use crate::target::{predeclared_interface, ResolvedTarget, TargetResolver};
use fakeforge_core::error::{Error, Result};
use fakeforge_core::model::{Method, Param, Return};
use fakeforge_symbols::{Field, InterfaceMember, InterfaceType, NamedType, Signature, TypeExpr};
use std::collections::HashSet;
use tracing::debug;

/// Builds the method list of a resolved target
///
/// Namespaces referenced by a method are bound in the registry before the
/// method is rendered, so aliases are assigned in method order.
pub struct MethodSetExtractor<'a, 'c> {
    resolver: &'a TargetResolver<'c>,
    registry: &'a mut ImportRegistry,
    fake_name: &'a str,
}

impl<'a, 'c> MethodSetExtractor<'a, 'c> {
    pub fn new(
        resolver: &'a TargetResolver<'c>,
        registry: &'a mut ImportRegistry,
        fake_name: &'a str,
    ) -> Self {
        Self {
            resolver,
            registry,
            fake_name,
        }
    }

    pub fn extract(&mut self, target: &ResolvedTarget) -> Result<Vec<Method>> {
        let signatures = match target {
            ResolvedTarget::Interface { info, interface } => {
                let mut flat = Flattened::default();
                let root = format!("{}.{}", info.namespace, info.name);
                flat.stack.push(root);
                self.flatten(&info.name, interface, &mut flat)?;
                flat.methods
            }
            ResolvedTarget::Function { info, signature } => {
                vec![(info.name.clone(), signature.clone())]
            }
            ResolvedTarget::PackageBulk { functions, .. } => functions
                .iter()
                .map(|f| (f.name.clone(), f.signature.clone()))
                .collect(),
        };

        signatures
            .iter()
            .map(|(name, signature)| self.build_method(name, signature))
            .collect()
    }

    fn flatten(&mut self, owner: &str, interface: &InterfaceType, flat: &mut Flattened) -> Result<()> {
        for member in &interface.members {
            match member {
                InterfaceMember::Method { name, signature } => {
                    if flat.seen.insert(name.clone()) {
                        flat.methods.push((name.clone(), signature.clone()));
                    } else {
                        debug!("Dropping duplicate method {name} reached through {owner}");
                    }
                }
                InterfaceMember::Embedded(TypeExpr::Named(named)) => {
                    self.flatten_embedded(owner, named, flat)?;
                }
                InterfaceMember::Embedded(TypeExpr::Basic(name)) => {
                    match predeclared_interface(name) {
                        Some(builtin) => self.flatten(name, &builtin, flat)?,
                        None => return Err(Error::unresolvable_embedding(owner, name.clone())),
                    }
                }
                InterfaceMember::Embedded(other) => {
                    return Err(Error::unresolvable_embedding(owner, other.to_string()));
                }
            }
        }
        Ok(())
    }

    fn flatten_embedded(&mut self, owner: &str, named: &NamedType, flat: &mut Flattened) -> Result<()> {
        let member = format!("{}.{}", named.package.name, named.name);
        let key = format!("{}.{}", named.package.path, named.name);
        if flat.stack.contains(&key) {
            return Err(Error::unresolvable_embedding(
                owner,
                format!("{member} (embedding cycle)"),
            ));
        }

        let embedded = self
            .resolver
            .resolve_embedded(self.registry, named)
            .map_err(|e| match e {
                Error::TargetNotFound { .. } | Error::UnsupportedTargetKind { .. } => {
                    Error::unresolvable_embedding(owner, format!("{member}: {e}"))
                }
                other => other,
            })?;

        flat.stack.push(key);
        self.flatten(&named.name, &embedded, flat)?;
        flat.stack.pop();
        Ok(())
    }

    fn build_method(&mut self, name: &str, signature: &Signature) -> Result<Method> {
        let mut referenced = Vec::new();
        signature.visit_named(&mut |n| referenced.push(n.package.clone()));
        for package in referenced {
            self.registry.bind(&package.name, &package.path);
        }

        let renderer = TypeRenderer::new(self.registry);
        let fail = |e: Error| Error::unresolvable_type(name, signature.to_string(), e.to_string());

        let declared = |fields: &[Field]| -> Vec<Option<String>> {
            fields.iter().map(|f| f.name.clone()).collect()
        };
        let (param_names, result_names) = slot_names(
            &declared(&signature.params),
            &declared(&signature.results),
            |candidate| self.registry.is_alias_taken(candidate),
        );

        let last = signature.params.len().saturating_sub(1);
        let params = signature
            .params
            .iter()
            .zip(param_names)
            .enumerate()
            .map(|(i, (field, slot))| {
                let is_variadic = signature.variadic && i == last;
                Ok(Param {
                    name: slot,
                    ty: renderer.render_param(&field.ty, is_variadic).map_err(fail)?,
                    is_variadic,
                    is_slice: field.ty.is_slice(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let returns = signature
            .results
            .iter()
            .zip(result_names)
            .map(|(field, slot)| {
                Ok(Return {
                    name: slot,
                    ty: renderer.render(&field.ty).map_err(fail)?,
                    is_slice: field.ty.is_slice(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Method {
            name: name.to_string(),
            params,
            returns,
            fake_name: self.fake_name.to_string(),
        })
    }
}

#[derive(Default)]
struct Flattened {
    methods: Vec<(String, Signature)>,
    seen: HashSet<String>,
    /// Embedding path from the target, as `path.Name`
    stack: Vec<String>,
}

/// Name every parameter and result slot of one method
///
/// Declared names are kept unless blank, repeated or shadowing an import
/// alias. Other slots get `argN` / `resultN`, suffixed until no other slot
/// of the method or alias uses the name.
pub(crate) fn slot_names(
    params: &[Option<String>],
    results: &[Option<String>],
    alias_taken: impl Fn(&str) -> bool,
) -> (Vec<String>, Vec<String>) {
    let mut used: HashSet<String> = HashSet::new();
    let kept: Vec<Option<String>> = params
        .iter()
        .chain(results)
        .map(|name| match name.as_deref() {
            Some(name)
                if !name.is_empty()
                    && name != "_"
                    && !alias_taken(name)
                    && used.insert(name.to_string()) =>
            {
                Some(name.to_string())
            }
            _ => None,
        })
        .collect();

    let mut names = Vec::with_capacity(kept.len());
    for (slot, name) in kept.into_iter().enumerate() {
        let name = match name {
            Some(name) => name,
            None => {
                let candidate = if slot < params.len() {
                    synthesized_name("arg", slot)
                } else {
                    synthesized_name("result", slot - params.len())
                };
                let is_taken = |c: &str| used.contains(c) || alias_taken(c);
                let name = if is_taken(candidate.as_str()) {
                    unique_alias(&candidate, is_taken)
                } else {
                    candidate
                };
                used.insert(name.clone());
                name
            }
        };
        names.push(name);
    }
    let results = names.split_off(params.len());
    (names, results)
}

fn synthesized_name(prefix: &str, index: usize) -> String {
    format!("{prefix}{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fakeforge_core::request::ResolveMode;
    use fakeforge_symbols::{
        CompilationUnit, DeclKind, Declaration, InMemoryProvider, LoadedNamespace, NamespaceCache,
        PackageRef,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn method(name: &str, signature: Signature) -> InterfaceMember {
        InterfaceMember::Method {
            name: name.to_string(),
            signature,
        }
    }

    fn iface(name: &str, members: Vec<InterfaceMember>) -> Declaration {
        Declaration::new(name, "io.go", DeclKind::Interface(InterfaceType::new(members)))
    }

    fn embed(name: &str) -> InterfaceMember {
        InterfaceMember::Embedded(TypeExpr::named("example.com/rw", "rw", name))
    }

    fn cache(unit: CompilationUnit) -> NamespaceCache {
        let provider =
            InMemoryProvider::new().with(LoadedNamespace::new("example.com/rw", vec![unit]));
        NamespaceCache::new(Arc::new(provider))
    }

    fn extract(cache: &NamespaceCache, target: &str) -> Result<Vec<Method>> {
        let resolver = TargetResolver::new(cache);
        let mut registry = ImportRegistry::new();
        let resolved = resolver.resolve(
            &mut registry,
            ResolveMode::Auto,
            Some(target),
            "example.com/rw",
        )?;
        MethodSetExtractor::new(&resolver, &mut registry, "FakeTarget").extract(&resolved)
    }

    fn names(methods: &[Method]) -> Vec<&str> {
        methods.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_first_declared_duplicate_wins() {
        let close_a = Signature::new(vec![], vec![Field::unnamed(TypeExpr::basic("error"))]);
        let close_b = Signature::new(
            vec![Field::named("force", TypeExpr::basic("bool"))],
            vec![Field::unnamed(TypeExpr::basic("error"))],
        );
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface(
                "Reader",
                vec![method("Read", Signature::default()), method("Close", close_a)],
            ))
            .with_declaration(iface(
                "Writer",
                vec![method("Write", Signature::default()), method("Close", close_b)],
            ))
            .with_declaration(iface(
                "ReadWriter",
                vec![embed("Reader"), embed("Writer"), method("Flush", Signature::default())],
            ));

        let methods = extract(&cache(unit), "ReadWriter").expect("extract");
        assert_eq!(names(&methods), vec!["Read", "Close", "Write", "Flush"]);
        // Reader's Close, not Writer's
        assert!(methods[1].params.is_empty());
    }

    #[test]
    fn test_variadic_only_on_last_param() {
        let strings = TypeExpr::slice(TypeExpr::basic("string"));
        let sig = Signature::new(
            vec![
                Field::named("prefix", strings.clone()),
                Field::named("rest", strings),
            ],
            vec![],
        )
        .variadic();
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("Joiner", vec![method("Join", sig)]));

        let methods = extract(&cache(unit), "Joiner").expect("extract");
        let params = &methods[0].params;
        assert_eq!(params[0].ty, "[]string");
        assert!(!params[0].is_variadic);
        assert!(params[0].is_slice);
        assert_eq!(params[1].ty, "...string");
        assert!(params[1].is_variadic);
        assert_eq!(params[1].slice_type(), "[]string");
    }

    #[test]
    fn test_slot_names_are_synthesized() {
        let sig = Signature::new(
            vec![
                Field::unnamed(TypeExpr::basic("int")),
                Field::named("_", TypeExpr::basic("int")),
            ],
            vec![Field::unnamed(TypeExpr::basic("error"))],
        );
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("Adder", vec![method("Add", sig)]));

        let methods = extract(&cache(unit), "Adder").expect("extract");
        let param_names: Vec<&str> = methods[0].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(param_names, vec!["arg1", "arg2"]);
        assert_eq!(methods[0].returns[0].name, "result1");
        assert_eq!(methods[0].fake_name, "FakeTarget");
    }

    #[test]
    fn test_synthesized_names_avoid_declared_ones() {
        let sig = Signature::new(
            vec![
                Field::named("_", TypeExpr::basic("int")),
                Field::named("arg1", TypeExpr::basic("string")),
            ],
            vec![
                Field::unnamed(TypeExpr::basic("int")),
                Field::named("result1", TypeExpr::basic("error")),
            ],
        );
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("Doer", vec![method("Do", sig)]));

        let methods = extract(&cache(unit), "Doer").expect("extract");
        let param_names: Vec<&str> = methods[0].params.iter().map(|p| p.name.as_str()).collect();
        let result_names: Vec<&str> = methods[0].returns.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(param_names, vec!["arg1a", "arg1"]);
        assert_eq!(result_names, vec!["result1a", "result1"]);
    }

    #[test]
    fn test_slot_names_skip_aliases_and_each_other() {
        let declared = |names: &[Option<&str>]| -> Vec<Option<String>> {
            names.iter().map(|n| n.map(str::to_string)).collect()
        };
        let (params, results) = slot_names(
            &declared(&[Some("rw"), Some("arg1"), None]),
            &declared(&[Some("arg3"), None]),
            |name| matches!(name, "rw" | "arg2" | "arg1a"),
        );
        assert_eq!(params, vec!["arg1b", "arg1", "arg3a"]);
        assert_eq!(results, vec!["arg3", "result2"]);
    }

    #[test]
    fn test_embedding_cycle_is_rejected() {
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("A", vec![embed("B")]))
            .with_declaration(iface("B", vec![embed("A")]));
        let err = extract(&cache(unit), "A").unwrap_err();
        assert!(matches!(err, Error::UnresolvableEmbedding { .. }), "{err}");
    }

    #[test]
    fn test_embedding_a_struct_is_rejected() {
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("A", vec![embed("Data")]))
            .with_declaration(Declaration::new(
                "Data",
                "io.go",
                DeclKind::Defined(TypeExpr::Struct(vec![])),
            ));
        let err = extract(&cache(unit), "A").unwrap_err();
        assert!(
            matches!(err, Error::UnresolvableEmbedding { ref target, .. } if target == "A"),
            "{err}"
        );
    }

    #[test]
    fn test_missing_embedded_interface_is_rejected() {
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("A", vec![embed("Ghost")]));
        let err = extract(&cache(unit), "A").unwrap_err();
        assert!(matches!(err, Error::UnresolvableEmbedding { .. }), "{err}");
    }

    #[test]
    fn test_embedding_error_adds_error_method() {
        let unit = CompilationUnit::new("rw", "package").with_declaration(iface(
            "Coded",
            vec![
                InterfaceMember::Embedded(TypeExpr::basic("error")),
                method(
                    "Code",
                    Signature::new(vec![], vec![Field::unnamed(TypeExpr::basic("int"))]),
                ),
            ],
        ));
        let methods = extract(&cache(unit), "Coded").expect("extract");
        assert_eq!(names(&methods), vec!["Error", "Code"]);
        assert_eq!(methods[0].returns[0].ty, "string");
    }

    #[test]
    fn test_unsupported_type_names_method() {
        let sig = Signature::new(
            vec![Field::named("w", TypeExpr::Unsupported("undefined: Widget".to_string()))],
            vec![],
        );
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(iface("Painter", vec![method("Paint", sig)]));
        let err = extract(&cache(unit), "Painter").unwrap_err();
        match err {
            Error::UnresolvableType {
                method, reason, ..
            } => {
                assert_eq!(method, "Paint");
                assert!(reason.contains("undefined: Widget"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_generic_embedding_is_substituted() {
        let getter = Declaration::new(
            "Getter",
            "io.go",
            DeclKind::Interface(InterfaceType::new(vec![method(
                "Get",
                Signature::new(vec![], vec![Field::unnamed(TypeExpr::TypeParam("T".to_string()))]),
            )])),
        )
        .with_type_params(vec![fakeforge_symbols::TypeParamDecl::new(
            "T",
            Some(TypeExpr::basic("any")),
        )]);
        let embedded = NamedType::new(PackageRef::new("example.com/rw", "rw"), "Getter")
            .with_args(vec![TypeExpr::basic("string")]);
        let unit = CompilationUnit::new("rw", "package")
            .with_declaration(getter)
            .with_declaration(iface(
                "StringGetter",
                vec![InterfaceMember::Embedded(TypeExpr::Named(embedded))],
            ));

        let methods = extract(&cache(unit), "StringGetter").expect("extract");
        assert_eq!(methods[0].returns[0].ty, "string");
    }
}
