//! Fake model assembly for one generation request

use crate::imports::ImportRegistry;
use crate::methods::{slot_names, MethodSetExtractor};
use crate::render::TypeRenderer;
use crate::target::TargetResolver;
use fakeforge_core::config::FakeforgeConfig;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::model::{FakeModel, GenericParam, Method, TargetMetadata};
use fakeforge_core::request::GenerationRequest;
use fakeforge_symbols::{NamespaceCache, TypeParamDecl};
use tracing::info;

/// Runs one resolution pass and produces an immutable [`FakeModel`]
///
/// An assembler owns a fresh [`ImportRegistry`] and is consumed by
/// [`assemble`](Self::assemble), so aliases never leak between generated
/// files. The namespace cache may be shared freely.
pub struct FakeModelAssembler<'c> {
    cache: &'c NamespaceCache,
    config: &'c FakeforgeConfig,
    registry: ImportRegistry,
}

impl<'c> FakeModelAssembler<'c> {
    pub fn new(cache: &'c NamespaceCache, config: &'c FakeforgeConfig) -> Self {
        Self {
            cache,
            config,
            registry: ImportRegistry::new(),
        }
    }

    pub fn assemble(mut self, request: &GenerationRequest) -> Result<FakeModel> {
        for (namespace, alias) in &request.alias_overrides {
            self.registry.prefer(namespace, alias);
        }

        let resolver = TargetResolver::new(self.cache);
        let target = resolver.resolve(
            &mut self.registry,
            request.mode,
            request.target_name.as_deref(),
            &request.namespace_path,
        )?;
        let info = target.info();

        let fake_name = match request.fake_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.config.fake_name_for(&info.name),
        };

        let mut methods =
            MethodSetExtractor::new(&resolver, &mut self.registry, &fake_name).extract(&target)?;
        let type_params = self.generic_params(&info.name, &info.type_params)?;
        self.rename_alias_collisions(&mut methods);

        let destination_package = match request.destination_package.as_deref().map(str::trim) {
            Some(dest) if !dest.is_empty() => dest.to_string(),
            _ => self.config.destination_for(&info.package_name),
        };

        info!(
            "Assembled {fake_name} for {}.{} ({} methods, {} imports)",
            info.namespace,
            info.name,
            methods.len(),
            self.registry.len()
        );

        Ok(FakeModel {
            target: TargetMetadata {
                name: info.name.clone(),
                kind: target.kind(),
                namespace: info.namespace.clone(),
                package_name: info.package_name.clone(),
                alias: info.alias.clone(),
                type_params,
            },
            fake_name,
            destination_package,
            imports: self.registry.bindings(),
            methods,
        })
    }

    /// Render type parameter constraints, binding the packages they mention
    fn generic_params(&mut self, target: &str, params: &[TypeParamDecl]) -> Result<Vec<GenericParam>> {
        for param in params {
            if let Some(constraint) = &param.constraint {
                let mut referenced = Vec::new();
                constraint.visit_constraint_named(&mut |n| referenced.push(n.package.clone()));
                for package in referenced {
                    self.registry.bind(&package.name, &package.path);
                }
            }
        }

        let renderer = TypeRenderer::for_constraints(&self.registry);
        params
            .iter()
            .map(|param| {
                let constraint = match &param.constraint {
                    Some(ty) => Some(renderer.render_constraint(ty).map_err(|e| {
                        Error::unresolvable_type(
                            target,
                            format!("[{} {ty}]", param.name),
                            e.to_string(),
                        )
                    })?),
                    None => None,
                };
                Ok(GenericParam {
                    name: param.name.clone(),
                    constraint,
                })
            })
            .collect()
    }

    /// Replace slot names that shadow an import alias bound after the method
    fn rename_alias_collisions(&self, methods: &mut [Method]) {
        for method in methods {
            let current = |names: Vec<&String>| -> Vec<Option<String>> {
                names.into_iter().cloned().map(Some).collect()
            };
            let (params, results) = slot_names(
                &current(method.params.iter().map(|p| &p.name).collect()),
                &current(method.returns.iter().map(|r| &r.name).collect()),
                |name| self.registry.is_alias_taken(name),
            );
            for (param, name) in method.params.iter_mut().zip(params) {
                param.name = name;
            }
            for (ret, name) in method.returns.iter_mut().zip(results) {
                ret.name = name;
            }
        }
    }
}
