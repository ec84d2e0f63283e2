//! Rendering abstract types as Go source text

use crate::imports::ImportRegistry;
use fakeforge_core::error::{Error, Result};
use fakeforge_core::namespace::is_exported;
use fakeforge_symbols::{
    ArrayLen, ChanDir, Field, InterfaceMember, InterfaceType, NamedType, Signature, StructField,
    TypeExpr, UnionTerm,
};

/// Renders types using the aliases of an import registry
///
/// The renderer never binds anything itself; namespaces must be registered
/// before a type mentioning them is rendered. A named type whose namespace
/// has no binding is written unqualified.
#[derive(Debug, Clone, Copy)]
pub struct TypeRenderer<'r> {
    registry: &'r ImportRegistry,
    /// Spell inline interfaces out instead of writing `any`
    interface_literals: bool,
}

impl<'r> TypeRenderer<'r> {
    /// Renderer for parameter and result slots
    pub fn new(registry: &'r ImportRegistry) -> Self {
        Self {
            registry,
            interface_literals: false,
        }
    }

    /// Renderer for type parameter constraints, where an inline interface
    /// defines the type set and must be written in full
    pub fn for_constraints(registry: &'r ImportRegistry) -> Self {
        Self {
            registry,
            interface_literals: true,
        }
    }

    /// Render a constraint; `interface{ ~int | ~string }` collapses to its
    /// single union or named element
    pub fn render_constraint(&self, ty: &TypeExpr) -> Result<String> {
        if let TypeExpr::Interface(iface) = ty {
            if let [InterfaceMember::Embedded(
                elem @ (TypeExpr::Union(_) | TypeExpr::Named(_) | TypeExpr::Basic(_)),
            )] = iface.members.as_slice()
            {
                let collapsed = self.render(elem)?;
                // `[T *int]` would read as an array length
                if !collapsed.starts_with('*') {
                    return Ok(collapsed);
                }
            }
        }
        self.render(ty)
    }

    pub fn render(&self, ty: &TypeExpr) -> Result<String> {
        Ok(match ty {
            TypeExpr::Basic(name) | TypeExpr::TypeParam(name) => name.clone(),
            TypeExpr::Named(named) => {
                let mut out = self.qualify(named);
                if !named.type_args.is_empty() {
                    out.push('[');
                    out.push_str(&self.render_list(&named.type_args)?);
                    out.push(']');
                }
                out
            }
            TypeExpr::Pointer(elem) => format!("*{}", self.render(elem)?),
            TypeExpr::Slice(elem) => format!("[]{}", self.render(elem)?),
            TypeExpr::Array { len, elem } => {
                format!("[{}]{}", self.render_len(len)?, self.render(elem)?)
            }
            TypeExpr::Map { key, value } => {
                format!("map[{}]{}", self.render(key)?, self.render(value)?)
            }
            TypeExpr::Chan { dir, elem } => self.render_chan(*dir, elem)?,
            TypeExpr::Func(sig) => format!("func{}", self.render_signature(sig)?),
            TypeExpr::Interface(iface) if self.interface_literals => {
                self.render_interface(iface)?
            }
            TypeExpr::Interface(_) => "any".to_string(),
            TypeExpr::Struct(fields) => self.render_struct(fields)?,
            TypeExpr::Union(terms) => self.render_union(terms)?,
            TypeExpr::Unsupported(what) => return Err(Error::unsupported_type(what.clone())),
        })
    }

    /// Render a parameter type; a variadic slot `[]T` becomes `...T`
    pub fn render_param(&self, ty: &TypeExpr, variadic: bool) -> Result<String> {
        if !variadic {
            return self.render(ty);
        }
        match ty {
            TypeExpr::Slice(elem) => Ok(format!("...{}", self.render(elem)?)),
            other => Err(Error::unsupported_type(format!(
                "variadic parameter of non-slice type {other}"
            ))),
        }
    }

    /// Render a signature without parameter names: `(int, ...string) error`
    pub fn render_signature(&self, sig: &Signature) -> Result<String> {
        let last = sig.params.len().saturating_sub(1);
        let params = sig
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| self.render_param(&p.ty, sig.variadic && i == last))
            .collect::<Result<Vec<_>>>()?;

        let mut out = format!("({})", params.join(", "));
        match sig.results.as_slice() {
            [] => {}
            [single] => {
                out.push(' ');
                out.push_str(&self.render(&single.ty)?);
            }
            results => {
                out.push_str(" (");
                out.push_str(&self.render_fields(results)?);
                out.push(')');
            }
        }
        Ok(out)
    }

    fn qualify(&self, named: &NamedType) -> String {
        match self.registry.alias_for(&named.package.path) {
            Some(alias) if !alias.is_empty() => format!("{alias}.{}", named.name),
            _ => named.name.clone(),
        }
    }

    fn render_len(&self, len: &ArrayLen) -> Result<String> {
        match len {
            ArrayLen::Literal(len) => Ok(len.clone()),
            ArrayLen::Const(constant) if is_exported(&constant.name) => Ok(self.qualify(constant)),
            ArrayLen::Const(constant) => Err(Error::unsupported_type(format!(
                "array length uses unexported constant {}.{}",
                constant.package.name, constant.name
            ))),
        }
    }

    fn render_interface(&self, iface: &InterfaceType) -> Result<String> {
        if iface.members.is_empty() {
            return Ok("any".to_string());
        }
        let parts = iface
            .members
            .iter()
            .map(|member| match member {
                InterfaceMember::Method { name, signature } => {
                    Ok(format!("{name}{}", self.render_signature(signature)?))
                }
                InterfaceMember::Embedded(ty) => self.render(ty),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("interface{{ {} }}", parts.join("; ")))
    }

    fn render_fields(&self, fields: &[Field]) -> Result<String> {
        let parts = fields
            .iter()
            .map(|f| self.render(&f.ty))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn render_list(&self, types: &[TypeExpr]) -> Result<String> {
        let parts = types
            .iter()
            .map(|t| self.render(t))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    fn render_chan(&self, dir: ChanDir, elem: &TypeExpr) -> Result<String> {
        let inner = self.render(elem)?;
        Ok(match dir {
            // `chan <-chan T` would parse as `chan<- chan T`
            ChanDir::Both if matches!(elem, TypeExpr::Chan { dir: ChanDir::Recv, .. }) => {
                format!("chan ({inner})")
            }
            ChanDir::Both => format!("chan {inner}"),
            ChanDir::Send => format!("chan<- {inner}"),
            ChanDir::Recv => format!("<-chan {inner}"),
        })
    }

    fn render_struct(&self, fields: &[StructField]) -> Result<String> {
        if fields.is_empty() {
            return Ok("struct{}".to_string());
        }
        let parts = fields
            .iter()
            .map(|f| {
                let ty = self.render(&f.ty)?;
                let decl = match &f.name {
                    Some(name) => format!("{name} {ty}"),
                    None => ty,
                };
                Ok(match &f.tag {
                    Some(tag) => format!("{decl} {tag}"),
                    None => decl,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("struct{{ {} }}", parts.join("; ")))
    }

    fn render_union(&self, terms: &[UnionTerm]) -> Result<String> {
        let parts = terms
            .iter()
            .map(|t| {
                let ty = self.render(&t.ty)?;
                Ok(if t.tilde { format!("~{ty}") } else { ty })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(" | "))
    }
}
