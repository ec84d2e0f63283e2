//! Abstract Go type shapes as supplied by a symbol provider
//!
//! `TypeExpr` is a closed tagged union. Providers translate whatever they parse
//! into one of its arms; shapes they cannot express become
//! [`TypeExpr::Unsupported`], which downstream rendering rejects instead of
//! guessing.

use std::collections::HashMap;
use std::fmt::{self, Display};

/// Reference to the package owning a named type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageRef {
    /// Canonical import path
    pub path: String,
    /// Declared package name, used as the preferred import alias
    pub name: String,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

/// A reference to a declared type, possibly instantiated
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub package: PackageRef,
    pub name: String,
    pub type_args: Vec<TypeExpr>,
}

impl NamedType {
    pub fn new(package: PackageRef, name: impl Into<String>) -> Self {
        Self {
            package,
            name: name.into(),
            type_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, type_args: Vec<TypeExpr>) -> Self {
        self.type_args = type_args;
        self
    }
}

/// Channel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A parameter or result slot of a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// Declared name; `None` for unnamed slots
    pub name: Option<String>,
    /// For variadic parameters this is the slice type `[]T`
    pub ty: TypeExpr,
}

impl Field {
    pub fn named(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    pub fn unnamed(ty: TypeExpr) -> Self {
        Self { name: None, ty }
    }
}

/// A callable signature
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    /// Whether the last parameter is variadic
    pub variadic: bool,
}

impl Signature {
    pub fn new(params: Vec<Field>, results: Vec<Field>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

/// A struct field; embedded fields have no name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: Option<String>,
    pub ty: TypeExpr,
    /// Tag literal including its quotes, part of the struct's identity
    pub tag: Option<String>,
}

impl StructField {
    pub fn new(name: Option<String>, ty: TypeExpr) -> Self {
        Self { name, ty, tag: None }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Length of an array type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    /// Integer literal as written, or `...`
    Literal(String),
    /// A named constant, owned by the package it is declared in
    Const(NamedType),
}

/// One term of a type-set union (`~int | string`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnionTerm {
    pub tilde: bool,
    pub ty: TypeExpr,
}

/// A member of an interface body, in source order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InterfaceMember {
    Method { name: String, signature: Signature },
    /// An embedded type; only named interfaces can be flattened
    Embedded(TypeExpr),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    pub members: Vec<InterfaceMember>,
}

impl InterfaceType {
    pub fn new(members: Vec<InterfaceMember>) -> Self {
        Self { members }
    }
}

/// Abstract type shape
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Predeclared type such as `int`, `string`, `error` or `any`
    Basic(String),
    Named(NamedType),
    /// Reference to a type parameter in scope
    TypeParam(String),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// Array type (`[4]T`, `[N]T`)
    Array { len: ArrayLen, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(Signature),
    Interface(InterfaceType),
    Struct(Vec<StructField>),
    /// Type-set union, only meaningful as a constraint
    Union(Vec<UnionTerm>),
    /// A shape the provider could not express, with a diagnostic
    Unsupported(String),
}

impl TypeExpr {
    pub fn basic(name: impl Into<String>) -> Self {
        TypeExpr::Basic(name.into())
    }

    pub fn named(path: &str, package_name: &str, name: &str) -> Self {
        TypeExpr::Named(NamedType::new(PackageRef::new(path, package_name), name))
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(elem))
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(elem))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn chan(dir: ChanDir, elem: TypeExpr) -> Self {
        TypeExpr::Chan {
            dir,
            elem: Box::new(elem),
        }
    }

    pub fn is_slice(&self) -> bool {
        matches!(self, TypeExpr::Slice(_))
    }

    /// Replace type parameter references according to `args`
    pub fn substitute(&self, args: &HashMap<String, TypeExpr>) -> TypeExpr {
        if args.is_empty() {
            return self.clone();
        }
        match self {
            TypeExpr::TypeParam(name) => args.get(name).cloned().unwrap_or_else(|| self.clone()),
            TypeExpr::Basic(_) | TypeExpr::Unsupported(_) => self.clone(),
            TypeExpr::Named(named) => TypeExpr::Named(NamedType {
                package: named.package.clone(),
                name: named.name.clone(),
                type_args: named.type_args.iter().map(|t| t.substitute(args)).collect(),
            }),
            TypeExpr::Pointer(elem) => TypeExpr::Pointer(Box::new(elem.substitute(args))),
            TypeExpr::Slice(elem) => TypeExpr::Slice(Box::new(elem.substitute(args))),
            TypeExpr::Array { len, elem } => TypeExpr::Array {
                len: len.clone(),
                elem: Box::new(elem.substitute(args)),
            },
            TypeExpr::Map { key, value } => TypeExpr::Map {
                key: Box::new(key.substitute(args)),
                value: Box::new(value.substitute(args)),
            },
            TypeExpr::Chan { dir, elem } => TypeExpr::Chan {
                dir: *dir,
                elem: Box::new(elem.substitute(args)),
            },
            TypeExpr::Func(sig) => TypeExpr::Func(sig.substitute(args)),
            TypeExpr::Interface(iface) => TypeExpr::Interface(iface.substitute(args)),
            TypeExpr::Struct(fields) => TypeExpr::Struct(
                fields
                    .iter()
                    .map(|f| StructField {
                        name: f.name.clone(),
                        ty: f.ty.substitute(args),
                        tag: f.tag.clone(),
                    })
                    .collect(),
            ),
            TypeExpr::Union(terms) => TypeExpr::Union(
                terms
                    .iter()
                    .map(|t| UnionTerm {
                        tilde: t.tilde,
                        ty: t.ty.substitute(args),
                    })
                    .collect(),
            ),
        }
    }

    /// Visit every named type and constant reachable from this expression,
    /// outermost first
    ///
    /// Inline interfaces are skipped; in parameter and result slots they are
    /// written as `any` and import nothing.
    pub fn visit_named<'a>(&'a self, visit: &mut dyn FnMut(&'a NamedType)) {
        self.walk_named(false, visit);
    }

    /// Like [`visit_named`](Self::visit_named), but also walks inline
    /// interface bodies, which a constraint spells out in full
    pub fn visit_constraint_named<'a>(&'a self, visit: &mut dyn FnMut(&'a NamedType)) {
        self.walk_named(true, visit);
    }

    fn walk_named<'a>(&'a self, interfaces: bool, visit: &mut dyn FnMut(&'a NamedType)) {
        match self {
            TypeExpr::Basic(_) | TypeExpr::TypeParam(_) | TypeExpr::Unsupported(_) => {}
            TypeExpr::Named(named) => {
                visit(named);
                for arg in &named.type_args {
                    arg.walk_named(interfaces, visit);
                }
            }
            TypeExpr::Array { len, elem } => {
                if let ArrayLen::Const(constant) = len {
                    visit(constant);
                }
                elem.walk_named(interfaces, visit);
            }
            TypeExpr::Pointer(elem) | TypeExpr::Slice(elem) | TypeExpr::Chan { elem, .. } => {
                elem.walk_named(interfaces, visit)
            }
            TypeExpr::Map { key, value } => {
                key.walk_named(interfaces, visit);
                value.walk_named(interfaces, visit);
            }
            TypeExpr::Func(sig) => sig.walk_named(interfaces, visit),
            TypeExpr::Interface(iface) => {
                if interfaces {
                    for member in &iface.members {
                        match member {
                            InterfaceMember::Method { signature, .. } => {
                                signature.walk_named(true, visit)
                            }
                            InterfaceMember::Embedded(ty) => ty.walk_named(true, visit),
                        }
                    }
                }
            }
            TypeExpr::Struct(fields) => {
                for field in fields {
                    field.ty.walk_named(interfaces, visit);
                }
            }
            TypeExpr::Union(terms) => {
                for term in terms {
                    term.ty.walk_named(interfaces, visit);
                }
            }
        }
    }
}

impl Signature {
    pub fn substitute(&self, args: &HashMap<String, TypeExpr>) -> Signature {
        let subst = |fields: &[Field]| -> Vec<Field> {
            fields
                .iter()
                .map(|f| Field {
                    name: f.name.clone(),
                    ty: f.ty.substitute(args),
                })
                .collect()
        };
        Signature {
            params: subst(&self.params),
            results: subst(&self.results),
            variadic: self.variadic,
        }
    }

    pub fn visit_named<'a>(&'a self, visit: &mut dyn FnMut(&'a NamedType)) {
        self.walk_named(false, visit);
    }

    fn walk_named<'a>(&'a self, interfaces: bool, visit: &mut dyn FnMut(&'a NamedType)) {
        for field in self.params.iter().chain(&self.results) {
            field.ty.walk_named(interfaces, visit);
        }
    }
}

impl InterfaceType {
    pub fn substitute(&self, args: &HashMap<String, TypeExpr>) -> InterfaceType {
        InterfaceType {
            members: self
                .members
                .iter()
                .map(|m| match m {
                    InterfaceMember::Method { name, signature } => InterfaceMember::Method {
                        name: name.clone(),
                        signature: signature.substitute(args),
                    },
                    InterfaceMember::Embedded(ty) => InterfaceMember::Embedded(ty.substitute(args)),
                })
                .collect(),
        }
    }
}

// Display renders source-like text with full import paths. It is meant for
// diagnostics only; the resolver's renderer produces the aliased form.

impl Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Basic(name) | TypeExpr::TypeParam(name) => write!(f, "{name}"),
            TypeExpr::Named(named) => {
                write!(f, "\"{}\".{}", named.package.path, named.name)?;
                if !named.type_args.is_empty() {
                    write!(f, "[{}]", join(&named.type_args))?;
                }
                Ok(())
            }
            TypeExpr::Pointer(elem) => write!(f, "*{elem}"),
            TypeExpr::Slice(elem) => write!(f, "[]{elem}"),
            TypeExpr::Array { len, elem } => write!(f, "[{len}]{elem}"),
            TypeExpr::Map { key, value } => write!(f, "map[{key}]{value}"),
            TypeExpr::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Recv => write!(f, "<-chan {elem}"),
            },
            TypeExpr::Func(sig) => write!(f, "func{sig}"),
            TypeExpr::Interface(iface) => {
                if iface.members.is_empty() {
                    write!(f, "interface{{}}")
                } else {
                    write!(f, "interface{{ ... }}")
                }
            }
            TypeExpr::Struct(fields) => {
                if fields.is_empty() {
                    return write!(f, "struct{{}}");
                }
                let parts: Vec<String> = fields
                    .iter()
                    .map(|field| {
                        let decl = match &field.name {
                            Some(name) => format!("{name} {}", field.ty),
                            None => field.ty.to_string(),
                        };
                        match &field.tag {
                            Some(tag) => format!("{decl} {tag}"),
                            None => decl,
                        }
                    })
                    .collect();
                write!(f, "struct{{ {} }}", parts.join("; "))
            }
            TypeExpr::Union(terms) => {
                let parts: Vec<String> = terms
                    .iter()
                    .map(|t| format!("{}{}", if t.tilde { "~" } else { "" }, t.ty))
                    .collect();
                write!(f, "{}", parts.join(" | "))
            }
            TypeExpr::Unsupported(what) => write!(f, "<unsupported: {what}>"),
        }
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.params.len().saturating_sub(1);
        let params: Vec<String> = self
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let ty = match (&p.ty, self.variadic && i == last) {
                    (TypeExpr::Slice(elem), true) => format!("...{elem}"),
                    (ty, _) => ty.to_string(),
                };
                match &p.name {
                    Some(name) => format!("{name} {ty}"),
                    None => ty,
                }
            })
            .collect();
        write!(f, "({})", params.join(", "))?;

        match self.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {}", single.ty),
            results => {
                let parts: Vec<String> = results
                    .iter()
                    .map(|r| match &r.name {
                        Some(name) => format!("{name} {}", r.ty),
                        None => r.ty.to_string(),
                    })
                    .collect();
                write!(f, " ({})", parts.join(", "))
            }
        }
    }
}

impl Display for ArrayLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayLen::Literal(len) => write!(f, "{len}"),
            ArrayLen::Const(constant) => write!(f, "\"{}\".{}", constant.package.path, constant.name),
        }
    }
}

fn join(types: &[TypeExpr]) -> String {
    types
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let sig = Signature::new(
            vec![
                Field::named("ctx", TypeExpr::named("context", "context", "Context")),
                Field::named("keys", TypeExpr::slice(TypeExpr::basic("string"))),
            ],
            vec![
                Field::unnamed(TypeExpr::basic("int")),
                Field::unnamed(TypeExpr::basic("error")),
            ],
        )
        .variadic();
        assert_eq!(
            sig.to_string(),
            "(ctx \"context\".Context, keys ...string) (int, error)"
        );
    }

    #[test]
    fn test_substitute_replaces_type_params() {
        let ty = TypeExpr::map(
            TypeExpr::TypeParam("K".to_string()),
            TypeExpr::slice(TypeExpr::TypeParam("V".to_string())),
        );
        let args = HashMap::from([
            ("K".to_string(), TypeExpr::basic("string")),
            ("V".to_string(), TypeExpr::named("io", "io", "Reader")),
        ]);
        assert_eq!(
            ty.substitute(&args),
            TypeExpr::map(
                TypeExpr::basic("string"),
                TypeExpr::slice(TypeExpr::named("io", "io", "Reader"))
            )
        );
    }

    #[test]
    fn test_visit_named_order() {
        let ty = TypeExpr::Func(Signature::new(
            vec![Field::unnamed(TypeExpr::pointer(TypeExpr::named(
                "net/http", "http", "Request",
            )))],
            vec![Field::unnamed(TypeExpr::Named(
                NamedType::new(PackageRef::new("example.com/box", "box"), "Box")
                    .with_args(vec![TypeExpr::named("time", "time", "Time")]),
            ))],
        ));
        let mut seen = Vec::new();
        ty.visit_named(&mut |n| seen.push(n.package.path.clone()));
        assert_eq!(seen, vec!["net/http", "example.com/box", "time"]);
    }
}
