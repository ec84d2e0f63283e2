//! Loaded namespace representation returned by symbol providers

use crate::types::{InterfaceType, Signature, TypeExpr};

/// A declared type parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParamDecl {
    pub name: String,
    pub constraint: Option<TypeExpr>,
}

impl TypeParamDecl {
    pub fn new(name: impl Into<String>, constraint: Option<TypeExpr>) -> Self {
        Self {
            name: name.into(),
            constraint,
        }
    }
}

/// Shape of a top-level declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    /// `type X interface { ... }`
    Interface(InterfaceType),
    /// `type X func(...)`
    FuncType(Signature),
    /// `type X T` or `type X = T` for any other `T`
    Defined(TypeExpr),
    /// `func F(...)` or, with a receiver, `func (r T) M(...)`
    Func {
        receiver: Option<TypeExpr>,
        signature: Signature,
    },
}

impl DeclKind {
    /// Short description used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            DeclKind::Interface(_) => "interface type".to_string(),
            DeclKind::FuncType(_) => "function type".to_string(),
            DeclKind::Func { receiver: None, .. } => "function declaration".to_string(),
            DeclKind::Func { .. } => "method declaration".to_string(),
            DeclKind::Defined(ty) => describe_type(ty),
        }
    }
}

fn describe_type(ty: &TypeExpr) -> String {
    match ty {
        TypeExpr::Basic(name) => format!("defined type over {name}"),
        TypeExpr::Named(named) => format!("defined type over {}", named.name),
        TypeExpr::TypeParam(_) => "type parameter".to_string(),
        TypeExpr::Pointer(_) => "pointer type".to_string(),
        TypeExpr::Slice(_) => "slice type".to_string(),
        TypeExpr::Array { .. } => "array type".to_string(),
        TypeExpr::Map { .. } => "map type".to_string(),
        TypeExpr::Chan { .. } => "channel type".to_string(),
        TypeExpr::Func(_) => "function type".to_string(),
        TypeExpr::Interface(_) => "interface type".to_string(),
        TypeExpr::Struct(_) => "struct type".to_string(),
        TypeExpr::Union(_) => "type set".to_string(),
        TypeExpr::Unsupported(what) => format!("unsupported type ({what})"),
    }
}

/// A top-level declaration in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    /// File the declaration came from
    pub file: String,
    pub type_params: Vec<TypeParamDecl>,
    pub kind: DeclKind,
}

impl Declaration {
    pub fn new(name: impl Into<String>, file: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            type_params: Vec::new(),
            kind,
        }
    }

    pub fn with_type_params(mut self, type_params: Vec<TypeParamDecl>) -> Self {
        self.type_params = type_params;
        self
    }

    pub fn is_method(&self) -> bool {
        matches!(
            self.kind,
            DeclKind::Func {
                receiver: Some(_),
                ..
            }
        )
    }
}

/// One compilation of a package's files
///
/// A directory may compile in several ways (with or without its tests), so a
/// namespace holds a list of units in the order they should be searched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationUnit {
    /// Declared package name
    pub package_name: String,
    /// What this unit covers, e.g. `package` or `package+tests`
    pub label: String,
    pub declarations: Vec<Declaration>,
    /// Errors that prevented type information from being produced
    pub errors: Vec<String>,
}

impl CompilationUnit {
    pub fn new(package_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            label: label.into(),
            declarations: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn with_declaration(mut self, declaration: Declaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Whether type information is available for this unit
    pub fn is_usable(&self) -> bool {
        self.errors.is_empty()
    }

    /// Find a package-level declaration by name; methods are never matched
    pub fn lookup(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|d| d.name == name && !d.is_method())
    }
}

/// Everything a provider knows about one import path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedNamespace {
    /// Canonical import path
    pub path: String,
    pub units: Vec<CompilationUnit>,
}

impl LoadedNamespace {
    pub fn new(path: impl Into<String>, units: Vec<CompilationUnit>) -> Self {
        Self {
            path: path.into(),
            units,
        }
    }

    /// Declared package name, taken from the first unit
    pub fn package_name(&self) -> Option<&str> {
        self.units.first().map(|u| u.package_name.as_str())
    }
}
