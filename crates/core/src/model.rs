//! The finished fake model handed to the templating collaborator
//!
//! A model is built once by a single resolution pass and never mutated
//! afterwards. All type expressions are already rendered against the
//! model's own import list.

use serde::{Deserialize, Serialize};

/// Which kind of declaration is being faked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A named interface type
    Interface,
    /// A named function type
    Function,
    /// Every exported free function of a package
    PackageBulk,
}

/// One import line of the generated file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasBinding {
    /// Short identifier used to qualify types from this namespace
    pub alias: String,
    /// Canonical (de-vendored) import path
    pub namespace: String,
}

impl AliasBinding {
    pub fn new(alias: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            namespace: namespace.into(),
        }
    }
}

/// A type parameter of a generic target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericParam {
    pub name: String,
    /// Rendered constraint, `None` when the source gives none
    pub constraint: Option<String>,
}

/// Metadata about the faked declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetMetadata {
    pub name: String,
    pub kind: TargetKind,
    /// Canonical import path of the owning package
    pub namespace: String,
    /// Declared name of the owning package
    pub package_name: String,
    /// Alias under which the owning package is imported by the fake
    pub alias: String,
    pub type_params: Vec<GenericParam>,
}

impl TargetMetadata {
    /// Instantiation list such as `[K, V]`, empty for non-generic targets
    pub fn type_args(&self) -> String {
        if self.type_params.is_empty() {
            return String::new();
        }
        let names: Vec<&str> = self.type_params.iter().map(|p| p.name.as_str()).collect();
        format!("[{}]", names.join(", "))
    }

    /// The target as referenced from the fake, e.g. `storage.Repo[K, V]`
    pub fn qualified_name(&self) -> String {
        if self.alias.is_empty() {
            format!("{}{}", self.name, self.type_args())
        } else {
            format!("{}.{}{}", self.alias, self.name, self.type_args())
        }
    }
}

/// A parameter of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Rendered type; variadic parameters use `...T`
    #[serde(rename = "type")]
    pub ty: String,
    pub is_variadic: bool,
    pub is_slice: bool,
}

impl Param {
    /// The slice form of a variadic parameter (`...T` becomes `[]T`)
    pub fn slice_type(&self) -> String {
        match self.ty.strip_prefix("...") {
            Some(elem) => format!("[]{elem}"),
            None => self.ty.clone(),
        }
    }
}

/// A return value of a method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Return {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub is_slice: bool,
}

/// A method the fake must implement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Vec<Return>,
    /// Name of the fake type that implements this method
    pub fake_name: String,
}

/// Everything the templating collaborator needs to emit one fake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FakeModel {
    pub target: TargetMetadata,
    pub fake_name: String,
    pub destination_package: String,
    /// Imports of the generated file; the reserved binding is always first
    pub imports: Vec<AliasBinding>,
    pub methods: Vec<Method>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(type_params: Vec<GenericParam>) -> TargetMetadata {
        TargetMetadata {
            name: "Repo".to_string(),
            kind: TargetKind::Interface,
            namespace: "example.com/app/storage".to_string(),
            package_name: "storage".to_string(),
            alias: "storage".to_string(),
            type_params,
        }
    }

    #[test]
    fn test_qualified_name_plain() {
        assert_eq!(metadata(vec![]).qualified_name(), "storage.Repo");
    }

    #[test]
    fn test_qualified_name_generic() {
        let meta = metadata(vec![
            GenericParam {
                name: "K".to_string(),
                constraint: Some("comparable".to_string()),
            },
            GenericParam {
                name: "V".to_string(),
                constraint: Some("any".to_string()),
            },
        ]);
        assert_eq!(meta.type_args(), "[K, V]");
        assert_eq!(meta.qualified_name(), "storage.Repo[K, V]");
    }

    #[test]
    fn test_slice_type_of_variadic() {
        let param = Param {
            name: "args".to_string(),
            ty: "...string".to_string(),
            is_variadic: true,
            is_slice: true,
        };
        assert_eq!(param.slice_type(), "[]string");
    }

    #[test]
    fn test_model_serializes_type_field() {
        let ret = Return {
            name: "result1".to_string(),
            ty: "error".to_string(),
            is_slice: false,
        };
        let json = serde_json::to_value(&ret).expect("serialize");
        assert_eq!(json["type"], "error");
    }
}
