//! Go source parsing with tree-sitter
//!
//! Files are parsed once, then converted into [`Declaration`]s with every
//! identifier resolved: predeclared names, type parameters, package-level
//! types, dot imports and qualified references through the file's imports.

use crate::namespace::{DeclKind, Declaration, TypeParamDecl};
use crate::types::{
    ArrayLen, ChanDir, Field, InterfaceMember, InterfaceType, NamedType, PackageRef, Signature,
    StructField, TypeExpr, UnionTerm,
};
use fakeforge_core::error::{Error, Result};
use std::collections::{HashMap, HashSet};
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

/// Identifiers that name predeclared types
const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

/// One import spec as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name: an alias, `.` or `_`
    pub name: Option<String>,
    pub path: String,
}

/// A parsed Go file
pub struct ParsedFile {
    pub file_name: String,
    pub source: String,
    pub tree: Tree,
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("file_name", &self.file_name)
            .field("package_name", &self.package_name)
            .field("imports", &self.imports)
            .finish()
    }
}

impl ParsedFile {
    pub fn parse(file_name: &str, source: String) -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|e| Error::parse(file_name, format!("Failed to load Go grammar: {e}")))?;
        let tree = parser
            .parse(&source, None)
            .ok_or_else(|| Error::parse(file_name, "parser produced no tree"))?;

        let root = tree.root_node();
        let package_name = package_clause(root, &source)
            .ok_or_else(|| Error::parse(file_name, "missing package clause"))?;
        let imports = parse_imports(root, &source);

        Ok(Self {
            file_name: file_name.to_string(),
            source,
            tree,
            package_name,
            imports,
        })
    }

    pub fn is_test(&self) -> bool {
        self.file_name.ends_with("_test.go")
    }

    /// Location of the first syntax error, if any
    pub fn syntax_error(&self) -> Option<String> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }
        let node = first_error(root).unwrap_or(root);
        let pos = node.start_position();
        Some(format!(
            "syntax error in {} at {}:{}",
            self.file_name,
            pos.row + 1,
            pos.column + 1
        ))
    }

    /// Whether the file opts out of every build with `//go:build ignore`
    pub fn is_build_ignored(&self) -> bool {
        self.source
            .lines()
            .take_while(|line| !line.trim_start().starts_with("package "))
            .any(|line| {
                let line = line.trim();
                line == "//go:build ignore" || line == "// +build ignore"
            })
    }

    /// Names of all package-level type declarations
    pub fn type_names(&self) -> Vec<String> {
        let root = self.tree.root_node();
        let mut names = Vec::new();
        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            if decl.kind() != "type_declaration" {
                continue;
            }
            let mut inner = decl.walk();
            for spec in decl.named_children(&mut inner) {
                if matches!(spec.kind(), "type_spec" | "type_alias") {
                    if let Some(name) = spec.child_by_field_name("name") {
                        names.push(self.text(name).to_string());
                    }
                }
            }
        }
        names
    }

    fn text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or_default()
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

fn package_clause(root: Node, source: &str) -> Option<String> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_clause")?;
    let mut inner = clause.walk();
    let name = clause
        .named_children(&mut inner)
        .find(|n| n.kind() == "package_identifier")?;
    name.utf8_text(source.as_bytes()).ok().map(str::to_string)
}

/// Parse import specs
///
/// Handles:
/// - `import "io"` → (None, "io")
/// - `import r "io"` → (Some("r"), "io")
/// - `import . "io"` → (Some("."), "io")
/// - `import _ "embed"` → (Some("_"), "embed")
fn parse_imports(root: Node, source: &str) -> Vec<ImportSpec> {
    let mut imports = Vec::new();

    let language = tree_sitter_go::LANGUAGE.into();
    let query = match Query::new(&language, "(import_spec) @spec") {
        Ok(q) => q,
        Err(_) => return imports,
    };

    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, source.as_bytes());

    while let Some(query_match) = matches.next() {
        for capture in query_match.captures {
            let spec = capture.node;
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let Ok(raw_path) = path_node.utf8_text(source.as_bytes()) else {
                continue;
            };
            let path = raw_path.trim_matches(|c| c == '"' || c == '`').to_string();
            let name = spec
                .child_by_field_name("name")
                .and_then(|n| n.utf8_text(source.as_bytes()).ok())
                .map(str::to_string);
            imports.push(ImportSpec { name, path });
        }
    }

    imports
}

/// A dot-imported package and the type names it declares
#[derive(Debug, Clone)]
pub struct DotImport {
    pub package: PackageRef,
    pub type_names: HashSet<String>,
}

/// Name resolution scope for one file
#[derive(Debug, Clone)]
pub struct FileScope<'a> {
    pub package: &'a PackageRef,
    /// Package-level type names across the whole compilation unit
    pub local_types: &'a HashSet<String>,
    /// Qualifier to package, from the file's imports
    pub imports: HashMap<String, PackageRef>,
    pub dot_imports: Vec<DotImport>,
}

/// Converts tree-sitter nodes of one file into declarations
pub struct DeclConverter<'a> {
    file: &'a ParsedFile,
    scope: &'a FileScope<'a>,
    type_params: Vec<String>,
}

impl<'a> DeclConverter<'a> {
    pub fn new(file: &'a ParsedFile, scope: &'a FileScope<'a>) -> Self {
        Self {
            file,
            scope,
            type_params: Vec::new(),
        }
    }

    /// Convert every top-level declaration of the file, in source order
    pub fn declarations(&mut self) -> Vec<Declaration> {
        let file = self.file;
        let root = file.tree.root_node();
        let mut decls = Vec::new();
        let mut cursor = root.walk();
        for node in root.named_children(&mut cursor) {
            match node.kind() {
                "type_declaration" => {
                    let mut inner = node.walk();
                    let specs: Vec<Node> = node
                        .named_children(&mut inner)
                        .filter(|n| matches!(n.kind(), "type_spec" | "type_alias"))
                        .collect();
                    for spec in specs {
                        if let Some(decl) = self.type_spec(spec) {
                            decls.push(decl);
                        }
                    }
                }
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) = self.function(node) {
                        decls.push(decl);
                    }
                }
                _ => {}
            }
        }
        decls
    }

    fn type_spec(&mut self, spec: Node) -> Option<Declaration> {
        let name = self.text(spec.child_by_field_name("name")?).to_string();
        let type_params = self.enter_type_params(spec.child_by_field_name("type_parameters"));
        let ty_node = spec.child_by_field_name("type")?;

        let kind = if spec.kind() == "type_alias" {
            DeclKind::Defined(self.convert(ty_node))
        } else {
            match ty_node.kind() {
                "interface_type" => DeclKind::Interface(self.interface(ty_node)),
                "function_type" => DeclKind::FuncType(self.signature(ty_node)),
                _ => DeclKind::Defined(self.convert(ty_node)),
            }
        };
        self.type_params.clear();

        Some(
            Declaration::new(name, self.file.file_name.clone(), kind)
                .with_type_params(type_params),
        )
    }

    fn function(&mut self, node: Node) -> Option<Declaration> {
        let name = self.text(node.child_by_field_name("name")?).to_string();

        let receiver = match node.child_by_field_name("receiver") {
            Some(list) => {
                // Receiver type parameters (`func (r *T[K])`) are in scope for the method
                self.receiver_type_params(list);
                Some(
                    self.fields(list)
                        .0
                        .into_iter()
                        .next()
                        .map(|f| f.ty)
                        .unwrap_or_else(|| TypeExpr::Unsupported("empty receiver".to_string())),
                )
            }
            None => None,
        };

        let type_params = self.enter_type_params(node.child_by_field_name("type_parameters"));
        let signature = self.signature(node);
        self.type_params.clear();

        Some(
            Declaration::new(
                name,
                self.file.file_name.clone(),
                DeclKind::Func {
                    receiver,
                    signature,
                },
            )
            .with_type_params(type_params),
        )
    }

    fn receiver_type_params(&mut self, list: Node) {
        let mut cursor = list.walk();
        for param in list.named_children(&mut cursor) {
            let Some(mut ty) = param.child_by_field_name("type") else {
                continue;
            };
            if ty.kind() == "pointer_type" {
                match ty.named_child(0) {
                    Some(inner) => ty = inner,
                    None => continue,
                }
            }
            if ty.kind() != "generic_type" {
                continue;
            }
            if let Some(args) = ty.child_by_field_name("type_arguments") {
                let mut inner = args.walk();
                for arg in args.named_children(&mut inner) {
                    let ident = if arg.kind() == "type_elem" {
                        arg.named_child(0)
                    } else {
                        Some(arg)
                    };
                    if let Some(ident) = ident {
                        let name = self.text(ident).to_string();
                        self.type_params.push(name);
                    }
                }
            }
        }
    }

    /// Bring type parameters into scope and convert their constraints
    fn enter_type_params(&mut self, list: Option<Node>) -> Vec<TypeParamDecl> {
        let Some(list) = list else {
            return Vec::new();
        };

        let mut groups: Vec<(Vec<String>, Option<Node>)> = Vec::new();
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            if decl.kind() != "type_parameter_declaration" {
                continue;
            }
            let mut name_cursor = decl.walk();
            let names: Vec<String> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| self.text(n).to_string())
                .collect();
            groups.push((names, decl.child_by_field_name("type")));
        }

        // All names are in scope before any constraint is converted
        for (names, _) in &groups {
            self.type_params.extend(names.iter().cloned());
        }

        let mut params = Vec::new();
        for (names, constraint) in groups {
            let constraint = constraint.map(|c| self.type_elem(c));
            for name in names {
                params.push(TypeParamDecl::new(name, constraint.clone()));
            }
        }
        params
    }

    fn interface(&mut self, node: Node) -> InterfaceType {
        let mut members = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "comment" => {}
                "method_elem" | "method_spec" => {
                    if let Some(name) = child.child_by_field_name("name") {
                        members.push(InterfaceMember::Method {
                            name: self.text(name).to_string(),
                            signature: self.signature(child),
                        });
                    }
                }
                "type_elem" | "constraint_elem" => {
                    members.push(InterfaceMember::Embedded(self.type_elem(child)));
                }
                "interface_type_name" => {
                    let ty = match child.named_child(0) {
                        Some(inner) => self.convert(inner),
                        None => TypeExpr::Unsupported(self.text(child).to_string()),
                    };
                    members.push(InterfaceMember::Embedded(ty));
                }
                _ => members.push(InterfaceMember::Embedded(self.convert(child))),
            }
        }
        InterfaceType::new(members)
    }

    /// Convert the `parameters` and `result` fields of a node into a signature
    fn signature(&mut self, node: Node) -> Signature {
        let (params, variadic) = match node.child_by_field_name("parameters") {
            Some(list) => self.fields(list),
            None => (Vec::new(), false),
        };
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.fields(result).0,
            Some(result) => vec![Field::unnamed(self.convert(result))],
            None => Vec::new(),
        };
        Signature {
            params,
            results,
            variadic,
        }
    }

    fn fields(&mut self, list: Node) -> (Vec<Field>, bool) {
        let mut fields = Vec::new();
        let mut variadic = false;
        let mut cursor = list.walk();
        let children: Vec<Node> = list.named_children(&mut cursor).collect();
        for decl in children {
            match decl.kind() {
                "parameter_declaration" => {
                    let Some(ty_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let ty = self.convert(ty_node);
                    let mut name_cursor = decl.walk();
                    let names: Vec<String> = decl
                        .children_by_field_name("name", &mut name_cursor)
                        .map(|n| self.text(n).to_string())
                        .collect();
                    if names.is_empty() {
                        fields.push(Field::unnamed(ty));
                    } else {
                        for name in names {
                            fields.push(Field::named(name, ty.clone()));
                        }
                    }
                }
                "variadic_parameter_declaration" => {
                    let Some(ty_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let ty = TypeExpr::slice(self.convert(ty_node));
                    let name = decl
                        .child_by_field_name("name")
                        .map(|n| self.text(n).to_string());
                    fields.push(Field { name, ty });
                    variadic = true;
                }
                _ => {}
            }
        }
        (fields, variadic)
    }

    /// Convert a constraint or type-set element; single terms collapse to the type
    fn type_elem(&mut self, node: Node) -> TypeExpr {
        if node.kind() == "negated_type" {
            return TypeExpr::Union(vec![self.union_term(node)]);
        }
        if !matches!(
            node.kind(),
            "type_elem" | "type_constraint" | "constraint_elem" | "union_type"
        ) {
            return self.convert(node);
        }

        let mut cursor = node.walk();
        let terms: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();

        if terms.is_empty() {
            return TypeExpr::Unsupported(self.text(node).to_string());
        }
        if terms.len() == 1 && terms[0].kind() != "negated_type" {
            return self.convert(terms[0]);
        }
        TypeExpr::Union(terms.into_iter().map(|t| self.union_term(t)).collect())
    }

    fn union_term(&mut self, term: Node) -> UnionTerm {
        if term.kind() != "negated_type" {
            return UnionTerm {
                tilde: false,
                ty: self.convert(term),
            };
        }
        let ty = match term.named_child(0) {
            Some(inner) => self.convert(inner),
            None => TypeExpr::Unsupported(self.text(term).to_string()),
        };
        UnionTerm { tilde: true, ty }
    }

    /// Convert a type node into a type expression
    fn convert(&mut self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" | "identifier" => {
                let name = self.text(node).to_string();
                self.resolve_ident(&name)
            }
            "qualified_type" => {
                let qualifier = node
                    .child_by_field_name("package")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.text(n).to_string())
                    .unwrap_or_default();
                self.resolve_qualified(&qualifier, &name)
            }
            "generic_type" => {
                let base = match node.child_by_field_name("type") {
                    Some(base) => self.convert(base),
                    None => return TypeExpr::Unsupported(self.text(node).to_string()),
                };
                let args = match node.child_by_field_name("type_arguments") {
                    Some(list) => {
                        let mut cursor = list.walk();
                        let arg_nodes: Vec<Node> = list
                            .named_children(&mut cursor)
                            .filter(|n| n.kind() != "comment")
                            .collect();
                        arg_nodes.into_iter().map(|n| self.type_elem(n)).collect()
                    }
                    None => Vec::new(),
                };
                match base {
                    TypeExpr::Named(named) => TypeExpr::Named(named.with_args(args)),
                    other => other,
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(elem) => TypeExpr::pointer(self.convert(elem)),
                None => TypeExpr::Unsupported(self.text(node).to_string()),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => TypeExpr::slice(self.convert(elem)),
                None => TypeExpr::Unsupported(self.text(node).to_string()),
            },
            "array_type" => {
                let len = node
                    .child_by_field_name("length")
                    .and_then(|n| self.array_len(n));
                match (len, node.child_by_field_name("element")) {
                    (Some(len), Some(elem)) => TypeExpr::Array {
                        len,
                        elem: Box::new(self.convert(elem)),
                    },
                    _ => TypeExpr::Unsupported(format!(
                        "array length of `{}`",
                        self.text(node)
                    )),
                }
            }
            "map_type" => {
                match (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(key), Some(value)) => {
                        TypeExpr::map(self.convert(key), self.convert(value))
                    }
                    _ => TypeExpr::Unsupported(self.text(node).to_string()),
                }
            }
            "channel_type" => {
                let text = self.text(node);
                let dir = if text.starts_with("<-") {
                    ChanDir::Recv
                } else if text.starts_with("chan") && text[4..].trim_start().starts_with("<-") {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                match node.child_by_field_name("value") {
                    Some(elem) => TypeExpr::chan(dir, self.convert(elem)),
                    None => TypeExpr::Unsupported(self.text(node).to_string()),
                }
            }
            "function_type" => TypeExpr::Func(self.signature(node)),
            "interface_type" => TypeExpr::Interface(self.interface(node)),
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)),
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.convert(inner),
                None => TypeExpr::Unsupported(self.text(node).to_string()),
            },
            "negated_type" | "type_elem" | "type_constraint" | "constraint_elem" | "union_type" => {
                self.type_elem(node)
            }
            other => TypeExpr::Unsupported(format!("{other} `{}`", self.text(node))),
        }
    }

    /// Literal lengths stay as written; a constant is tied to its package
    fn array_len(&self, node: Node) -> Option<ArrayLen> {
        match node.kind() {
            "int_literal" => Some(ArrayLen::Literal(self.text(node).to_string())),
            "identifier" => Some(ArrayLen::Const(NamedType::new(
                self.scope.package.clone(),
                self.text(node),
            ))),
            "selector_expression" => {
                let operand = node.child_by_field_name("operand")?;
                let field = node.child_by_field_name("field")?;
                if operand.kind() != "identifier" {
                    return None;
                }
                let package = self.scope.imports.get(self.text(operand))?;
                Some(ArrayLen::Const(NamedType::new(
                    package.clone(),
                    self.text(field),
                )))
            }
            _ => None,
        }
    }

    fn struct_fields(&mut self, node: Node) -> Vec<StructField> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return fields;
        };

        let mut list_cursor = list.walk();
        let decls: Vec<Node> = list
            .named_children(&mut list_cursor)
            .filter(|n| n.kind() == "field_declaration")
            .collect();
        for decl in decls {
            let Some(ty_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let mut ty = self.convert(ty_node);
            // Embedded pointer fields are written `*T` without a pointer_type node
            if self.text(decl).trim_start().starts_with('*') && !matches!(ty, TypeExpr::Pointer(_))
            {
                ty = TypeExpr::pointer(ty);
            }
            let tag = decl
                .child_by_field_name("tag")
                .map(|n| self.text(n).to_string());
            let mut name_cursor = decl.walk();
            let names: Vec<Option<String>> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| Some(self.text(n).to_string()))
                .collect();
            let names = if names.is_empty() { vec![None] } else { names };
            for name in names {
                fields.push(StructField {
                    name,
                    ty: ty.clone(),
                    tag: tag.clone(),
                });
            }
        }
        fields
    }

    fn resolve_ident(&self, name: &str) -> TypeExpr {
        if self.type_params.iter().any(|p| p == name) {
            return TypeExpr::TypeParam(name.to_string());
        }
        if self.scope.local_types.contains(name) {
            return TypeExpr::Named(NamedType::new(self.scope.package.clone(), name));
        }
        if is_predeclared(name) {
            return TypeExpr::Basic(name.to_string());
        }
        if let Some(dot) = self
            .scope
            .dot_imports
            .iter()
            .find(|d| d.type_names.contains(name))
        {
            return TypeExpr::Named(NamedType::new(dot.package.clone(), name));
        }
        TypeExpr::Unsupported(format!("undefined: {name}"))
    }

    fn resolve_qualified(&self, qualifier: &str, name: &str) -> TypeExpr {
        match self.scope.imports.get(qualifier) {
            Some(package) => TypeExpr::Named(NamedType::new(package.clone(), name)),
            None => TypeExpr::Unsupported(format!("undefined: {qualifier}.{name}")),
        }
    }

    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.file.source.as_bytes())
            .unwrap_or_default()
    }
}
