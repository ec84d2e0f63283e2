//! Integration tests for loading Go packages from disk

use fakeforge_core::config::ProviderConfig;
use fakeforge_core::Error;
use fakeforge_symbols::go::GoSourceProvider;
use fakeforge_symbols::{DeclKind, InterfaceMember, NamedType, PackageRef, SymbolProvider, TypeExpr};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dirs");
    }
    fs::write(path, content).expect("write file");
}

fn module() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    dir
}

fn provider(root: &Path, include_tests: bool) -> GoSourceProvider {
    GoSourceProvider::from_config(&ProviderConfig {
        module_root: root.to_path_buf(),
        goroot: None,
        gomodcache: None,
        include_tests,
    })
    .expect("provider")
}

#[test]
fn test_loads_interface_with_qualified_and_dot_imports() {
    let dir = module();
    write(
        dir.path(),
        "shapes/shapes.go",
        "package shapes\n\ntype Shape interface { Area() float64 }\n\ntype Point struct{ X, Y int }\n",
    );
    write(
        dir.path(),
        "vendor/github.com/acme/go-units/units.go",
        "package units\n\ntype Meter float64\n",
    );
    write(
        dir.path(),
        "canvas/canvas.go",
        r#"package canvas

import (
    . "example.com/app/shapes"
    "github.com/acme/go-units"
)

type Canvas interface {
    Shape
    Draw(at Point, width units.Meter) error
}
"#,
    );

    let loaded = provider(dir.path(), true)
        .load("example.com/app/canvas")
        .expect("load canvas");
    assert_eq!(loaded.package_name(), Some("canvas"));
    assert_eq!(loaded.units.len(), 1);

    let decl = loaded.units[0].lookup("Canvas").expect("Canvas declared");
    let DeclKind::Interface(iface) = &decl.kind else {
        panic!("expected interface, got {:?}", decl.kind);
    };

    let shapes = PackageRef::new("example.com/app/shapes", "shapes");
    assert_eq!(
        iface.members[0],
        InterfaceMember::Embedded(TypeExpr::Named(NamedType::new(shapes.clone(), "Shape")))
    );

    let InterfaceMember::Method { signature, .. } = &iface.members[1] else {
        panic!("expected method");
    };
    assert_eq!(
        signature.params[0].ty,
        TypeExpr::Named(NamedType::new(shapes, "Point"))
    );
    // Package name read from the vendored source, not guessed from the path
    assert_eq!(
        signature.params[1].ty,
        TypeExpr::named("github.com/acme/go-units", "units", "Meter")
    );
}

#[test]
fn test_test_files_form_extra_units() {
    let dir = module();
    write(
        dir.path(),
        "store/store.go",
        "package store\n\ntype Store interface { Get() string }\n",
    );
    write(
        dir.path(),
        "store/helpers_test.go",
        "package store\n\ntype testStore interface { Reset() }\n",
    );
    write(
        dir.path(),
        "store/store_test.go",
        "package store_test\n\ntype Harness interface { Run() }\n",
    );

    let loaded = provider(dir.path(), true)
        .load("example.com/app/store")
        .expect("load store");
    let labels: Vec<&str> = loaded.units.iter().map(|u| u.label.as_str()).collect();
    assert_eq!(labels, vec!["package", "package+tests", "external tests"]);
    assert!(loaded.units[0].lookup("Harness").is_none());
    assert!(loaded.units[1].lookup("testStore").is_some());
    assert!(loaded.units[2].lookup("Harness").is_some());

    let without_tests = provider(dir.path(), false)
        .load("example.com/app/store")
        .expect("load store");
    assert_eq!(without_tests.units.len(), 1);
}

#[test]
fn test_syntax_error_marks_unit_unusable() {
    let dir = module();
    write(
        dir.path(),
        "broken/broken.go",
        "package broken\n\ntype Bad interface {\n",
    );

    let loaded = provider(dir.path(), true)
        .load("example.com/app/broken")
        .expect("load broken");
    assert_eq!(loaded.units.len(), 1);
    assert!(!loaded.units[0].is_usable());
    assert!(loaded.units.iter().all(|u| !u.is_usable()));
}

#[test]
fn test_missing_package_fails_to_load() {
    let dir = module();
    let err = provider(dir.path(), true)
        .load("example.com/app/nothing")
        .unwrap_err();
    assert!(matches!(err, Error::NamespaceLoadFailed { .. }));
}

#[test]
fn test_directory_without_go_files_fails_to_load() {
    let dir = module();
    write(dir.path(), "docs/README.md", "# docs\n");
    let err = provider(dir.path(), true)
        .load("example.com/app/docs")
        .unwrap_err();
    assert!(err.to_string().contains("no Go files"));
}

#[test]
fn test_vendored_import_path_is_canonicalised() {
    let dir = module();
    write(
        dir.path(),
        "vendor/github.com/acme/clock/clock.go",
        "package clock\n\ntype Clock interface { Now() int64 }\n",
    );
    let loaded = provider(dir.path(), true)
        .load("example.com/app/vendor/github.com/acme/clock")
        .expect("load vendored");
    assert_eq!(loaded.path, "github.com/acme/clock");
    assert!(loaded.units[0].lookup("Clock").is_some());
}

#[test]
fn test_dot_import_does_not_expose_unexported_types() {
    let dir = module();
    write(
        dir.path(),
        "shapes/shapes.go",
        "package shapes\n\ntype Point struct{ X, Y int }\n\ntype grid struct{}\n",
    );
    write(
        dir.path(),
        "canvas/canvas.go",
        "package canvas\n\nimport . \"example.com/app/shapes\"\n\ntype Canvas interface {\n    Plot(p Point, g grid)\n}\n",
    );

    let loaded = provider(dir.path(), true)
        .load("example.com/app/canvas")
        .expect("load canvas");
    let decl = loaded.units[0].lookup("Canvas").expect("Canvas declared");
    let DeclKind::Interface(iface) = &decl.kind else {
        panic!("expected interface, got {:?}", decl.kind);
    };
    let InterfaceMember::Method { signature, .. } = &iface.members[0] else {
        panic!("expected method");
    };
    assert_eq!(
        signature.params[0].ty,
        TypeExpr::named("example.com/app/shapes", "shapes", "Point")
    );
    assert_eq!(
        signature.params[1].ty,
        TypeExpr::Unsupported("undefined: grid".to_string())
    );
}
