//! Symbol provider reading Go packages from source

mod locate;
mod parse;

pub use locate::{parse_module_path, parse_requirements, PackageLocator, Requirement};
pub use parse::{is_predeclared, ImportSpec, ParsedFile};

use crate::namespace::{CompilationUnit, LoadedNamespace};
use crate::provider::SymbolProvider;
use crate::types::PackageRef;
use dashmap::DashMap;
use fakeforge_core::config::ProviderConfig;
use fakeforge_core::error::{Error, Result, ResultExt};
use fakeforge_core::namespace::{guess_package_name, is_exported, unvendor};
use parse::{DeclConverter, DotImport, FileScope};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Loads Go packages by parsing their source files with tree-sitter
///
/// The provider is stateless apart from two small memo tables for imported
/// packages: their declared names, and the type names of dot-imported ones.
#[derive(Debug)]
pub struct GoSourceProvider {
    locator: PackageLocator,
    include_tests: bool,
    package_names: DashMap<String, String>,
    exported_types: DashMap<String, HashSet<String>>,
}

impl GoSourceProvider {
    pub fn new(locator: PackageLocator, include_tests: bool) -> Self {
        Self {
            locator,
            include_tests,
            package_names: DashMap::new(),
            exported_types: DashMap::new(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Ok(Self::new(
            PackageLocator::from_config(config)?,
            config.include_tests,
        ))
    }

    pub fn locator(&self) -> &PackageLocator {
        &self.locator
    }

    /// Parse all candidate files of a directory, sorted by file name
    fn parse_dir(&self, dir: &Path) -> Result<Vec<ParsedFile>> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .context(format!("Failed to read {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| is_go_source(name))
            .collect();
        names.sort();

        let mut files = Vec::with_capacity(names.len());
        for name in names {
            let path = dir.join(&name);
            let source = fs::read_to_string(&path)
                .context(format!("Failed to read {}", path.display()))?;
            let file = ParsedFile::parse(&name, source)?;
            if file.is_build_ignored() {
                debug!("Skipping {name}: build ignored");
                continue;
            }
            files.push(file);
        }
        Ok(files)
    }

    /// Declared package name of an import path, guessed when its source is unavailable
    fn package_name_of(&self, import_path: &str) -> String {
        if let Some(name) = self.package_names.get(import_path) {
            return name.clone();
        }
        let name = self
            .locator
            .locate(import_path)
            .ok()
            .and_then(|dir| read_package_clause(&dir))
            .unwrap_or_else(|| guess_package_name(import_path));
        self.package_names
            .insert(import_path.to_string(), name.clone());
        name
    }

    /// Exported type names declared by a dot-imported package
    fn exported_types_of(&self, import_path: &str) -> HashSet<String> {
        if let Some(names) = self.exported_types.get(import_path) {
            return names.clone();
        }
        let names: HashSet<String> = match self
            .locator
            .locate(import_path)
            .and_then(|dir| self.parse_dir(&dir))
        {
            Ok(files) => files
                .iter()
                .filter(|f| !f.is_test())
                .flat_map(|f| f.type_names())
                .filter(|name| is_exported(name))
                .collect(),
            Err(e) => {
                warn!("Cannot read dot-imported package {import_path}: {e}");
                HashSet::new()
            }
        };
        self.exported_types
            .insert(import_path.to_string(), names.clone());
        names
    }

    fn file_scope<'a>(
        &self,
        file: &ParsedFile,
        package: &'a PackageRef,
        local_types: &'a HashSet<String>,
    ) -> FileScope<'a> {
        let mut imports = HashMap::new();
        let mut dot_imports = Vec::new();

        for spec in &file.imports {
            let path = unvendor(&spec.path);
            match spec.name.as_deref() {
                Some("_") => {}
                Some(".") => {
                    let name = self.package_name_of(&path);
                    let type_names = self.exported_types_of(&path);
                    dot_imports.push(DotImport {
                        package: PackageRef::new(path, name),
                        type_names,
                    });
                }
                Some(alias) => {
                    let name = self.package_name_of(&path);
                    imports.insert(alias.to_string(), PackageRef::new(path, name));
                }
                None => {
                    let name = self.package_name_of(&path);
                    imports.insert(name.clone(), PackageRef::new(path, name));
                }
            }
        }

        FileScope {
            package,
            local_types,
            imports,
            dot_imports,
        }
    }

    /// Convert a group of files into one compilation unit
    fn build_unit(
        &self,
        import_path: &str,
        label: &str,
        files: &[&ParsedFile],
    ) -> CompilationUnit {
        let package_name = files
            .first()
            .map(|f| f.package_name.clone())
            .unwrap_or_default();
        let mut unit = CompilationUnit::new(package_name.clone(), label);

        for file in files {
            if file.package_name != package_name {
                unit.errors.push(format!(
                    "found packages {package_name} and {} ({})",
                    file.package_name, file.file_name
                ));
            }
            if let Some(error) = file.syntax_error() {
                unit.errors.push(error);
            }
        }
        if !unit.errors.is_empty() {
            warn!(
                "Package {import_path} ({label}) has no usable type information: {}",
                unit.errors.join("; ")
            );
            return unit;
        }

        let package = PackageRef::new(import_path, package_name);
        let local_types: HashSet<String> = files.iter().flat_map(|f| f.type_names()).collect();

        for file in files {
            let scope = self.file_scope(file, &package, &local_types);
            let mut converter = DeclConverter::new(file, &scope);
            unit.declarations.extend(converter.declarations());
        }
        unit
    }
}

impl SymbolProvider for GoSourceProvider {
    fn load(&self, path: &str) -> Result<LoadedNamespace> {
        let import_path = unvendor(path);
        let dir = self.locator.locate(&import_path)?;
        let files = self
            .parse_dir(&dir)
            .map_err(|e| Error::namespace_load(&import_path, e.to_string()))?;

        let (tests, regular): (Vec<&ParsedFile>, Vec<&ParsedFile>) =
            files.iter().partition(|f| f.is_test());

        if regular.is_empty() && (tests.is_empty() || !self.include_tests) {
            return Err(Error::namespace_load(
                import_path,
                format!("no Go files in {}", dir.display()),
            ));
        }

        let mut units = Vec::new();
        let regular_name = regular.first().map(|f| f.package_name.clone());

        if !regular.is_empty() {
            units.push(self.build_unit(&import_path, "package", &regular));
        }

        if self.include_tests {
            let (external, internal): (Vec<&ParsedFile>, Vec<&ParsedFile>) =
                tests.into_iter().partition(|f| {
                    f.package_name.ends_with("_test")
                        && Some(f.package_name.as_str()) != regular_name.as_deref()
                });

            if !internal.is_empty() {
                let combined: Vec<&ParsedFile> =
                    regular.iter().chain(internal.iter()).copied().collect();
                units.push(self.build_unit(&import_path, "package+tests", &combined));
            }
            if !external.is_empty() {
                units.push(self.build_unit(&import_path, "external tests", &external));
            }
        }

        debug!(
            "Loaded package {import_path} from {} ({} files, {} units)",
            dir.display(),
            files.len(),
            units.len()
        );

        Ok(LoadedNamespace::new(import_path, units))
    }
}

fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.starts_with('_') && !name.starts_with('.')
}

/// Read the package clause of the first non-test Go file in a directory
fn read_package_clause(dir: &Path) -> Option<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| is_go_source(name) && !name.ends_with("_test.go"))
        .collect();
    names.sort();

    names.iter().find_map(|name| {
        let source = fs::read_to_string(dir.join(name)).ok()?;
        let mut in_block_comment = false;
        for line in source.lines() {
            let line = line.trim();
            if in_block_comment {
                if line.contains("*/") {
                    in_block_comment = false;
                }
                continue;
            }
            if line.starts_with("/*") {
                in_block_comment = !line.contains("*/");
                continue;
            }
            if let Some(rest) = line.strip_prefix("package ") {
                if source.contains("//go:build ignore") {
                    return None;
                }
                return rest
                    .split_whitespace()
                    .next()
                    .map(|name| name.trim_end_matches(';').to_string());
            }
        }
        None
    })
}
