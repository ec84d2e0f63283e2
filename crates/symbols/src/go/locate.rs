//! Mapping Go import paths to directories on disk

use fakeforge_core::config::ProviderConfig;
use fakeforge_core::error::{Error, Result, ResultExt};
use fakeforge_core::namespace::unvendor;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A `require` entry of `go.mod`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub module: String,
    pub version: String,
}

/// Finds package directories for import paths
///
/// Search order: the current module (by the `module` line of `go.mod`), the
/// module's `vendor/` directory, the module cache for required modules, then
/// `<goroot>/src`.
#[derive(Debug, Clone)]
pub struct PackageLocator {
    module_root: PathBuf,
    module_path: Option<String>,
    goroot: Option<PathBuf>,
    gomodcache: Option<PathBuf>,
    requirements: Vec<Requirement>,
}

impl PackageLocator {
    pub fn new(module_root: PathBuf, module_path: Option<String>, goroot: Option<PathBuf>) -> Self {
        Self {
            module_root,
            module_path,
            goroot,
            gomodcache: None,
            requirements: Vec::new(),
        }
    }

    /// Also search `<gomodcache>/<module>@<version>` for required modules
    pub fn with_module_cache(mut self, gomodcache: PathBuf, requirements: Vec<Requirement>) -> Self {
        self.gomodcache = Some(gomodcache);
        self.requirements = requirements;
        self
    }

    /// Build a locator from provider configuration, reading `go.mod` if present
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let module_root = config.module_root.clone();
        let go_mod = module_root.join("go.mod");
        let (module_path, requirements) = if go_mod.is_file() {
            let content = fs::read_to_string(&go_mod)
                .context(format!("Failed to read {}", go_mod.display()))?;
            (parse_module_path(&content), parse_requirements(&content))
        } else {
            (None, Vec::new())
        };

        debug!(
            "Package locator rooted at {} (module {:?}, {} requirements)",
            module_root.display(),
            module_path,
            requirements.len()
        );

        let locator = Self::new(module_root, module_path, config.goroot.clone());
        Ok(match &config.gomodcache {
            Some(cache) => locator.with_module_cache(cache.clone(), requirements),
            None => locator,
        })
    }

    /// Convert a user supplied package reference to a canonical import path
    ///
    /// `./x` and `../x` are taken relative to the module root and need a
    /// module path; anything else is already an import path.
    pub fn canonical_path(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();
        if reference == "." || reference.starts_with("./") || reference.starts_with("../") {
            let module_path = self.module_path.as_deref().ok_or_else(|| {
                Error::invalid_input(format!(
                    "relative package {reference} needs a go.mod under {}",
                    self.module_root.display()
                ))
            })?;
            let relative = normalize_relative(reference)?;
            return Ok(if relative.is_empty() {
                module_path.to_string()
            } else {
                format!("{module_path}/{relative}")
            });
        }
        Ok(unvendor(reference))
    }

    /// Find the directory holding an import path
    pub fn locate(&self, import_path: &str) -> Result<PathBuf> {
        let import_path = unvendor(import_path);

        if let Some(module_path) = &self.module_path {
            if import_path == *module_path {
                return Ok(self.module_root.clone());
            }
            if let Some(rest) = import_path
                .strip_prefix(module_path.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                let dir = self.module_root.join(rest);
                if dir.is_dir() {
                    return Ok(dir);
                }
            }
        }

        let vendored = self.module_root.join("vendor").join(&import_path);
        if vendored.is_dir() {
            return Ok(vendored);
        }

        if let Some(dir) = self.locate_in_module_cache(&import_path) {
            return Ok(dir);
        }

        if let Some(goroot) = &self.goroot {
            let std_dir = goroot.join("src").join(&import_path);
            if std_dir.is_dir() {
                return Ok(std_dir);
            }
        }

        Err(Error::namespace_load(
            import_path,
            "cannot find package in module, vendor directory, module cache or GOROOT",
        ))
    }

    /// The longest required module owning the import path decides the directory
    fn locate_in_module_cache(&self, import_path: &str) -> Option<PathBuf> {
        let cache = self.gomodcache.as_ref()?;
        let (requirement, rest) = self
            .requirements
            .iter()
            .filter_map(|req| {
                let rest = import_path.strip_prefix(req.module.as_str())?;
                (rest.is_empty() || rest.starts_with('/')).then_some((req, rest))
            })
            .max_by_key(|(req, _)| req.module.len())?;

        let dir = cache
            .join(format!(
                "{}@{}",
                escape_module_path(&requirement.module),
                escape_module_path(&requirement.version)
            ))
            .join(rest.trim_start_matches('/'));
        dir.is_dir().then_some(dir)
    }
}

/// Extract the `require` entries of a `go.mod` file, single-line and block form
pub fn parse_requirements(go_mod: &str) -> Vec<Requirement> {
    let mut requirements = Vec::new();
    let mut in_block = false;
    for line in go_mod.lines() {
        let line = line.split("//").next().unwrap_or_default().trim();
        if in_block {
            if line == ")" {
                in_block = false;
            } else if let Some(req) = parse_requirement(line) {
                requirements.push(req);
            }
            continue;
        }
        let Some(rest) = line.strip_prefix("require") else {
            continue;
        };
        let rest = rest.trim();
        if rest == "(" {
            in_block = true;
        } else if line.starts_with("require ") {
            requirements.extend(parse_requirement(rest));
        }
    }
    requirements
}

fn parse_requirement(spec: &str) -> Option<Requirement> {
    let mut parts = spec.split_whitespace();
    let module = parts.next()?.trim_matches('"').to_string();
    let version = parts.next()?.to_string();
    Some(Requirement { module, version })
}

/// Case-encode a module path or version as the module cache does (`A` → `!a`)
fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(c.to_ascii_lowercase());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

/// Extract the module path from the contents of a `go.mod` file
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        line.strip_prefix("module")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(|rest| rest.trim().trim_matches('"').to_string())
            .filter(|path| !path.is_empty())
    })
}

fn normalize_relative(reference: &str) -> Result<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in Path::new(reference).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(Error::invalid_input(format!(
                        "package {reference} is outside the module"
                    )));
                }
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::invalid_input(format!(
                    "package {reference} must be relative"
                )))
            }
        }
    }
    Ok(parts.join("/"))
}
