//! Module resolution
//!
//! Handles resolving import specifiers to actual file paths, or to one of the
//! configured externals that stay out of the bundle.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::error::{PackError, Result};

/// Extensions tried, in order, for extensionless specifiers
const EXTENSIONS: [&str; 5] = ["mjs", "js", "mts", "ts", "json"];

/// What an import specifier points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A file to bundle
    Module(PathBuf),
    /// A configured external, referenced by its exact id
    External(String),
}

/// Module resolver
pub struct Resolver {
    /// Project configuration
    config: Arc<Config>,
}

impl Resolver {
    /// Create a new resolver
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Resolve an import specifier found in `from`
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<Resolution> {
        debug!("Resolving '{}' from '{}'", specifier, from.display());

        if let Some(external) = self.config.external(specifier) {
            debug!("Keeping external: {}", external.id);
            return Ok(Resolution::External(external.id.clone()));
        }

        let base_dir = from.parent().unwrap_or(Path::new("."));

        let resolved = if specifier.starts_with('.') || specifier.starts_with('/') {
            self.resolve_relative(specifier, base_dir)?
        } else {
            self.resolve_bare(specifier, base_dir)?
        };

        match resolved {
            Some(path) => {
                debug!("Resolved to: {}", path.display());
                Ok(Resolution::Module(path))
            }
            None => Err(PackError::input(
                from,
                format!("cannot resolve import '{}'", specifier),
            )),
        }
    }

    /// Resolve a relative import
    fn resolve_relative(&self, specifier: &str, base_dir: &Path) -> Result<Option<PathBuf>> {
        let target = base_dir.join(specifier);

        // Try exact path first
        if target.is_file() {
            return Ok(Some(target));
        }

        // Try adding extensions
        for ext in &EXTENSIONS {
            let with_ext = append_extension(&target, ext);
            if with_ext.is_file() {
                return Ok(Some(with_ext));
            }
        }

        // Try as directory with index file
        if target.is_dir() {
            for ext in &EXTENSIONS {
                let index = target.join(format!("index.{}", ext));
                if index.is_file() {
                    return Ok(Some(index));
                }
            }
        }

        Ok(None)
    }

    /// Resolve a bare import (from node_modules)
    fn resolve_bare(&self, specifier: &str, base_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current = base_dir.to_path_buf();

        // Walk up directory tree looking for node_modules
        loop {
            let node_modules = current.join("node_modules");

            if node_modules.is_dir() {
                if let Some(resolved) = self.resolve_in_node_modules(&node_modules, specifier)? {
                    return Ok(Some(resolved));
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Resolve a module within a node_modules directory
    fn resolve_in_node_modules(&self, node_modules: &Path, specifier: &str) -> Result<Option<PathBuf>> {
        // Split specifier into package name and subpath
        let (package_name, subpath) = if specifier.starts_with('@') {
            // Scoped package: @scope/name or @scope/name/subpath
            let parts: Vec<&str> = specifier.splitn(3, '/').collect();
            if parts.len() < 2 {
                return Ok(None);
            }
            let name = format!("{}/{}", parts[0], parts[1]);
            (name, parts.get(2).map(|s| s.to_string()))
        } else {
            let parts: Vec<&str> = specifier.splitn(2, '/').collect();
            (parts[0].to_string(), parts.get(1).map(|s| s.to_string()))
        };

        let package_dir = node_modules.join(&package_name);

        if !package_dir.is_dir() {
            return Ok(None);
        }

        if let Some(sub) = subpath {
            return self.resolve_relative(&sub, &package_dir);
        }

        // Otherwise, look at package.json for module/main entry
        let package_json = package_dir.join("package.json");

        if package_json.is_file() {
            let content = fs::read_to_string(&package_json)
                .map_err(|e| PackError::input(&package_json, e))?;
            let pkg: serde_json::Value = serde_json::from_str(&content)
                .map_err(|e| PackError::input(&package_json, format!("invalid JSON: {}", e)))?;

            for field in ["module", "main"] {
                if let Some(entry) = pkg.get(field).and_then(|v| v.as_str()) {
                    if let Some(found) = self.resolve_relative(entry, &package_dir)? {
                        return Ok(Some(found));
                    }
                }
            }
        }

        self.resolve_relative("index.js", &package_dir)
    }
}

/// `path` with `.ext` appended, keeping any extension it already has
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
