//! Module graph data structures

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::transform::esm::ModuleExports;

/// Unique identifier for a module, assigned in discovery order
pub type ModuleId = usize;

/// Types of modules the bundler can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleType {
    JavaScript,
    TypeScript,
    Css,
    Json,
    Unknown,
}

impl ModuleType {
    /// Determine module type from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "ts" | "mts" | "cts" => ModuleType::TypeScript,
            "css" => ModuleType::Css,
            "json" => ModuleType::Json,
            _ => ModuleType::Unknown,
        }
    }

    /// Check if this is a JavaScript-like module
    pub fn is_js_like(&self) -> bool {
        matches!(self, ModuleType::JavaScript | ModuleType::TypeScript)
    }
}

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Canonical path to the module
    pub path: PathBuf,

    /// Registry key: the path relative to the project root
    pub key: String,

    /// Module type
    pub module_type: ModuleType,

    /// Whether this is the library entry point
    pub is_entry: bool,

    /// Import specifiers found in this module, in source order
    pub dependencies: Vec<String>,

    /// Code ready to be wrapped into the registry
    pub code: String,

    /// Statically known exports
    pub exports: ModuleExports,

    /// Whether the module was written with ES module syntax
    pub is_esm: bool,
}

impl Module {
    /// Detect module type from path
    pub fn detect_type(path: &Path) -> ModuleType {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(ModuleType::from_extension)
            .unwrap_or(ModuleType::Unknown)
    }
}

/// The module dependency graph
///
/// Modules are kept in discovery order so the same sources always
/// produce the same bundle.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules, indexed by their ID
    modules: Vec<Module>,

    /// Map from canonical path to module ID
    path_to_id: HashMap<PathBuf, ModuleId>,

    /// Map from registry key to module ID
    key_to_id: HashMap<String, ModuleId>,

    /// Externals referenced anywhere in the graph
    externals: HashSet<String>,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        if let Some(&id) = self.path_to_id.get(&module.path) {
            return id;
        }

        let id = self.modules.len();
        self.path_to_id.insert(module.path.clone(), id);
        self.key_to_id.insert(module.key.clone(), id);
        self.modules.push(module);

        id
    }

    /// Record that an external is imported somewhere
    pub fn add_external(&mut self, id: &str) {
        self.externals.insert(id.to_string());
    }

    pub fn uses_external(&self, id: &str) -> bool {
        self.externals.contains(id)
    }

    /// Get module ID from path
    pub fn get_module_id(&self, path: &Path) -> Option<ModuleId> {
        self.path_to_id.get(path).copied()
    }

    /// Get module ID from registry key
    pub fn get_module_id_by_key(&self, key: &str) -> Option<ModuleId> {
        self.key_to_id.get(key).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    /// Get a mutable reference to a module
    pub fn get_module_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(id)
    }

    /// All modules in discovery order
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }

    /// The entry module, if one was added
    pub fn entry(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.is_entry)
    }

    /// Export names visible on a module, following `export *` through
    /// bundled modules
    ///
    /// Returns the names (without `default` for re-exported stars) and the
    /// externals whose exports are forwarded wholesale.
    pub fn exported_names(&self, id: ModuleId) -> (Vec<String>, Vec<String>) {
        let mut names = Vec::new();
        let mut external_stars = Vec::new();
        let mut visited = HashSet::new();
        self.collect_exports(id, true, &mut visited, &mut names, &mut external_stars);
        (names, external_stars)
    }

    fn collect_exports(
        &self,
        id: ModuleId,
        include_default: bool,
        visited: &mut HashSet<ModuleId>,
        names: &mut Vec<String>,
        external_stars: &mut Vec<String>,
    ) {
        if !visited.insert(id) {
            return;
        }
        let Some(module) = self.get_module(id) else { return };

        for name in &module.exports.names {
            if (include_default || name != "default") && !names.contains(name) {
                names.push(name.clone());
            }
        }
        for key in &module.exports.star_keys {
            match self.get_module_id_by_key(key) {
                Some(star) => self.collect_exports(star, false, visited, names, external_stars),
                None => {
                    if !external_stars.contains(key) {
                        external_stars.push(key.clone());
                    }
                }
            }
        }
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
