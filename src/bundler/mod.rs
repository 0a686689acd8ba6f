//! Core bundler implementation
//!
//! Builds the module graph from the library entry, renders one artifact per
//! configured format and writes the set into a freshly cleared output
//! directory.

mod artifacts;
mod format;
mod graph;
mod runtime;

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{PackError, Result};
use crate::resolver::{Resolution, Resolver};
use crate::transform::esm;
use crate::transform::Transformer;
use crate::utils::{hash_content, module_key};

pub use artifacts::{Artifact, BundleArtifactSet};
pub use format::{BundleFormat, RenderInput};
pub use graph::{Module, ModuleGraph, ModuleId, ModuleType};
pub use runtime::{render_registry, BoundExternal};

/// Result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    /// Written artifacts
    pub artifacts: BundleArtifactSet,

    /// Number of bundled modules
    pub modules: usize,

    pub duration: Duration,
}

/// An artifact rendered in memory, not yet written
struct RenderedBundle {
    format: BundleFormat,
    file_name: String,
    code: String,
}

/// The main bundler
pub struct Bundler {
    /// Project configuration
    config: Arc<Config>,

    /// Module resolver
    resolver: Resolver,

    /// Code transformer
    transformer: Transformer,
}

impl Bundler {
    /// Create a new bundler instance
    pub fn new(config: Arc<Config>) -> Self {
        let resolver = Resolver::new(config.clone());

        Self {
            config,
            resolver,
            transformer: Transformer::new(),
        }
    }

    /// Build the library
    pub async fn build(&self) -> Result<BuildResult> {
        let start = Instant::now();

        let entry = self.config.entry_path();
        let is_file = tokio::fs::metadata(&entry)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(PackError::input(&entry, "entry point not found"));
        }

        let root = tokio::fs::canonicalize(&self.config.root)
            .await
            .map_err(|e| PackError::input(&self.config.root, e))?;

        // 1. Build the module graph from the entry point
        info!("Building module graph...");
        let mut graph = ModuleGraph::new();
        self.process_module(&mut graph, &root, &entry, true).await?;
        debug!("Bundled {} modules", graph.len());

        // 2. Render every format before touching the output directory
        info!("Rendering {} formats...", self.config.library.formats.len());
        let bundles = self.render(&graph)?;

        // 3. Write output bundles
        info!("Writing bundles...");
        let artifacts = self.write_bundles(bundles).await?;

        let duration = start.elapsed();
        debug!("Build completed in {:?}", duration);

        Ok(BuildResult {
            artifacts,
            modules: graph.len(),
            duration,
        })
    }

    /// Process a single module and its dependencies
    ///
    /// Uses Box::pin for async recursion to avoid infinite type size issues
    async fn process_module(
        &self,
        graph: &mut ModuleGraph,
        root: &Path,
        path: &Path,
        is_entry: bool,
    ) -> Result<ModuleId> {
        let canonical_path = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| PackError::input(path, e))?;

        // Check if already processed
        if let Some(id) = graph.get_module_id(&canonical_path) {
            return Ok(id);
        }

        let source = tokio::fs::read_to_string(&canonical_path)
            .await
            .map_err(|e| PackError::input(&canonical_path, e))?;

        let module_type = Module::detect_type(&canonical_path);
        let code = self.transformer.transform(&source, &canonical_path, module_type)?;

        let dependencies = if module_type.is_js_like() {
            esm::collect_specifiers(&code)
        } else {
            Vec::new()
        };

        let module_id = graph.add_module(Module {
            path: canonical_path.clone(),
            key: module_key(root, &canonical_path),
            module_type,
            is_entry,
            dependencies: dependencies.clone(),
            code,
            exports: Default::default(),
            is_esm: false,
        });

        // Registry key of every specifier, for the rewrite below
        let mut keys = HashMap::new();
        for dep in &dependencies {
            match self.resolver.resolve(dep, &canonical_path)? {
                Resolution::External(id) => {
                    graph.add_external(&id);
                    keys.insert(dep.clone(), id);
                }
                Resolution::Module(resolved_path) => {
                    let dep_id =
                        Box::pin(self.process_module(graph, root, &resolved_path, false)).await?;
                    if let Some(dep_module) = graph.get_module(dep_id) {
                        keys.insert(dep.clone(), dep_module.key.clone());
                    }
                }
            }
        }

        if module_type.is_js_like() {
            if let Some(module) = graph.get_module_mut(module_id) {
                let rewritten = esm::rewrite(&module.code, &keys)
                    .map_err(|reason| PackError::input(&canonical_path, reason))?;
                module.code = rewritten.code;
                module.exports = rewritten.exports;
                module.is_esm = rewritten.is_esm;
            }
        }

        Ok(module_id)
    }

    /// Externals imported by the graph, in configuration order
    fn bound_externals(&self, graph: &ModuleGraph) -> Vec<BoundExternal> {
        self.config
            .externals
            .iter()
            .filter(|e| graph.uses_external(&e.id))
            .enumerate()
            .map(|(index, e)| BoundExternal {
                id: e.id.clone(),
                global: e.global.clone(),
                binding: format!("__ext{}", index),
            })
            .collect()
    }

    fn render(&self, graph: &ModuleGraph) -> Result<Vec<RenderedBundle>> {
        let entry = graph
            .entry()
            .ok_or_else(|| PackError::input(self.config.entry_path(), "entry module was not loaded"))?;
        let entry_id = graph.get_module_id(&entry.path).unwrap_or_default();
        let (names, external_stars) = graph.exported_names(entry_id);

        let externals = self.bound_externals(graph);
        let registry = render_registry(graph, &externals);

        let input = RenderInput {
            name: &self.config.library.name,
            externals: &externals,
            registry: &registry,
            entry_key: &entry.key,
            entry_is_esm: entry.is_esm,
            names: &names,
            external_stars: &external_stars,
        };

        Ok(self
            .config
            .library
            .formats
            .iter()
            .map(|&format| RenderedBundle {
                format,
                file_name: self.config.artifact_file_name(format),
                code: format.render(&input),
            })
            .collect())
    }

    /// Write bundles to disk
    ///
    /// Either every bundle is written or the output directory is removed.
    async fn write_bundles(&self, bundles: Vec<RenderedBundle>) -> Result<BundleArtifactSet> {
        let output_dir = self.config.output_dir();

        match tokio::fs::remove_dir_all(&output_dir).await {
            Ok(()) => debug!("Cleared {}", output_dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(PackError::io(&output_dir, e)),
        }

        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| PackError::io(&output_dir, e))?;

        let mut artifacts = Vec::with_capacity(bundles.len());
        for bundle in bundles {
            let output_path = output_dir.join(&bundle.file_name);

            if let Err(e) = tokio::fs::write(&output_path, &bundle.code).await {
                if let Err(cleanup) = tokio::fs::remove_dir_all(&output_dir).await {
                    warn!("Failed to remove partial output {}: {}", output_dir.display(), cleanup);
                }
                return Err(PackError::io(&output_path, e));
            }

            debug!("Wrote {} ({} bytes)", output_path.display(), bundle.code.len());

            artifacts.push(Artifact {
                format: bundle.format,
                file_name: bundle.file_name,
                path: output_path,
                size: bundle.code.len(),
                digest: hash_content(bundle.code.as_bytes()),
            });
        }

        Ok(BundleArtifactSet::new(output_dir, artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
        [library]
        name = "Grid"
        file_name = "grid"
        entry = "src/index.js"
        formats = ["es", "umd", "cjs", "iife"]

        [[externals]]
        id = "vue"
        global = "Vue"

        [[externals]]
        id = "unused"
        global = "Unused"
    "#;

    fn project(files: &[(&str, &str)]) -> (TempDir, Arc<Config>) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let config = Config::from_toml(CONFIG, dir.path().to_path_buf()).unwrap();
        (dir, Arc::new(config))
    }

    #[tokio::test]
    async fn test_build_writes_every_format() {
        let (dir, config) = project(&[
            ("src/index.js", "import { h } from 'vue';\nimport { size } from './size';\nexport default { h, size };\nexport { size };\n"),
            ("src/size.ts", "export const size: number = 3;\n"),
        ]);

        let result = Bundler::new(config).build().await.unwrap();
        assert_eq!(result.modules, 2);

        let out = dir.path().join("dist/grid");
        let es = fs::read_to_string(out.join("grid.es.js")).unwrap();
        assert!(es.starts_with("import * as __ext0 from \"vue\";\n"));
        assert!(es.contains("__modules__[\"src/size.ts\"]"));
        assert!(es.contains("export { __export0 as size };"));
        assert!(!es.contains("Unused"));

        let umd = fs::read_to_string(out.join("grid.umd.js")).unwrap();
        assert!(umd.contains("factory(global.Grid = {}, global.Vue)"));

        for format in [BundleFormat::Es, BundleFormat::Umd, BundleFormat::Cjs, BundleFormat::Iife] {
            let artifact = result.artifacts.get(format).unwrap();
            let content = fs::read(&artifact.path).unwrap();
            assert_eq!(artifact.digest, hash_content(&content));
        }
    }

    #[tokio::test]
    async fn test_missing_entry_leaves_output_untouched() {
        let (dir, config) = project(&[("src/other.js", "")]);

        let err = Bundler::new(config).build().await.unwrap_err();
        assert!(matches!(err, PackError::Input { .. }));
        assert!(err.to_string().contains("src/index.js"));
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_stale_artifacts_are_removed() {
        let (dir, config) = project(&[
            ("src/index.js", "module.exports = 1;\n"),
            ("dist/grid/grid.old.js", "stale"),
        ]);

        Bundler::new(config).build().await.unwrap();
        assert!(!dir.path().join("dist/grid/grid.old.js").exists());
        assert!(dir.path().join("dist/grid/grid.cjs.js").exists());
    }

    #[tokio::test]
    async fn test_unresolved_import_fails_before_writing() {
        let (dir, config) = project(&[("src/index.js", "import './missing';\n")]);

        let err = Bundler::new(config).build().await.unwrap_err();
        assert!(err.to_string().contains("'./missing'"));
        assert!(!dir.path().join("dist").exists());
    }

    #[tokio::test]
    async fn test_builds_are_reproducible() {
        let (_dir, config) = project(&[
            ("src/index.js", "export * from './a';\nexport * from './b';\n"),
            ("src/a.js", "export const a = 1;\n"),
            ("src/b.js", "export const b = 2;\n"),
        ]);

        let bundler = Bundler::new(config);
        let first = bundler.build().await.unwrap();
        let second = bundler.build().await.unwrap();
        assert_eq!(first.artifacts.artifacts(), second.artifacts.artifacts());
    }
}
