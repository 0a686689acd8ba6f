//! Publish descriptor synthesis
//!
//! Derives the `package.json` shipped with the bundles from the development
//! descriptor. Fields are selected one by one; nothing else from the source
//! descriptor ever reaches the output.

mod descriptor;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bundler::{BundleArtifactSet, BundleFormat};
use crate::config::Config;
use crate::error::{PackError, Result};

pub use descriptor::{publish_name, ExportConditions, PublishDescriptor, SourceDescriptor};

/// Name of the written descriptor inside the output directory
pub const PUBLISH_FILE: &str = "package.json";

/// Builds and writes the publish descriptor
pub struct Synthesizer {
    config: Arc<Config>,
}

impl Synthesizer {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Load the development descriptor
    pub async fn load_source(&self) -> Result<SourceDescriptor> {
        let path = self.config.descriptor_path();
        debug!("Reading {}", path.display());
        SourceDescriptor::load(&path).await
    }

    /// Check the configured formats and the descriptor's required fields, so
    /// a release can fail before anything is built
    pub async fn preflight(&self) -> Result<SourceDescriptor> {
        for format in [BundleFormat::Umd, BundleFormat::Es] {
            if !self.config.library.formats.contains(&format) {
                return Err(missing_format(format));
            }
        }
        let source = self.load_source().await?;
        for field in ["name", "version", "license"] {
            source.required_str(field)?;
        }
        Ok(source)
    }

    /// Derive the publish descriptor
    pub fn synthesize(
        &self,
        source: &SourceDescriptor,
        artifacts: &BundleArtifactSet,
    ) -> Result<PublishDescriptor> {
        let package = &self.config.package;

        let umd = self.artifact_name(artifacts, BundleFormat::Umd)?;
        let es = self.artifact_name(artifacts, BundleFormat::Es)?;

        let mut exports = BTreeMap::new();
        exports.insert(
            ".".to_string(),
            ExportConditions {
                types: package.types.clone(),
                import: format!("./{}", es),
                require: format!("./{}", umd),
                default: format!("./{}", umd),
            },
        );

        let peer_dependencies = self
            .config
            .externals
            .iter()
            .filter_map(|e| e.range.as_ref().map(|range| (e.id.clone(), range.clone())))
            .collect();

        Ok(PublishDescriptor {
            name: publish_name(source.required_str("name")?, &package.strip_suffix),
            version: source.required_str("version")?.to_string(),
            license: source.required_str("license")?.to_string(),
            keywords: package.keywords.clone(),
            repository: package.repository.clone(),
            bugs: package.bugs.clone(),
            homepage: package.homepage.clone(),
            main: umd,
            module: es,
            types: package.types.clone(),
            exports,
            peer_dependencies,
        })
    }

    fn artifact_name(&self, artifacts: &BundleArtifactSet, format: BundleFormat) -> Result<String> {
        match artifacts.get(format) {
            Some(artifact) => Ok(artifact.file_name.clone()),
            None => Err(missing_format(format)),
        }
    }

    /// Derive the publish descriptor and write it into the output directory
    pub async fn write(
        &self,
        source: &SourceDescriptor,
        artifacts: &BundleArtifactSet,
    ) -> Result<(PathBuf, PublishDescriptor)> {
        let descriptor = self.synthesize(source, artifacts)?;

        let out_dir = artifacts.out_dir();
        let is_dir = tokio::fs::metadata(out_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(PackError::integrity(format!(
                "output directory {} does not exist, run `distpack build` first",
                out_dir.display()
            )));
        }

        artifacts.verify_references(descriptor.artifact_references())?;

        let path = out_dir.join(PUBLISH_FILE);
        let json = descriptor.to_json()?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| PackError::io(&path, e))?;

        info!("Wrote {}", path.display());

        Ok((path, descriptor))
    }
}

fn missing_format(format: BundleFormat) -> PackError {
    PackError::integrity(format!(
        "the package needs a {} bundle, add \"{}\" to library.formats",
        format, format
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::Artifact;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const CONFIG: &str = r#"
        [library]
        name = "IBSheetVue"
        file_name = "ibsheet-vue"
        entry = "src/components/index.ts"

        [[externals]]
        id = "vue"
        global = "Vue"
        range = "^3.0.0"
    "#;

    fn artifact_set(out_dir: &Path, formats: &[BundleFormat]) -> BundleArtifactSet {
        let artifacts = formats
            .iter()
            .map(|&format| Artifact {
                format,
                file_name: format!("ibsheet-vue.{}.js", format),
                path: out_dir.join(format!("ibsheet-vue.{}.js", format)),
                size: 0,
                digest: String::new(),
            })
            .collect();
        BundleArtifactSet::new(out_dir.to_path_buf(), artifacts)
    }

    fn synthesizer(config: &str) -> Synthesizer {
        Synthesizer::new(Arc::new(
            Config::from_toml(config, PathBuf::from("/project")).unwrap(),
        ))
    }

    fn source() -> SourceDescriptor {
        SourceDescriptor::parse(
            r#"{
                "name": "ibsheet-vue-component",
                "version": "1.2.0",
                "license": "MIT",
                "private": false,
                "scripts": { "build": "vite build" },
                "devDependencies": { "vite": "^5.0.0" }
            }"#,
            Path::new("package.json"),
        )
        .unwrap()
    }

    #[test]
    fn test_end_to_end_descriptor() {
        let artifacts = artifact_set(Path::new("/project/dist/ibsheet-vue"), &[BundleFormat::Es, BundleFormat::Umd]);
        let descriptor = synthesizer(CONFIG).synthesize(&source(), &artifacts).unwrap();

        let expected = r#"{
  "name": "ibsheet-vue",
  "version": "1.2.0",
  "license": "MIT",
  "main": "ibsheet-vue.umd.js",
  "module": "ibsheet-vue.es.js",
  "types": "./types/index.d.ts",
  "exports": {
    ".": {
      "types": "./types/index.d.ts",
      "import": "./ibsheet-vue.es.js",
      "require": "./ibsheet-vue.umd.js",
      "default": "./ibsheet-vue.umd.js"
    }
  },
  "peerDependencies": {
    "vue": "^3.0.0"
  }
}
"#;
        assert_eq!(descriptor.to_json().unwrap(), expected);
    }

    #[test]
    fn test_static_metadata_comes_from_configuration() {
        let config = format!(
            "{}\n{}",
            CONFIG,
            r#"
            [package]
            keywords = ["vue", "ibsheet", "grid", "component"]
            homepage = "https://www.ibsheet.com/"
            repository = { type = "git", url = "https://github.com/ibsheet/ibsheet-vue-component.git" }
            bugs = { url = "https://github.com/ibsheet/ibsheet-vue-component/issues" }
            "#
        );
        let artifacts = artifact_set(Path::new("/project/dist/ibsheet-vue"), &[BundleFormat::Es, BundleFormat::Umd]);
        let json = synthesizer(&config)
            .synthesize(&source(), &artifacts)
            .unwrap()
            .to_json()
            .unwrap();

        let keys: Vec<&str> = json
            .lines()
            .filter(|l| l.starts_with("  \""))
            .map(|l| l.trim().split('"').nth(1).unwrap())
            .collect();
        assert_eq!(
            keys,
            vec![
                "name",
                "version",
                "license",
                "keywords",
                "repository",
                "bugs",
                "homepage",
                "main",
                "module",
                "types",
                "exports",
                "peerDependencies",
            ]
        );
        assert!(json.contains("\"type\": \"git\""));
        assert!(!json.contains("scripts"));
        assert!(!json.contains("devDependencies"));
        assert!(!json.contains("private"));
    }

    #[test]
    fn test_missing_format_is_an_integrity_error() {
        let artifacts = artifact_set(Path::new("/project/dist/ibsheet-vue"), &[BundleFormat::Es]);
        let err = synthesizer(CONFIG).synthesize(&source(), &artifacts).unwrap_err();
        assert!(matches!(err, PackError::Integrity(_)));
        assert!(err.to_string().contains("umd"));
    }

    #[test]
    fn test_missing_version_is_an_integrity_error() {
        let source = SourceDescriptor::parse(
            r#"{"name": "ibsheet-vue-component", "license": "MIT"}"#,
            Path::new("package.json"),
        )
        .unwrap();
        let artifacts = artifact_set(Path::new("/project/dist/ibsheet-vue"), &[BundleFormat::Es, BundleFormat::Umd]);

        let err = synthesizer(CONFIG).synthesize(&source, &artifacts).unwrap_err();
        assert!(matches!(err, PackError::Integrity(_)));
        assert!(err.to_string().contains("'version'"));
    }

    #[test]
    fn test_externals_without_range_are_not_peers() {
        let config = CONFIG.replace("range = \"^3.0.0\"\n", "");
        let artifacts = artifact_set(Path::new("/project/dist/ibsheet-vue"), &[BundleFormat::Es, BundleFormat::Umd]);
        let descriptor = synthesizer(&config).synthesize(&source(), &artifacts).unwrap();
        assert!(descriptor.peer_dependencies.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_requires_publishable_formats() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "ibsheet-vue-component", "version": "1.2.0", "license": "MIT"}"#,
        )
        .unwrap();
        let config = CONFIG.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"es\", \"cjs\"]",
        );
        let synthesizer = Synthesizer::new(Arc::new(
            Config::from_toml(&config, dir.path().to_path_buf()).unwrap(),
        ));

        let err = synthesizer.preflight().await.unwrap_err();
        assert!(matches!(err, PackError::Integrity(_)));
        assert!(err.to_string().contains("needs a umd bundle"));

        let synthesizer = Synthesizer::new(Arc::new(
            Config::from_toml(CONFIG, dir.path().to_path_buf()).unwrap(),
        ));
        assert!(synthesizer.preflight().await.is_ok());
    }

    #[tokio::test]
    async fn test_write_requires_output_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let artifacts = artifact_set(&dir.path().join("dist/ibsheet-vue"), &[BundleFormat::Es, BundleFormat::Umd]);

        let err = synthesizer(CONFIG).write(&source(), &artifacts).await.unwrap_err();
        assert!(matches!(err, PackError::Integrity(_)));
        assert!(err.to_string().contains("run `distpack build` first"));
    }

    #[tokio::test]
    async fn test_write_rejects_dangling_reference() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = dir.path().join("dist/ibsheet-vue");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("ibsheet-vue.es.js"), "").unwrap();
        let artifacts = artifact_set(&out, &[BundleFormat::Es, BundleFormat::Umd]);

        let err = synthesizer(CONFIG).write(&source(), &artifacts).await.unwrap_err();
        assert!(matches!(err, PackError::Integrity(_)));
        assert!(err.to_string().contains("ibsheet-vue.umd.js"));
        assert!(!out.join(PUBLISH_FILE).exists());
    }
}
