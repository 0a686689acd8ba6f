//! Configuration handling for distpack
//!
//! Parses and validates `distpack.toml`. Every problem found here is a
//! [`PackError::Configuration`], raised before the build touches the disk.

mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bundler::BundleFormat;
use crate::error::{PackError, Result};
use crate::utils::clean_path;

pub use schema::*;

/// JavaScript identifiers usable as global bindings
static IDENTIFIER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Library build settings
    pub library: LibraryConfig,

    /// Dependencies left to the consumer
    #[serde(default)]
    pub externals: Vec<ExternalConfig>,

    /// Publish descriptor settings
    #[serde(default)]
    pub package: PackageConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| PackError::config(format!("cannot determine working directory: {}", e)))?
                .join(path)
        };

        let content = fs::read_to_string(&canonical_path).map_err(|e| {
            PackError::config(format!("failed to read {}: {}", canonical_path.display(), e))
        })?;

        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let config = Self::from_toml(&content, root).map_err(|e| match e {
            PackError::Configuration(msg) => {
                PackError::config(format!("{}: {}", canonical_path.display(), msg))
            }
            other => other,
        })?;

        debug!("Loaded configuration for library '{}'", config.library.name);

        Ok(config)
    }

    /// Parse and validate configuration text, anchoring relative paths at `root`
    pub fn from_toml(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).map_err(|e| PackError::config(e.to_string()))?;
        config.root = root;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let library = &self.library;

        if !IDENTIFIER_REGEX.is_match(&library.name) {
            return Err(PackError::config(format!(
                "library.name '{}' is not a valid JavaScript identifier",
                library.name
            )));
        }

        if library.file_name.is_empty()
            || library.file_name.contains(['/', '\\'])
            || library.file_name.starts_with('.')
        {
            return Err(PackError::config(format!(
                "library.file_name '{}' must be a plain file name",
                library.file_name
            )));
        }

        if library.entry.trim().is_empty() {
            return Err(PackError::config("library.entry must not be empty"));
        }

        if library.formats.is_empty() {
            return Err(PackError::config("library.formats must list at least one format"));
        }

        let mut seen = HashSet::new();
        for format in &library.formats {
            if !seen.insert(format) {
                return Err(PackError::config(format!(
                    "library.formats lists '{}' more than once",
                    format
                )));
            }
        }

        let out_dir = self.out_dir_relative();
        let cleaned = clean_path(&out_dir);
        if Path::new(&out_dir).is_absolute() || cleaned.is_empty() || cleaned.starts_with("..") {
            return Err(PackError::config(format!(
                "output directory '{}' must be inside the project root",
                out_dir
            )));
        }

        // the output directory is cleared on every build
        for (field, input) in [
            ("library.entry", &library.entry),
            ("package.descriptor", &self.package.descriptor),
        ] {
            let input = clean_path(input);
            if input == cleaned || input.starts_with(&format!("{}/", cleaned)) {
                return Err(PackError::config(format!(
                    "output directory '{}' contains {} '{}'",
                    out_dir, field, input
                )));
            }
        }

        let needs_globals = library.formats.iter().any(|f| f.uses_globals());
        let mut ids = HashSet::new();
        for external in &self.externals {
            if external.id.is_empty() {
                return Err(PackError::config("externals entry with an empty id"));
            }
            if !ids.insert(external.id.as_str()) {
                return Err(PackError::config(format!(
                    "external '{}' is declared more than once",
                    external.id
                )));
            }

            match &external.global {
                Some(global) if !IDENTIFIER_REGEX.is_match(global) => {
                    return Err(PackError::config(format!(
                        "global '{}' for external '{}' is not a valid JavaScript identifier",
                        global, external.id
                    )));
                }
                None if needs_globals => {
                    return Err(PackError::config(format!(
                        "external '{}' needs a `global` binding for the umd/iife formats",
                        external.id
                    )));
                }
                _ => {}
            }

            if let Some(range) = &external.range {
                semver::VersionReq::parse(range).map_err(|e| {
                    PackError::config(format!(
                        "range '{}' for external '{}' is not a semver requirement: {}",
                        range, external.id, e
                    ))
                })?;
            }
        }

        if self.package.strip_suffix.is_empty() {
            return Err(PackError::config("package.strip_suffix must not be empty"));
        }

        Ok(())
    }

    fn out_dir_relative(&self) -> String {
        self.library
            .out_dir
            .clone()
            .unwrap_or_else(|| format!("dist/{}", self.library.file_name))
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(clean_path(&self.out_dir_relative()))
    }

    /// Get the absolute entry point path
    pub fn entry_path(&self) -> PathBuf {
        self.root.join(&self.library.entry)
    }

    /// Get the absolute development descriptor path
    pub fn descriptor_path(&self) -> PathBuf {
        self.root.join(&self.package.descriptor)
    }

    /// Artifact file name for a format
    ///
    /// The bundler writes artifacts under this name and the manifest points
    /// at them through it, so there is exactly one naming rule.
    pub fn artifact_file_name(&self, format: BundleFormat) -> String {
        format!("{}.{}.js", self.library.file_name, format)
    }

    /// Look up an external by exact specifier
    pub fn external(&self, specifier: &str) -> Option<&ExternalConfig> {
        self.externals.iter().find(|e| e.id == specifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [library]
        name = "IBSheetVue"
        file_name = "ibsheet-vue"
        entry = "src/components/index.ts"

        [[externals]]
        id = "vue"
        global = "Vue"
        range = "^3.0.0"
    "#;

    fn parse(content: &str) -> Result<Config> {
        Config::from_toml(content, PathBuf::from("/project"))
    }

    #[test]
    fn test_defaults() {
        let config = parse(MINIMAL).unwrap();

        assert_eq!(config.library.formats, vec![BundleFormat::Es, BundleFormat::Umd]);
        assert_eq!(config.output_dir(), PathBuf::from("/project/dist/ibsheet-vue"));
        assert_eq!(config.descriptor_path(), PathBuf::from("/project/package.json"));
        assert_eq!(config.package.strip_suffix, "-component");
        assert_eq!(config.package.types, "./types/index.d.ts");
        assert_eq!(config.artifact_file_name(BundleFormat::Umd), "ibsheet-vue.umd.js");
        assert_eq!(config.artifact_file_name(BundleFormat::Es), "ibsheet-vue.es.js");
    }

    #[test]
    fn test_unknown_format_is_rejected_at_load() {
        let content = MINIMAL.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"es\", \"amd\"]",
        );
        let err = parse(&content).unwrap_err();
        assert!(matches!(err, PackError::Configuration(_)));
        assert!(err.to_string().contains("amd"));
    }

    #[test]
    fn test_format_aliases() {
        let content = MINIMAL.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"esm\", \"commonjs\"]",
        );
        let config = parse(&content).unwrap();
        assert_eq!(config.library.formats, vec![BundleFormat::Es, BundleFormat::Cjs]);
    }

    #[test]
    fn test_missing_global_for_umd() {
        let content = MINIMAL.replace("global = \"Vue\"\n", "");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("needs a `global` binding"));
    }

    #[test]
    fn test_global_not_needed_for_module_formats() {
        let content = MINIMAL
            .replace("global = \"Vue\"\n", "")
            .replace(
                "entry = \"src/components/index.ts\"",
                "entry = \"src/components/index.ts\"\nformats = [\"es\", \"cjs\"]",
            );
        assert!(parse(&content).is_ok());
    }

    #[test]
    fn test_invalid_identifiers() {
        let content = MINIMAL.replace("name = \"IBSheetVue\"", "name = \"ibsheet-vue\"");
        assert!(matches!(parse(&content), Err(PackError::Configuration(_))));

        let content = MINIMAL.replace("global = \"Vue\"", "global = \"1Vue\"");
        assert!(matches!(parse(&content), Err(PackError::Configuration(_))));
    }

    #[test]
    fn test_invalid_range() {
        let content = MINIMAL.replace("^3.0.0", "three");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("not a semver requirement"));
    }

    #[test]
    fn test_out_dir_must_stay_inside_root() {
        for out_dir in ["..", ".", "../dist", "/tmp/dist", "dist/../.."] {
            let content = MINIMAL.replace(
                "entry = \"src/components/index.ts\"",
                &format!("entry = \"src/components/index.ts\"\nout_dir = \"{}\"", out_dir),
            );
            assert!(
                matches!(parse(&content), Err(PackError::Configuration(_))),
                "out_dir {out_dir} should be rejected"
            );
        }
    }

    #[test]
    fn test_out_dir_must_not_contain_sources() {
        for out_dir in ["src", "src/components", "./src/", "src/components/index.ts", "package.json"] {
            let content = MINIMAL.replace(
                "entry = \"src/components/index.ts\"",
                &format!("entry = \"src/components/index.ts\"\nout_dir = \"{}\"", out_dir),
            );
            let err = parse(&content).unwrap_err();
            assert!(
                err.to_string().contains("output directory"),
                "out_dir {out_dir} should be rejected"
            );
        }

        let content = MINIMAL.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nout_dir = \"src-dist\"",
        );
        assert!(parse(&content).is_ok());
    }

    #[test]
    fn test_duplicate_formats_and_externals() {
        let content = MINIMAL.replace(
            "entry = \"src/components/index.ts\"",
            "entry = \"src/components/index.ts\"\nformats = [\"es\", \"es\"]",
        );
        assert!(parse(&content).is_err());

        let content = format!("{}\n[[externals]]\nid = \"vue\"\nglobal = \"Vue\"\n", MINIMAL);
        assert!(parse(&content).is_err());
    }

    #[test]
    fn test_missing_required_field() {
        let content = MINIMAL.replace("file_name = \"ibsheet-vue\"\n", "");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("file_name"));
    }

    #[test]
    fn test_static_metadata_table() {
        let content = format!(
            "{}\n{}",
            MINIMAL,
            r#"
            [package]
            keywords = ["vue", "grid"]
            homepage = "https://www.ibsheet.com/"
            repository = { type = "git", url = "https://example.com/repo.git" }
            bugs = { url = "https://example.com/repo/issues" }
            "#
        );
        let config = parse(&content).unwrap();
        assert_eq!(config.package.keywords, vec!["vue", "grid"]);
        assert_eq!(config.package.repository.as_ref().unwrap().kind, "git");
        assert_eq!(config.package.descriptor, "package.json");
    }
}
