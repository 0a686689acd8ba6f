//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::bundler::BundleFormat;

/// Library build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Global variable name exposed by the umd and iife formats
    pub name: String,

    /// Artifact slug, artifacts are written as `{file_name}.{format}.js`
    pub file_name: String,

    /// Library entry point, relative to the project root
    pub entry: String,

    /// Output directory, defaults to `dist/{file_name}`
    #[serde(default)]
    pub out_dir: Option<String>,

    /// Module formats to produce
    #[serde(default = "default_formats")]
    pub formats: Vec<BundleFormat>,
}

fn default_formats() -> Vec<BundleFormat> {
    vec![BundleFormat::Es, BundleFormat::Umd]
}

/// A dependency that is left out of every bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    /// Import specifier, matched exactly
    pub id: String,

    /// Global binding used by the umd and iife formats
    #[serde(default)]
    pub global: Option<String>,

    /// Semver range declared under `peerDependencies`
    #[serde(default)]
    pub range: Option<String>,
}

/// Publish descriptor settings and the static metadata table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Development descriptor to derive from
    #[serde(default = "default_descriptor")]
    pub descriptor: String,

    /// Trailing token removed from the development package name
    #[serde(default = "default_strip_suffix")]
    pub strip_suffix: String,

    /// Type declaration entry, produced by a separate step
    #[serde(default = "default_types")]
    pub types: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub repository: Option<RepositoryConfig>,

    #[serde(default)]
    pub bugs: Option<BugsConfig>,

    #[serde(default)]
    pub homepage: Option<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            descriptor: default_descriptor(),
            strip_suffix: default_strip_suffix(),
            types: default_types(),
            keywords: Vec::new(),
            repository: None,
            bugs: None,
            homepage: None,
        }
    }
}

fn default_descriptor() -> String {
    "package.json".to_string()
}

fn default_strip_suffix() -> String {
    "-component".to_string()
}

fn default_types() -> String {
    "./types/index.d.ts".to_string()
}

/// `repository` field of the publish descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(rename = "type")]
    pub kind: String,

    pub url: String,
}

/// `bugs` field of the publish descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugsConfig {
    pub url: String,
}
