//! Package descriptor types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{BugsConfig, RepositoryConfig};
use crate::error::{PackError, Result};

/// The development `package.json`, kept as an open JSON object
///
/// Only the fields the publish descriptor copies are ever read.
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    path: PathBuf,
    fields: Map<String, Value>,
}

impl SourceDescriptor {
    /// Read and parse a descriptor file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PackError::input(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse descriptor text; `path` is only used in error messages
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        match serde_json::from_str::<Value>(content) {
            Ok(Value::Object(fields)) => Ok(Self {
                path: path.to_path_buf(),
                fields,
            }),
            Ok(_) => Err(PackError::input(path, "package descriptor is not a JSON object")),
            Err(e) => Err(PackError::input(path, format!("invalid JSON: {}", e))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A string field that must be present
    pub fn required_str(&self, field: &str) -> Result<&str> {
        match self.fields.get(field) {
            Some(Value::String(value)) => Ok(value.as_str()),
            Some(_) => Err(PackError::integrity(format!(
                "field '{}' in {} must be a string",
                field,
                self.path.display()
            ))),
            None => Err(PackError::integrity(format!(
                "{} is missing required field '{}'",
                self.path.display(),
                field
            ))),
        }
    }
}

/// Remove `suffix` from the end of `name`, once
pub fn publish_name(name: &str, suffix: &str) -> String {
    name.strip_suffix(suffix).unwrap_or(name).to_string()
}

/// Resolution conditions for one subpath export
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConditions {
    pub types: String,
    pub import: String,
    pub require: String,
    pub default: String,
}

/// The trimmed `package.json` that ships with the bundles
///
/// Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishDescriptor {
    pub name: String,
    pub version: String,
    pub license: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bugs: Option<BugsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    pub main: String,
    pub module: String,
    pub types: String,
    pub exports: BTreeMap<String, ExportConditions>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PublishDescriptor {
    /// Every path the descriptor points at inside the output directory
    ///
    /// `types` is left out: declarations come from a separate step.
    pub fn artifact_references(&self) -> Vec<&str> {
        let mut refs = vec![self.main.as_str(), self.module.as_str()];
        for conditions in self.exports.values() {
            refs.push(&conditions.import);
            refs.push(&conditions.require);
            refs.push(&conditions.default);
        }
        refs
    }

    /// Pretty-printed JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| PackError::integrity(format!("cannot serialize package descriptor: {}", e)))?;
        json.push('\n');
        Ok(json)
    }
}
