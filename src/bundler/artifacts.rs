//! Bundle artifacts on disk
//!
//! A [`BundleArtifactSet`] only exists for an output directory that holds
//! every configured artifact, either because a build just wrote them or
//! because [`BundleArtifactSet::open`] checked they are there.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::BundleFormat;
use crate::config::Config;
use crate::error::{PackError, Result};
use crate::utils::hash_content;

/// A single written bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub format: BundleFormat,

    /// File name inside the output directory
    pub file_name: String,

    /// Absolute path
    pub path: PathBuf,

    /// Size in bytes
    pub size: usize,

    /// SHA-256 of the contents, hex encoded
    pub digest: String,
}

/// The artifacts of one build, in configured format order
#[derive(Debug, Clone)]
pub struct BundleArtifactSet {
    out_dir: PathBuf,
    artifacts: Vec<Artifact>,
}

impl BundleArtifactSet {
    pub(crate) fn new(out_dir: PathBuf, artifacts: Vec<Artifact>) -> Self {
        Self { out_dir, artifacts }
    }

    /// Re-open the output of an earlier build
    pub async fn open(config: &Config) -> Result<Self> {
        let out_dir = config.output_dir();

        if !tokio::fs::metadata(&out_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(PackError::integrity(format!(
                "output directory {} does not exist, run `distpack build` first",
                out_dir.display()
            )));
        }

        let mut artifacts = Vec::with_capacity(config.library.formats.len());
        for &format in &config.library.formats {
            let file_name = config.artifact_file_name(format);
            let path = out_dir.join(&file_name);
            let content = tokio::fs::read(&path).await.map_err(|_| {
                PackError::integrity(format!(
                    "{} artifact {} is missing, run `distpack build` first",
                    format,
                    path.display()
                ))
            })?;

            debug!("Found {} artifact: {}", format, file_name);

            artifacts.push(Artifact {
                format,
                file_name,
                path,
                size: content.len(),
                digest: hash_content(&content),
            });
        }

        Ok(Self::new(out_dir, artifacts))
    }

    /// Artifact for a format, if it was built
    pub fn get(&self, format: BundleFormat) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.format == format)
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Every file under the output directory, relative and `/` separated
    pub fn listing(&self) -> Vec<String> {
        let mut files: Vec<String> = WalkDir::new(&self.out_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                pathdiff::diff_paths(e.path(), &self.out_dir)
                    .map(|p| p.display().to_string().replace('\\', "/"))
            })
            .collect();
        files.sort();
        files
    }

    /// Check that every `./file` reference names a file in the output
    /// directory
    pub fn verify_references<'a>(&self, references: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let listing = self.listing();

        for reference in references {
            let relative = reference.trim_start_matches("./");
            if !listing.iter().any(|f| f == relative) {
                return Err(PackError::integrity(format!(
                    "'{}' does not exist in {}",
                    reference,
                    self.out_dir.display()
                )));
            }
        }

        Ok(())
    }
}
