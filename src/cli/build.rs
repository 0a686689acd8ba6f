//! Build command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::{BundleArtifactSet, Bundler};
use crate::config::Config;
use crate::utils::{format_duration, format_size};

/// Bundle the library into every configured format
#[derive(Args, Debug)]
pub struct BuildCommand {}

impl BuildCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Arc::new(Config::load(config_path)?);

        run_build(config).await?;
        Ok(())
    }
}

/// Run the build step and print its summary
pub(crate) async fn run_build(config: Arc<Config>) -> Result<BundleArtifactSet> {
    eprintln!(
        "{} Building {}...",
        "→".blue(),
        config.library.name.cyan()
    );

    let result = Bundler::new(config)
        .build()
        .await
        .context("build step failed")?;

    eprintln!(
        "\n{} Built {} bundle(s) from {} module(s) in {}\n",
        "✓".green().bold(),
        result.artifacts.artifacts().len(),
        result.modules,
        format_duration(result.duration)
    );

    for artifact in result.artifacts.artifacts() {
        eprintln!(
            "  {} {} {} {}",
            "•".dimmed(),
            artifact.path.display().to_string().cyan(),
            format_size(artifact.size).dimmed(),
            artifact.digest[..12].dimmed()
        );
    }

    eprintln!();

    Ok(result.artifacts)
}
