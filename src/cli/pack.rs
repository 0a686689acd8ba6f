//! Pack command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::bundler::BundleArtifactSet;
use crate::config::Config;
use crate::manifest::{SourceDescriptor, Synthesizer};

/// Write the publish package.json into the output directory
#[derive(Args, Debug)]
pub struct PackCommand {}

impl PackCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Arc::new(Config::load(config_path)?);

        let synthesizer = Synthesizer::new(config.clone());
        let source = synthesizer
            .load_source()
            .await
            .context("pack step failed")?;
        let artifacts = BundleArtifactSet::open(&config)
            .await
            .context("pack step failed")?;

        run_pack(&synthesizer, &source, &artifacts).await
    }
}

/// Run the pack step and print its summary
pub(crate) async fn run_pack(
    synthesizer: &Synthesizer,
    source: &SourceDescriptor,
    artifacts: &BundleArtifactSet,
) -> Result<()> {
    eprintln!("{} Writing package descriptor...", "→".blue());

    let (path, descriptor) = synthesizer
        .write(source, artifacts)
        .await
        .context("pack step failed")?;

    eprintln!(
        "\n{} Packed {}@{}\n",
        "✓".green().bold(),
        descriptor.name.bold(),
        descriptor.version
    );
    eprintln!(
        "  {} {}",
        "•".dimmed(),
        path.display().to_string().cyan()
    );
    for (id, range) in &descriptor.peer_dependencies {
        eprintln!("  {} peer {} {}", "•".dimmed(), id, range.dimmed());
    }
    eprintln!();

    Ok(())
}
