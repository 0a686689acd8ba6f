//! Release command implementation

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::build::run_build;
use super::pack::run_pack;
use crate::config::Config;
use crate::manifest::Synthesizer;

/// Build the bundles, then pack them
#[derive(Args, Debug)]
pub struct ReleaseCommand {}

impl ReleaseCommand {
    pub async fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading configuration from {}", config_path);
        let config = Arc::new(Config::load(config_path)?);

        // A broken descriptor must fail before the build clears the output
        let synthesizer = Synthesizer::new(config.clone());
        let source = synthesizer
            .preflight()
            .await
            .context("pack step failed")?;

        let artifacts = run_build(config).await?;
        run_pack(&synthesizer, &source, &artifacts).await
    }
}
