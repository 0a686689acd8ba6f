//! distpack - packages a component library for distribution
//!
//! Builds the library into several module formats with its host framework
//! left external, then derives a minimal publish-ready `package.json`.
//!
//! # Commands
//! - `build`: es/umd/cjs/iife bundles into the output directory
//! - `pack`: the publish descriptor for an existing build
//! - `release`: both, failing before the build on a broken descriptor

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use distpack_lib::{Cli, PackError};

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("distpack=debug,distpack_lib=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("distpack=info,distpack_lib=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Print a failed run as `<Kind>: <step>: <cause>`
fn report(err: &anyhow::Error) {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PackError>())
        .map_or("Error", PackError::kind);
    eprintln!("{} {:#}", format!("{}:", kind).red().bold(), err);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}
