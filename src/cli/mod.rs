//! Command-line interface for distpack
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `build`: Bundle the library into every configured format
//! - `pack`: Write the publish descriptor next to the bundles
//! - `release`: Build, then pack

mod build;
mod pack;
mod release;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

pub use build::BuildCommand;
pub use pack::PackCommand;
pub use release::ReleaseCommand;

/// distpack - package a component library for distribution
#[derive(Parser, Debug)]
#[command(name = "distpack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to distpack.toml config file
    #[arg(short, long, global = true, default_value = "distpack.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bundle the library into every configured format
    Build(BuildCommand),

    /// Write the publish package.json into the output directory
    Pack(PackCommand),

    /// Build the bundles, then pack them
    Release(ReleaseCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        print_banner();

        match &self.command {
            Commands::Build(cmd) => cmd.execute(&self.config).await,
            Commands::Pack(cmd) => cmd.execute(&self.config).await,
            Commands::Release(cmd) => cmd.execute(&self.config).await,
        }
    }
}

/// Print the distpack banner
fn print_banner() {
    eprintln!(
        "\n{} {} {}\n",
        "📦".cyan(),
        "distpack".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["distpack", "release", "-v", "--config", "lib/distpack.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, "lib/distpack.toml");
        assert!(matches!(cli.command, Commands::Release(_)));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["distpack", "pack"]).unwrap();
        assert_eq!(cli.config, "distpack.toml");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_unknown_subcommand() {
        assert!(Cli::try_parse_from(["distpack", "dev"]).is_err());
    }
}
