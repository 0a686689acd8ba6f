//! distpack library
//!
//! Core functionality for the distpack packaging tool: the multi-format
//! bundle builder and the publish descriptor synthesizer.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod transform;
pub mod utils;

pub use bundler::{BundleArtifactSet, BundleFormat, Bundler};
pub use cli::Cli;
pub use config::Config;
pub use error::{PackError, Result};
pub use manifest::{PublishDescriptor, SourceDescriptor, Synthesizer};
