//! Configuration management for the code-embed command line.
//!
//! Handles:
//! - Command-line argument parsing
//! - Plugin data file location

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for code-embed
#[derive(Debug, Parser)]
#[command(name = "code-embed")]
#[command(about = "Render Markdown notes with embedded, highlighted code files")]
#[command(version)]
pub struct Args {
    /// Plugin data file holding the language mappings
    #[arg(long, global = true, help = "Plugin data file (.json or .toml)")]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(
        long,
        global = true,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a Markdown document and print the resulting HTML
    Render(RenderArgs),
    /// Show or edit the extension to grammar mappings
    #[command(subcommand)]
    Mappings(MappingsCommand),
}

#[derive(Debug, Clone, clap::Args)]
pub struct RenderArgs {
    /// Markdown document to render
    pub document: PathBuf,

    /// Vault directory embeds are resolved in
    #[arg(long, help = "Vault root (defaults to the document's directory)")]
    pub vault: Option<PathBuf>,

    /// Print every code block expanded
    #[arg(long)]
    pub expand: bool,

    /// Render again whenever the plugin data file changes
    #[arg(long)]
    pub watch: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum MappingsCommand {
    /// List the active mappings
    List,
    /// Map an extension to a grammar
    Add { extension: String, grammar: String },
    /// Remove the mapping for an extension
    Remove { extension: String },
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Plugin data file
    pub config_path: PathBuf,
    /// Log level
    pub log_level: String,
    pub command: Command,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_path = match args.config {
            Some(path) => path,
            None => default_config_path()
                .ok_or_else(|| anyhow!("Could not determine config directory, pass --config"))?,
        };

        Ok(Config {
            config_path,
            log_level: args.log_level,
            command: args.command,
        })
    }
}

/// `<config dir>/code-embed/data.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("code-embed").join("data.json"))
}
