//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::domain::GetMode;

/// Resolve, download and validate trees of configuration modules
#[derive(Parser, Debug)]
#[command(name = "modtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file, layered over the global one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Load sibling modules in parallel
    #[arg(long, global = true)]
    pub parallel: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download missing modules and print the tree
    Get {
        /// Root module directory
        #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// Re-download every module
        #[arg(short, long)]
        update: bool,
    },

    /// Print the module tree
    Tree {
        /// Root module directory
        #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// none | get | update (default: from settings)
        #[arg(short, long)]
        mode: Option<GetMode>,
    },

    /// Load the tree and check module contracts
    Validate {
        /// Root module directory
        #[arg(default_value = ".", value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        /// none | get | update (default: from settings)
        #[arg(short, long)]
        mode: Option<GetMode>,
    },

    /// Download a single source into a directory
    Fetch {
        /// Source string, e.g. `git::https://host/repo.git?ref=v1`
        source: String,
        /// Destination directory
        #[arg(value_hint = ValueHint::DirPath)]
        dest: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Show config file locations
    Path,
    /// Print a template config file
    Template,
}
