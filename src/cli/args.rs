//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::EditCommand;

/// Build and edit boolean filter expressions (AND/OR operators over criteria)
#[derive(Parser, Debug)]
#[command(name = "exprtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Start from a bare root operator instead of the sample expression
    #[arg(long, global = true)]
    pub empty: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the expression tree
    Show,

    /// Apply edits in order and print the resulting tree
    Apply {
        /// move:DRAGGED:TARGET, add-criteria:PARENT, add-operator[:PARENT],
        /// remove:NODE, change:NODE:AND|OR
        #[arg(required = true)]
        edits: Vec<EditCommand>,

        /// Stop at the first rejected edit
        #[arg(long)]
        strict: bool,

        /// Print the tree after every edit
        #[arg(long)]
        each: bool,
    },

    /// Check whether a node may be dropped onto a target
    CanAccept {
        /// Node being dragged
        dragged: String,
        /// Drop target
        target: String,
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
    /// Show effective configuration
    Show,
    /// Print a commented config template
    Template,
    /// Show the global config file location
    Path,
}
