// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scon")]
#[command(about = "Stateful containers for Docker and Podman: stop, snapshot, resume")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub format: FormatArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
#[group(multiple = false)]
pub struct FormatArgs {
    /// Print only final results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print JSON lines
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new stateful container from a base image
    Create {
        /// Stateful container name
        name: String,
        /// Base image, e.g. nginx:latest
        image: String,
    },

    /// Run a fresh instance from the latest saved state
    Start { name: String },

    /// Stop the running instance and save its state as a snapshot
    Stop {
        name: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a stateful container and optionally its snapshot images
    Delete {
        name: String,
        /// entry-only, all-snapshots, or keep-latest-snapshot (asks if omitted)
        option: Option<String>,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Save the running instance's state without stopping it
    Snapshot {
        name: String,
        /// Protect the snapshot from automatic removal
        #[arg(short, long)]
        tag: bool,
    },

    /// Protect a snapshot from automatic removal
    Tag {
        name: String,
        /// Snapshot, e.g. v3 or web:v3
        snapshot: String,
    },

    /// Make a snapshot eligible for automatic removal again
    Untag { name: String, snapshot: String },

    /// Apply snapshot retention now
    Prune {
        /// Only this stateful container
        name: Option<String>,
    },

    /// List stateful containers
    List,

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Set a configuration value
    Set { key: String, value: String },
    /// Show the current configuration
    Show,
}
