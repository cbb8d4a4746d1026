// ABOUTME: Command module aggregator for the scon CLI.
// ABOUTME: Re-exports lifecycle and config command handlers.

pub mod config;
mod lifecycle;
mod prompt;

pub use lifecycle::{create, delete, list, prune, snapshot, start, stop, tag};
