// ABOUTME: Library root for scon - exposes the engine and its types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod output;
pub mod paths;
pub mod runtime;
pub mod types;
