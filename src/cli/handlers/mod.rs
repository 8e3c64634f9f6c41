// src/cli/handlers/mod.rs

// One module per command in the dispatcher registry.

pub mod commons;
pub mod config;
pub mod exec;
pub mod install;
pub mod references;
pub mod rename;
pub mod translate;
