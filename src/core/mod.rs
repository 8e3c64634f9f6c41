// src/core/mod.rs

pub mod config;
pub mod diff;
pub mod document;
pub mod notify;
pub mod paths;
pub mod provider;
pub mod references;
pub mod rename;
pub mod tools;
