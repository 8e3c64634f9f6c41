// src/core/tools.rs

//! Locating the Go tool binaries.
//!
//! Resolution order for a tool: the path configured in `config.toml`, then
//! `$GOBIN`, each `$GOPATH/bin`, `PATH` and finally `~/go/bin`. When nothing
//! matches, the bare name is returned and left to the OS to find (or not).
//! In alternate mode the tools live on the other side of the shell, so host
//! directories are never searched.

use crate::constants::{GORENAME, GURU};
use crate::core::config;
use crate::models::ToolsConfig;
use crate::system::executor::ExecutionMode;
use crate::system::shell;
use std::env;
use std::path::PathBuf;

/// A tool the shim knows how to install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownTool {
    pub name: &'static str,
    pub import_path: &'static str,
}

pub const KNOWN_TOOLS: &[KnownTool] = &[
    KnownTool {
        name: GURU,
        import_path: "golang.org/x/tools/cmd/guru",
    },
    KnownTool {
        name: GORENAME,
        import_path: "golang.org/x/tools/cmd/gorename",
    },
];

pub fn find_known_tool(name: &str) -> Option<&'static KnownTool> {
    KNOWN_TOOLS.iter().find(|tool| tool.name == name)
}

#[derive(Debug, Clone, Default)]
pub struct ToolLocator {
    configured: ToolsConfig,
    alternate: bool,
    gobin: Option<PathBuf>,
    gopath: Vec<PathBuf>,
    path: Vec<PathBuf>,
    home: Option<PathBuf>,
}

impl ToolLocator {
    /// A locator reading the process environment.
    pub fn from_env(configured: &ToolsConfig, mode: &ExecutionMode) -> Self {
        Self::with_lookup(
            configured,
            mode,
            |key| env::var(key).ok(),
            dirs::home_dir(),
        )
    }

    /// A locator over an arbitrary environment.
    pub fn with_lookup<F>(
        configured: &ToolsConfig,
        mode: &ExecutionMode,
        lookup: F,
        home: Option<PathBuf>,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let split = |key: &str| -> Vec<PathBuf> {
            lookup(key)
                .map(|value| {
                    env::split_paths(&value)
                        .filter(|p| !p.as_os_str().is_empty())
                        .collect()
                })
                .unwrap_or_default()
        };
        Self {
            configured: configured.clone(),
            alternate: mode.is_alternate(),
            gobin: lookup("GOBIN")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            gopath: split("GOPATH"),
            path: split("PATH"),
            home,
        }
    }

    pub fn gopath(&self) -> &[PathBuf] {
        &self.gopath
    }

    /// The program to launch for `tool`.
    pub fn resolve(&self, tool: &str) -> String {
        if let Some(raw) = self.configured.configured_path(tool) {
            return match config::expand_path(raw) {
                Ok(path) => path.display().to_string(),
                Err(e) => {
                    log::warn!("{}; using the configured value as is.", e);
                    raw.to_string()
                }
            };
        }
        if self.alternate {
            log::debug!("Alternate mode: leaving '{}' to the alternate PATH.", tool);
            return tool.to_string();
        }
        match shell::find_in_dirs(tool, self.search_dirs()) {
            Some(found) => {
                log::debug!("Resolved '{}' to {}", tool, found.display());
                found.display().to_string()
            }
            None => {
                log::debug!("'{}' not found in GOBIN, GOPATH or PATH.", tool);
                tool.to_string()
            }
        }
    }

    /// True when `program` is on the host `PATH`.
    pub fn is_on_host_path(&self, program: &str) -> bool {
        shell::find_in_dirs(program, self.path.iter().cloned()).is_some()
    }

    /// `file_name` with a case-mismatched GOPATH prefix rewritten to GOPATH's
    /// own casing. Only Windows paths are case-insensitive, elsewhere the name
    /// is returned unchanged.
    pub fn canonical_file_name(&self, file_name: &str) -> String {
        if cfg!(target_os = "windows") {
            canonicalize_gopath_prefix(file_name, &self.gopath)
        } else {
            file_name.to_string()
        }
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        dirs.extend(self.gobin.iter().cloned());
        dirs.extend(self.gopath.iter().map(|root| root.join("bin")));
        dirs.extend(self.path.iter().cloned());
        dirs.extend(self.home.iter().map(|home| home.join("go").join("bin")));
        dirs
    }
}

/// Replaces the first GOPATH root that prefixes `file_name` (ignoring ASCII
/// case) with the root as written in GOPATH.
pub fn canonicalize_gopath_prefix(file_name: &str, gopath: &[PathBuf]) -> String {
    for root in gopath {
        let root = root.to_string_lossy();
        let prefix_matches = file_name
            .get(..root.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(&root));
        if !prefix_matches {
            continue;
        }
        if let Some(rest) = file_name.get(root.len()..) {
            return format!("{}{}", root, rest);
        }
    }
    file_name.to_string()
}
