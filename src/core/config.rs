// src/core/config.rs

//! Loading of `config.toml` and construction of the [`ExecutionMode`].
//!
//! The environment (`GO_WSL`, `GO_WSL_SHELL`) is read once, at load time, and
//! folded into the config. Nothing downstream looks at process state again.

use crate::{
    constants::{ALTERNATE_MODE_ENV, ALTERNATE_SHELL_ENV},
    core::paths::{self, PathError},
    models::ShimConfig,
    system::executor::ExecutionMode,
};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Failed to parse config.toml: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Failed to serialize config to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Alternate mode is enabled but no alternate shell is configured (set `alternate.shell` or GO_WSL_SHELL).")]
    MissingAlternateShell,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
}

/// Loads the config from the user's config directory, writing a default file
/// on first use, then applies the process environment.
pub fn load() -> Result<ShimConfig, ConfigError> {
    let path = paths::get_config_file_path()?;
    let mut config = load_or_create(&path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    log::debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Reads `path`, or writes and returns the default config when it does not exist.
pub fn load_or_create(path: &Path) -> Result<ShimConfig, ConfigError> {
    if !path.exists() {
        let default_config = ShimConfig::default();
        let toml_string = toml::to_string_pretty(&default_config)?;
        fs::write(path, toml_string)?;
        log::debug!("Wrote default configuration to {}", path.display());
        return Ok(default_config);
    }
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Folds the alternate-environment variables into `config`. `lookup` stands in
/// for `std::env::var` so callers can supply any environment.
pub fn apply_env_overrides<F>(config: &mut ShimConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(flag) = lookup(ALTERNATE_MODE_ENV) {
        config.alternate.enabled = flag.trim() == "1";
    }
    if let Some(shell) = lookup(ALTERNATE_SHELL_ENV).filter(|s| !s.trim().is_empty()) {
        config.alternate.shell = Some(shell);
    }
}

/// Builds the execution mode the shim will run with.
pub fn execution_mode(config: &ShimConfig) -> Result<ExecutionMode, ConfigError> {
    if !config.alternate.enabled {
        return Ok(ExecutionMode::Native);
    }
    let shell = config
        .alternate
        .shell
        .as_deref()
        .ok_or(ConfigError::MissingAlternateShell)?;
    Ok(ExecutionMode::Alternate {
        shell: expand_path(shell)?,
    })
}

/// Expands `~` and environment variables in a configured path.
pub fn expand_path(raw: &str) -> Result<PathBuf, ConfigError> {
    let expanded = shellexpand::full(raw).map_err(|e| ConfigError::Expansion {
        path: raw.to_string(),
        message: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = load_or_create(&path).unwrap();
        assert_eq!(config, ShimConfig::default());
        assert!(path.exists());

        // The written file must load back to the same thing.
        assert_eq!(load_or_create(&path).unwrap(), config);
    }

    #[test]
    fn test_load_or_create_reads_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "build_tags = \"linux integration\"\n").unwrap();

        let config = load_or_create(&path).unwrap();
        assert_eq!(config.build_tags, "linux integration");
    }

    #[test]
    fn test_load_or_create_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "build_tags = [").unwrap();

        assert!(matches!(load_or_create(&path), Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_env_overrides_enable_alternate_mode() {
        let mut config = ShimConfig::default();
        apply_env_overrides(&mut config, env_of(&[("GO_WSL", "1"), ("GO_WSL_SHELL", "/bin/bash")]));

        assert!(config.alternate.enabled);
        assert_eq!(
            execution_mode(&config).unwrap(),
            ExecutionMode::Alternate {
                shell: PathBuf::from("/bin/bash")
            }
        );
    }

    #[test]
    fn test_env_override_can_disable_alternate_mode() {
        let mut config = ShimConfig::default();
        config.alternate.enabled = true;
        config.alternate.shell = Some("bash.exe".to_string());
        apply_env_overrides(&mut config, env_of(&[("GO_WSL", "0")]));

        assert_eq!(execution_mode(&config).unwrap(), ExecutionMode::Native);
        assert_eq!(config.alternate.shell.as_deref(), Some("bash.exe"));
    }

    #[test]
    fn test_no_env_keeps_file_values() {
        let mut config = ShimConfig::default();
        apply_env_overrides(&mut config, env_of(&[]));
        assert_eq!(config, ShimConfig::default());
        assert_eq!(execution_mode(&config).unwrap(), ExecutionMode::Native);
    }

    #[test]
    fn test_alternate_mode_requires_shell() {
        let mut config = ShimConfig::default();
        apply_env_overrides(&mut config, env_of(&[("GO_WSL", "1"), ("GO_WSL_SHELL", "  ")]));
        assert!(matches!(
            execution_mode(&config),
            Err(ConfigError::MissingAlternateShell)
        ));
    }

    #[test]
    fn test_expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/usr/bin/bash").unwrap(), PathBuf::from("/usr/bin/bash"));
    }
}
