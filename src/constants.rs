// src/constants.rs

/// Name of the configuration directory (inside the system config dir).
pub const CONFIG_DIR_NAME: &str = "goshim";

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Overrides the configuration directory location.
pub const CONFIG_DIR_ENV: &str = "GOSHIM_CONFIG_DIR";

/// When set to `1`, every tool call is routed through the alternate shell.
pub const ALTERNATE_MODE_ENV: &str = "GO_WSL";

/// Path of the shell used to reach the alternate environment.
pub const ALTERNATE_SHELL_ENV: &str = "GO_WSL_SHELL";

/// Flag passed to the alternate shell ahead of the joined command string.
pub const ALTERNATE_SHELL_FLAG: &str = "-ic";

/// Exit code POSIX shells use for "command not found".
pub const SHELL_COMMAND_NOT_FOUND: i32 = 127;

pub const GURU: &str = "guru";
pub const GORENAME: &str = "gorename";

/// External diff program `gorename -d` shells out to.
pub const DIFF_TOOL: &str = "diff";

/// The Go toolchain, used to install missing tools.
pub const GO: &str = "go";
