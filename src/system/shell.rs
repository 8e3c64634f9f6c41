// src/system/shell.rs

//! Shell helpers: the platform shell used for single command strings, command
//! line joining for the alternate shell, and executable lookups.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Argument '{0}' cannot be passed through a shell (contains a NUL byte).")]
pub struct QuoteError(pub String);

/// The shell and flag that run a single command string on this platform.
pub fn platform_shell() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Joins a program and its arguments into one POSIX shell command string,
/// quoting every word that needs it.
pub fn join_command<S: AsRef<str>>(program: &str, args: &[S]) -> Result<String, QuoteError> {
    let mut words = Vec::with_capacity(args.len() + 1);
    words.push(quote_word(program)?);
    for arg in args {
        words.push(quote_word(arg.as_ref())?);
    }
    Ok(words.join(" "))
}

/// `cd <dir> && <command>`, with `dir` quoted.
pub fn with_working_dir(dir: &str, command: &str) -> Result<String, QuoteError> {
    Ok(format!("cd {} && {}", quote_word(dir)?, command))
}

fn quote_word(word: &str) -> Result<String, QuoteError> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|_| QuoteError(word.to_string()))
}

/// First directory in `dirs` holding `executable_name`. On Windows the
/// `.exe` suffix is also tried.
pub(crate) fn find_in_dirs<I>(executable_name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .find_map(|dir| executable_in_dir(&dir, executable_name))
}

pub(crate) fn executable_in_dir(dir: &Path, executable_name: &str) -> Option<PathBuf> {
    let candidate = dir.join(executable_name);
    if candidate.is_file() {
        return Some(candidate);
    }
    if cfg!(target_os = "windows") && candidate.extension() != Some(OsStr::new("exe")) {
        let with_exe = dir.join(format!("{}.exe", executable_name));
        if with_exe.is_file() {
            return Some(with_exe);
        }
    }
    None
}
