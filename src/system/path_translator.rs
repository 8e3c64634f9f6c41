// src/system/path_translator.rs

//! Conversion between host-native Windows paths (`C:\src\app\main.go`) and
//! the form the same file has inside the alternate environment
//! (`/mnt/c/src/app/main.go`).
//!
//! Classification happens once, in [`PathForm::classify`]. Anything that does
//! not have the exact shape of a drive path is [`PathForm::Plain`] and is never
//! rewritten, so flags, tags and offsets survive untouched.

use std::fmt;

const MOUNT_PREFIX: &str = "/mnt/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathForm {
    /// `X:\rest`; `rest` keeps its backslashes and is never empty.
    ///
    /// Only the canonical form (upper-case drive, backslash separators) survives
    /// a trip through the alternate form unchanged. `c:\a` and `C:\a/b` come
    /// back as `C:\a` and `C:\a\b`.
    Native { drive: char, rest: String },
    /// `/mnt/x` or `/mnt/x/rest`; `rest` uses forward slashes, may be empty.
    Alternate { drive: char, rest: String },
    /// Not a path this module knows how to translate.
    Plain(String),
}

impl PathForm {
    pub fn classify(token: &str) -> Self {
        if let Some((drive, rest)) = split_native(token) {
            return Self::Native {
                drive,
                rest: rest.to_string(),
            };
        }
        if let Some((drive, rest)) = split_alternate(token) {
            return Self::Alternate {
                drive,
                rest: rest.to_string(),
            };
        }
        Self::Plain(token.to_string())
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native { .. })
    }

    /// Renders the alternate form. Alternate and plain values come back unchanged.
    pub fn into_alternate(self) -> String {
        match self {
            Self::Native { drive, rest } => format!(
                "{}{}/{}",
                MOUNT_PREFIX,
                drive.to_ascii_lowercase(),
                rest.replace('\\', "/")
            ),
            other => other.to_string(),
        }
    }

    /// Renders the native form with an upper-case drive letter. Native and plain
    /// values come back unchanged.
    pub fn into_native(self) -> String {
        match self {
            Self::Alternate { drive, rest } => {
                format!("{}:\\{}", drive.to_ascii_uppercase(), rest.replace('/', "\\"))
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for PathForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native { drive, rest } => write!(f, "{}:\\{}", drive, rest),
            Self::Alternate { drive, rest } if rest.is_empty() => {
                write!(f, "{}{}", MOUNT_PREFIX, drive)
            }
            Self::Alternate { drive, rest } => write!(f, "{}{}/{}", MOUNT_PREFIX, drive, rest),
            Self::Plain(token) => f.write_str(token),
        }
    }
}

pub fn to_alternate_form(native_path: &str) -> String {
    PathForm::classify(native_path).into_alternate()
}

pub fn to_native_form(alternate_path: &str) -> String {
    PathForm::classify(alternate_path).into_native()
}

/// Splits `X:\rest` into its drive letter and a non-empty `rest`.
fn split_native(token: &str) -> Option<(char, &str)> {
    let mut chars = token.chars();
    let drive = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str().strip_prefix(":\\")?;
    if rest.is_empty() {
        return None;
    }
    Some((drive, rest))
}

/// Splits `/mnt/x[/rest]` into its drive letter and `rest`.
fn split_alternate(token: &str) -> Option<(char, &str)> {
    let after_mount = token.strip_prefix(MOUNT_PREFIX)?;
    let mut chars = after_mount.chars();
    let drive = chars.next().filter(char::is_ascii_alphabetic)?;
    let tail = chars.as_str();
    if tail.is_empty() {
        return Some((drive, ""));
    }
    let rest = tail.strip_prefix('/')?;
    Some((drive, rest))
}
