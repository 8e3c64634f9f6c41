//! # System Interaction Layer
//!
//! Everything that touches processes and host paths lives here, below the
//! tool providers in `core`.
//!
//! ## Modules
//!
//! - **`executor`**: The process execution shim. Runs tools natively or through
//!   the alternate shell, with blocking and async launch flavours, output
//!   capture, failure classification and idempotent termination.
//! - **`path_translator`**: Pure conversion between native drive paths
//!   (`C:\...`) and their alternate-environment form (`/mnt/c/...`).
//! - **`shell`**: Platform shell selection, shell quoting of command lines and
//!   `PATH` lookups.

pub mod executor;
pub mod path_translator;
pub mod shell;
