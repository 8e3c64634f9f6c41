// src/system/executor.rs

//! The process execution shim.
//!
//! Every external tool goes through [`ProcessShim`]. In [`ExecutionMode::Native`]
//! the program runs as given. In [`ExecutionMode::Alternate`] each argument that
//! classifies as a native drive path is translated, and the whole call is
//! re-routed through the alternate shell as `<shell> -ic "<program args...>"`.
//!
//! The rewrite decision lives in [`ProcessShim::prepare`]; the blocking and
//! async launchers only differ in how they start the [`PreparedCommand`].

use crate::constants::{ALTERNATE_SHELL_FLAG, SHELL_COMMAND_NOT_FOUND};
use crate::system::path_translator::{self, PathForm};
use crate::system::shell::{self, QuoteError};
use std::borrow::Cow;
use std::fmt;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command as AsyncCommand};
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("'{program}' could not be found.")]
    NotFound { program: String },
    #[error("'{program}' could not be started: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with {}.", describe_exit(.code))]
    NonZeroExit {
        program: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    #[error(transparent)]
    InvalidArgument(#[from] QuoteError),
    #[error("Operation was cancelled by the user.")]
    Cancelled,
    #[error("The process outcome is no longer available (already collected or handed to a callback).")]
    OutcomeUnavailable,
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by a signal)".to_string(),
    }
}

pub type ExecResult = Result<CapturedOutput, ExecutionError>;

// --- Execution Mode ---

/// Where tools run. Built once from configuration and handed to the shim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Native,
    /// Commands run inside another environment reachable through `shell`.
    Alternate { shell: PathBuf },
}

impl ExecutionMode {
    pub fn is_alternate(&self) -> bool {
        matches!(self, Self::Alternate { .. })
    }

    /// A host path as the tool will see it.
    pub fn outbound_path(&self, path: &str) -> String {
        match self {
            Self::Native => path.to_string(),
            Self::Alternate { .. } => path_translator::to_alternate_form(path),
        }
    }

    /// A path printed by the tool, as the host sees it.
    pub fn inbound_path(&self, path: &str) -> String {
        match self {
            Self::Native => path.to_string(),
            Self::Alternate { .. } => path_translator::to_native_form(path),
        }
    }
}

// --- Invocation Models ---

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

/// A program, its arguments and launch options. Built once, never mutated by the shim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    program: String,
    args: Vec<String>,
    options: ExecOptions,
}

impl CommandInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            options: ExecOptions::default(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }
}

/// What actually gets launched after the execution mode has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    /// The program the caller asked for, used in error reports.
    pub tool: String,
    /// True when `program` is a shell running `tool` for us.
    pub shell_wrapped: bool,
}

impl fmt::Display for PreparedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let program = self.program.to_string_lossy();
        match shell::join_command(&program, &self.args) {
            Ok(line) => f.write_str(&line),
            Err(_) => write!(f, "{} {}", program, self.args.join(" ")),
        }
    }
}

/// Exit code and raw output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CapturedOutput {
    pub fn stdout_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

// --- Launch Capability ---

/// Starts a [`PreparedCommand`]. `Handle` is whatever the caller gets back:
/// the finished output for blocking launches, a [`ProcessHandle`] for async ones.
pub trait Launch {
    type Handle;

    fn launch(&self, command: PreparedCommand) -> Result<Self::Handle, ExecutionError>;
}

/// Runs to completion on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingLaunch;

/// Spawns on the current tokio runtime and returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncLaunch;

impl Launch for BlockingLaunch {
    type Handle = CapturedOutput;

    fn launch(&self, command: PreparedCommand) -> Result<CapturedOutput, ExecutionError> {
        let mut process = StdCommand::new(&command.program);
        process
            .args(&command.args)
            .envs(command.env.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &command.cwd {
            process.current_dir(dunce::simplified(cwd));
        }

        let output = process
            .output()
            .map_err(|e| classify_spawn_error(&command, e))?;
        finish(
            &command,
            output.status.code(),
            output.status.success(),
            output.stdout,
            output.stderr,
        )
    }
}

impl Launch for AsyncLaunch {
    type Handle = ProcessHandle;

    fn launch(&self, command: PreparedCommand) -> Result<ProcessHandle, ExecutionError> {
        let mut process = AsyncCommand::new(&command.program);
        process
            .args(&command.args)
            .envs(command.env.iter().cloned())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            process.current_dir(dunce::simplified(cwd));
        }

        let child = process
            .spawn()
            .map_err(|e| classify_spawn_error(&command, e))?;
        let pid = child.id();
        log::trace!("Spawned '{}' with pid {:?}.", command.tool, pid);

        let (kill_tx, kill_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = supervise(child, kill_rx, &command).await;
            if done_tx.send(outcome).is_err() {
                log::trace!("Outcome of '{}' was not collected.", command.tool);
            }
        });

        Ok(ProcessHandle {
            pid,
            terminator: Terminator::new(kill_tx),
            completion: Some(done_rx),
        })
    }
}

/// Waits for the child while draining its pipes; a termination request kills it.
async fn supervise(
    mut child: Child,
    mut kill_rx: oneshot::Receiver<()>,
    command: &PreparedCommand,
) -> ExecResult {
    let stdout_reader = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_reader = tokio::spawn(read_stream(child.stderr.take()));

    // A dropped terminator disables the kill branch instead of firing it.
    let waited = tokio::select! {
        biased;
        status = child.wait() => Some(status),
        Ok(()) = &mut kill_rx => None,
    };

    let status = match waited {
        Some(status) => status.map_err(|source| ExecutionError::Spawn {
            program: command.tool.clone(),
            source,
        })?,
        None => {
            log::debug!(
                "Termination requested, killing '{}' (pid {:?})...",
                command.tool,
                child.id()
            );
            if let Err(e) = child.start_kill() {
                log::warn!("Failed to kill '{}': {}", command.tool, e);
            }
            child.wait().await.ok();
            stdout_reader.abort();
            stderr_reader.abort();
            return Err(ExecutionError::Cancelled);
        }
    };

    let stdout = stdout_reader.await.unwrap_or_default();
    let stderr = stderr_reader.await.unwrap_or_default();
    finish(command, status.code(), status.success(), stdout, stderr)
}

async fn read_stream<R>(stream: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut buffer = Vec::new();
    if let Some(mut stream) = stream {
        if let Err(e) = stream.read_to_end(&mut buffer).await {
            log::debug!("Failed to read child output: {}", e);
        }
    }
    buffer
}

fn classify_spawn_error(command: &PreparedCommand, error: io::Error) -> ExecutionError {
    let program = command.program.display().to_string();
    if error.kind() == ErrorKind::NotFound {
        ExecutionError::NotFound { program }
    } else {
        ExecutionError::Spawn {
            program,
            source: error,
        }
    }
}

fn finish(
    command: &PreparedCommand,
    code: Option<i32>,
    success: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
) -> ExecResult {
    let output = CapturedOutput {
        code,
        stdout,
        stderr,
    };
    if success {
        return Ok(output);
    }
    if command.shell_wrapped && code == Some(SHELL_COMMAND_NOT_FOUND) {
        return Err(ExecutionError::NotFound {
            program: command.tool.clone(),
        });
    }
    Err(ExecutionError::NonZeroExit {
        program: command.tool.clone(),
        code,
        stdout: output.stdout_text().into_owned(),
        stderr: output.stderr_text().into_owned(),
    })
}

// --- Process Handle ---

/// Requests termination of one process. Cloneable; only the first request
/// does anything, and a request after exit is a no-op.
#[derive(Debug, Clone)]
pub struct Terminator {
    signal: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl Terminator {
    fn new(sender: oneshot::Sender<()>) -> Self {
        Self {
            signal: Arc::new(Mutex::new(Some(sender))),
        }
    }

    fn inert() -> Self {
        Self {
            signal: Arc::new(Mutex::new(None)),
        }
    }

    pub fn terminate(&self) {
        let sender = match self.signal.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            if sender.send(()).is_err() {
                log::trace!("Termination requested after the process had already exited.");
            }
        }
    }
}

/// A running (or finished) child process started by the shim.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    terminator: Terminator,
    completion: Option<oneshot::Receiver<ExecResult>>,
}

impl ProcessHandle {
    /// A handle for a process that never started.
    fn finished() -> Self {
        Self {
            pid: None,
            terminator: Terminator::inert(),
            completion: None,
        }
    }

    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator.clone()
    }

    pub fn terminate(&self) {
        self.terminator.terminate();
    }

    /// Waits for the process to finish. Cancel-safe: dropping the future
    /// leaves the outcome in place for a later call.
    pub async fn wait(&mut self) -> ExecResult {
        let receiver = self
            .completion
            .as_mut()
            .ok_or(ExecutionError::OutcomeUnavailable)?;
        let received = receiver.await;
        self.completion = None;
        received.unwrap_or(Err(ExecutionError::OutcomeUnavailable))
    }
}

// --- The Shim ---

#[derive(Debug, Clone, Default)]
pub struct ProcessShim {
    mode: ExecutionMode,
}

impl ProcessShim {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &ExecutionMode {
        &self.mode
    }

    /// Applies the execution mode to an invocation.
    pub fn prepare(&self, invocation: &CommandInvocation) -> Result<PreparedCommand, ExecutionError> {
        let options = invocation.options();
        match &self.mode {
            ExecutionMode::Native => Ok(PreparedCommand {
                program: PathBuf::from(invocation.program()),
                args: invocation.arguments().to_vec(),
                cwd: options.cwd.clone(),
                env: options.env.clone(),
                tool: invocation.program().to_string(),
                shell_wrapped: false,
            }),
            ExecutionMode::Alternate { shell } => {
                let args = rewrite_args(invocation.arguments());
                let mut line = shell::join_command(invocation.program(), &args)?;
                // The host cwd means nothing on the other side; `cd` there instead.
                if let Some(cwd) = &options.cwd {
                    let dir = path_translator::to_alternate_form(&cwd.to_string_lossy());
                    line = shell::with_working_dir(&dir, &line)?;
                }
                Ok(PreparedCommand {
                    program: shell.clone(),
                    args: vec![ALTERNATE_SHELL_FLAG.to_string(), line],
                    cwd: None,
                    env: options.env.clone(),
                    tool: invocation.program().to_string(),
                    shell_wrapped: true,
                })
            }
        }
    }

    /// Prepares `invocation` for the current mode and starts it with `launcher`.
    pub fn dispatch<L: Launch>(
        &self,
        invocation: &CommandInvocation,
        launcher: &L,
    ) -> Result<L::Handle, ExecutionError> {
        let prepared = self.prepare(invocation)?;
        log::debug!("Launching: {}", prepared);
        launcher.launch(prepared)
    }

    /// Starts the invocation and returns at once. `on_complete` runs exactly
    /// once: right away if the process cannot be started, otherwise when it
    /// exits or is terminated. Must be called inside a tokio runtime.
    pub fn run_async<F>(&self, invocation: &CommandInvocation, on_complete: F) -> ProcessHandle
    where
        F: FnOnce(ExecResult) + Send + 'static,
    {
        match self.spawn_async(invocation) {
            Ok(handle) => {
                let ProcessHandle {
                    pid,
                    terminator,
                    completion,
                } = handle;
                tokio::spawn(async move {
                    let outcome = match completion {
                        Some(receiver) => receiver
                            .await
                            .unwrap_or(Err(ExecutionError::OutcomeUnavailable)),
                        None => Err(ExecutionError::OutcomeUnavailable),
                    };
                    on_complete(outcome);
                });
                ProcessHandle {
                    pid,
                    terminator,
                    completion: None,
                }
            }
            Err(e) => {
                log::debug!("Could not start '{}': {}", invocation.program(), e);
                on_complete(Err(e));
                ProcessHandle::finished()
            }
        }
    }

    /// Starts the invocation; the caller waits on (or terminates) the handle.
    pub fn spawn_async(&self, invocation: &CommandInvocation) -> Result<ProcessHandle, ExecutionError> {
        self.dispatch(invocation, &AsyncLaunch)
    }

    /// Runs the invocation to completion, blocking the calling thread.
    pub fn spawn_sync(&self, invocation: &CommandInvocation) -> ExecResult {
        self.dispatch(invocation, &BlockingLaunch)
    }

    /// Runs one command string through the platform shell and returns its stdout.
    ///
    /// The execution mode is not applied here: the string is opaque, so there
    /// are no argument tokens to translate.
    pub fn run_sync(&self, command_line: &str) -> Result<Vec<u8>, ExecutionError> {
        let (shell_program, flag) = shell::platform_shell();
        let tool = shlex::split(command_line)
            .and_then(|words| words.into_iter().next())
            .unwrap_or_else(|| shell_program.to_string());
        let prepared = PreparedCommand {
            program: PathBuf::from(shell_program),
            args: vec![flag.to_string(), command_line.to_string()],
            cwd: None,
            env: Vec::new(),
            tool,
            shell_wrapped: true,
        };
        log::debug!("Running shell command: {}", command_line);
        BlockingLaunch.launch(prepared).map(|output| output.stdout)
    }
}

/// Translates every argument that classifies as a native path; everything else
/// is returned byte-identical.
pub fn rewrite_args(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| match PathForm::classify(arg) {
            form @ PathForm::Native { .. } => form.into_alternate(),
            _ => arg.clone(),
        })
        .collect()
}

/// The directory a file lives in, used as the tool's working directory.
pub fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn alternate() -> ProcessShim {
        ProcessShim::new(ExecutionMode::Alternate {
            shell: PathBuf::from(r"C:\Windows\System32\bash.exe"),
        })
    }

    fn guru_invocation() -> CommandInvocation {
        CommandInvocation::new("guru").args([
            "-tags",
            "",
            "referrers",
            r"C:\src\app\main.go:#120",
        ])
    }

    /// Records what it was asked to launch instead of starting anything.
    struct RecordingLaunch {
        seen: Mutex<Vec<PreparedCommand>>,
    }

    impl Launch for RecordingLaunch {
        type Handle = ();

        fn launch(&self, command: PreparedCommand) -> Result<(), ExecutionError> {
            self.seen.lock().unwrap().push(command);
            Ok(())
        }
    }

    // --- Rewrite Tests ---

    #[test]
    fn test_native_mode_leaves_invocation_untouched() {
        let shim = ProcessShim::new(ExecutionMode::Native);
        let invocation = guru_invocation().cwd("/work").env("GOFLAGS", "-mod=mod");
        let prepared = shim.prepare(&invocation).unwrap();

        assert_eq!(prepared.program, PathBuf::from("guru"));
        assert_eq!(prepared.args, invocation.arguments());
        assert_eq!(prepared.cwd, Some(PathBuf::from("/work")));
        assert_eq!(prepared.env, vec![("GOFLAGS".to_string(), "-mod=mod".to_string())]);
        assert!(!prepared.shell_wrapped);
    }

    #[test]
    fn test_alternate_mode_wraps_in_shell_with_two_args() {
        let prepared = alternate().prepare(&guru_invocation()).unwrap();

        assert_eq!(prepared.program, PathBuf::from(r"C:\Windows\System32\bash.exe"));
        assert_eq!(prepared.args.len(), 2);
        assert_eq!(prepared.args[0], "-ic");
        assert_eq!(
            shlex::split(&prepared.args[1]).unwrap(),
            vec!["guru", "-tags", "", "referrers", "/mnt/c/src/app/main.go:#120"]
        );
        assert_eq!(prepared.tool, "guru");
        assert!(prepared.shell_wrapped);
    }

    #[test]
    fn test_alternate_mode_moves_cwd_into_command() {
        let invocation = CommandInvocation::new("gorename").cwd(r"C:\src\my app");
        let prepared = alternate().prepare(&invocation).unwrap();

        assert_eq!(prepared.cwd, None);
        assert_eq!(
            shlex::split(&prepared.args[1]).unwrap(),
            vec!["cd", "/mnt/c/src/my app", "&&", "gorename"]
        );
    }

    #[test]
    fn test_rewrite_args_keeps_non_paths_byte_identical() {
        let args: Vec<String> = ["-offset", "\"tag\"", "/mnt/c/already", "x:\\", "Foo", "-d"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(rewrite_args(&args), args);
    }

    #[test]
    fn test_rewrite_args_translates_native_paths() {
        let args = vec![r"D:\go\src\x.go".to_string(), "-to".to_string()];
        assert_eq!(rewrite_args(&args), vec!["/mnt/d/go/src/x.go", "-to"]);
    }

    #[test]
    fn test_invalid_argument_is_rejected_before_launch() {
        let invocation = CommandInvocation::new("guru").arg("bad\0");
        let result = alternate().prepare(&invocation);
        assert!(matches!(result, Err(ExecutionError::InvalidArgument(_))));
    }

    #[test]
    fn test_dispatch_hands_prepared_command_to_launcher() {
        let launcher = RecordingLaunch {
            seen: Mutex::new(Vec::new()),
        };
        alternate().dispatch(&guru_invocation(), &launcher).unwrap();
        ProcessShim::default()
            .dispatch(&guru_invocation(), &launcher)
            .unwrap();

        let seen = launcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].shell_wrapped);
        assert_eq!(seen[1].program, PathBuf::from("guru"));
    }

    #[test]
    fn test_execution_mode_path_helpers() {
        let native = ExecutionMode::Native;
        assert_eq!(native.outbound_path(r"C:\a.go"), r"C:\a.go");
        assert_eq!(native.inbound_path("/mnt/c/a.go"), "/mnt/c/a.go");

        let alt = alternate();
        assert_eq!(alt.mode().outbound_path(r"C:\a.go"), "/mnt/c/a.go");
        assert_eq!(alt.mode().inbound_path("/mnt/c/a.go"), r"C:\a.go");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("/a/b.go")), Some(PathBuf::from("/a")));
        assert_eq!(parent_dir(Path::new("b.go")), None);
    }

    // --- Blocking Launch Tests ---

    #[test]
    fn test_spawn_sync_missing_program_is_not_found() {
        let invocation = CommandInvocation::new("goshim-test-no-such-tool-4c1d");
        let result = ProcessShim::default().spawn_sync(&invocation);
        assert!(matches!(result, Err(ExecutionError::NotFound { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_sync_captures_stdout() {
        let invocation = CommandInvocation::new("sh").args(["-c", "echo hello"]);
        let output = ProcessShim::default().spawn_sync(&invocation).unwrap();
        assert_eq!(output.stdout_text(), "hello\n");
        assert_eq!(output.code, Some(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_sync_non_zero_exit_carries_stderr() {
        let invocation = CommandInvocation::new("sh").args(["-c", "echo oops >&2; exit 3"]);
        match ProcessShim::default().spawn_sync(&invocation) {
            Err(ExecutionError::NonZeroExit {
                program,
                code,
                stderr,
                ..
            }) => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_sync_uses_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let invocation = CommandInvocation::new("pwd").cwd(dir.path());
        let output = ProcessShim::default().spawn_sync(&invocation).unwrap();
        let printed = PathBuf::from(output.stdout_text().trim());
        assert_eq!(
            dunce::canonicalize(printed).unwrap(),
            dunce::canonicalize(dir.path()).unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_sync_returns_stdout() {
        let stdout = ProcessShim::default().run_sync("echo hi | tr a-z A-Z").unwrap();
        assert_eq!(stdout, b"HI\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_sync_missing_command_is_not_found() {
        let result = ProcessShim::default().run_sync("goshim-test-no-such-tool-4c1d --version");
        match result {
            Err(ExecutionError::NotFound { program }) => {
                assert_eq!(program, "goshim-test-no-such-tool-4c1d");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_sync_ignores_alternate_mode() {
        let stdout = alternate().run_sync("echo native").unwrap();
        assert_eq!(stdout, b"native\n");
    }

    #[cfg(unix)]
    fn sh_alternate() -> ProcessShim {
        ProcessShim::new(ExecutionMode::Alternate {
            shell: PathBuf::from("/bin/sh"),
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_sync_alternate_runs_translated_command() {
        let invocation = CommandInvocation::new("echo").args(["a b", r"C:\x\y.go", "it's"]);
        let output = sh_alternate().spawn_sync(&invocation).unwrap();
        assert_eq!(output.stdout_text(), "a b /mnt/c/x/y.go it's\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_sync_alternate_missing_tool_is_not_found() {
        let invocation = CommandInvocation::new("goshim-test-no-such-tool-4c1d").arg(r"C:\x\y.go");
        match sh_alternate().spawn_sync(&invocation) {
            Err(ExecutionError::NotFound { program }) => {
                assert_eq!(program, "goshim-test-no-such-tool-4c1d");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_decodes_invalid_utf8_lossily() {
        let invocation = CommandInvocation::new("sh").args(["-c", "printf 'bad \\377' >&2; exit 1"]);
        match ProcessShim::default().spawn_sync(&invocation) {
            Err(ExecutionError::NonZeroExit { stderr, .. }) => {
                assert_eq!(stderr, "bad \u{FFFD}");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    // --- Async Launch Tests ---

    #[tokio::test]
    async fn test_run_async_reports_spawn_failure_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        let counter = calls.clone();
        let handle = ProcessShim::default().run_async(
            &CommandInvocation::new("goshim-test-no-such-tool-4c1d"),
            move |outcome| {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(outcome).ok();
            },
        );

        assert_eq!(handle.id(), None);
        handle.terminate();
        let outcome = rx.await.unwrap();
        assert!(matches!(outcome, Err(ExecutionError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_async_delivers_output() {
        let (tx, rx) = oneshot::channel();
        let invocation = CommandInvocation::new("sh").args(["-c", "echo async"]);
        let handle = ProcessShim::default().run_async(&invocation, move |outcome| {
            tx.send(outcome).ok();
        });

        assert!(handle.id().is_some());
        let output = rx.await.unwrap().unwrap();
        assert_eq!(output.stdout, b"async\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_kills_running_process() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        let counter = calls.clone();
        let invocation = CommandInvocation::new("sleep").arg("30");
        let handle = ProcessShim::default().run_async(&invocation, move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            tx.send(outcome).ok();
        });

        handle.terminate();
        handle.terminate();
        let outcome = tokio::time::timeout(Duration::from_secs(10), rx)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, Err(ExecutionError::Cancelled)));

        handle.terminate();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_after_completion_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = oneshot::channel();
        let counter = calls.clone();
        let handle = ProcessShim::default().run_async(&CommandInvocation::new("true"), move |outcome| {
            counter.fetch_add(1, Ordering::SeqCst);
            tx.send(outcome).ok();
        });

        assert!(rx.await.unwrap().is_ok());
        handle.terminate();
        handle.terminator().terminate();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_async_wait_collects_once() {
        let invocation = CommandInvocation::new("sh").args(["-c", "echo err >&2; exit 2"]);
        let mut handle = ProcessShim::default().spawn_async(&invocation).unwrap();

        match handle.wait().await {
            Err(ExecutionError::NonZeroExit { code, stderr, .. }) => {
                assert_eq!(code, Some(2));
                assert_eq!(stderr, "err\n");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            handle.wait().await,
            Err(ExecutionError::OutcomeUnavailable)
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_async_handle_has_no_outcome_to_wait_for() {
        let (tx, rx) = oneshot::channel();
        let mut handle = ProcessShim::default().run_async(&CommandInvocation::new("true"), move |outcome| {
            tx.send(outcome).ok();
        });
        assert!(matches!(
            handle.wait().await,
            Err(ExecutionError::OutcomeUnavailable)
        ));
        assert!(rx.await.unwrap().is_ok());
    }
}
