// src/core/rename.rs

//! Rename through `gorename`.
//!
//! When `diff` is available on the host, `gorename -d` prints the change as a
//! unified diff instead of writing files, and the diff becomes a
//! [`WorkspaceEdit`]. Without it gorename rewrites the files in place and the
//! returned edit is empty.

use crate::CancellationToken;
use crate::constants::{DIFF_TOOL, GORENAME};
use crate::core::diff;
use crate::core::document::TextDocument;
use crate::core::notify::Notifier;
use crate::core::provider::{ProviderError, ToolRunner};
use crate::models::{Position, WorkspaceEdit};
use crate::system::executor::{CommandInvocation, ExecResult, ExecutionError, ExecutionMode};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct RenameProvider {
    runner: ToolRunner,
}

impl RenameProvider {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// Renames the identifier at `position` to `new_name`.
    ///
    /// `Ok(None)` means nothing was done: gorename is missing or the request
    /// was cancelled.
    pub async fn rename(
        &self,
        doc: &TextDocument,
        position: Position,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        let mode = self.runner.snapshot_mode();
        let start = doc
            .word_range_at(position)
            .map_or(position, |range| range.start);
        let target = self.runner.target(doc, start, &mode)?;
        let with_diff = self.runner.locator().is_on_host_path(DIFF_TOOL);

        let mut args = vec![
            "-offset".to_string(),
            target.offset_arg(),
            "-to".to_string(),
            new_name.to_string(),
            "-tags".to_string(),
            self.runner.build_tags().to_string(),
        ];
        if with_diff {
            args.push("-d".to_string());
        }
        let invocation = CommandInvocation::new(self.runner.locator().resolve(GORENAME)).args(args);

        let outcome = self.runner.run(&invocation, cancel).await?;
        rename_from_outcome(outcome, with_diff, &mode, self.runner.notifier())
    }
}

/// Turns the outcome of a `gorename` run into an edit.
pub fn rename_from_outcome(
    outcome: ExecResult,
    with_diff: bool,
    mode: &ExecutionMode,
    notifier: &dyn Notifier,
) -> Result<Option<WorkspaceEdit>, ProviderError> {
    match outcome {
        Ok(output) if with_diff => edits_from_diff(&output.stdout_text(), mode).map(Some),
        Ok(_) => Ok(Some(WorkspaceEdit::new())),
        Err(ExecutionError::NotFound { program }) => {
            log::debug!("'{}' is not installed.", program);
            notifier.tool_missing(GORENAME);
            Ok(None)
        }
        Err(ExecutionError::Cancelled) => {
            log::debug!("Rename cancelled.");
            Ok(None)
        }
        Err(ExecutionError::NonZeroExit { stderr, .. }) => {
            let message = failure_message(&stderr);
            log::warn!("{}", message);
            Err(ProviderError::RenameFailed(message))
        }
        Err(e) => {
            let message = failure_message(&e.to_string());
            log::warn!("{}", message);
            Err(ProviderError::RenameFailed(message))
        }
    }
}

/// `Rename failed: <stderr on one line>`, or just `Rename failed`.
pub fn failure_message(stderr: &str) -> String {
    if stderr.is_empty() {
        "Rename failed".to_string()
    } else {
        format!("Rename failed: {}", stderr.replace('\n', " "))
    }
}

fn edits_from_diff(stdout: &str, mode: &ExecutionMode) -> Result<WorkspaceEdit, ProviderError> {
    let mut edit = WorkspaceEdit::new();
    for patch in diff::parse_unified_diff(stdout)? {
        let path = PathBuf::from(mode.inbound_path(&patch.file_name));
        for text_edit in patch.edits {
            edit.replace(&path, text_edit.range, text_edit.new_text);
        }
    }
    log::debug!(
        "Rename touches {} edit(s) in {} file(s).",
        edit.edit_count(),
        edit.file_count()
    );
    Ok(edit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notify::testing::RecordingNotifier;
    use crate::models::{Range, TextEdit};
    use crate::system::executor::CapturedOutput;
    use std::path::Path;

    const DIFF: &str = "\
--- /mnt/c/src/app/main.go\t2024-03-01 10:00:00 +0100
+++ /tmp/gorename-1\t2024-03-01 10:00:01 +0100
@@ -3 +3 @@
-func helloWorld() {}
+func greet() {}
";

    fn success(stdout: &str) -> ExecResult {
        Ok(CapturedOutput {
            code: Some(0),
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
        })
    }

    fn non_zero(stderr: &str) -> ExecResult {
        Err(ExecutionError::NonZeroExit {
            program: "gorename".to_string(),
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }

    #[test]
    fn test_failure_carries_stderr() {
        let notifier = RecordingNotifier::default();
        let result = rename_from_outcome(
            non_zero("main.go:3:6: ambiguous selector\nsecond line\n"),
            true,
            &ExecutionMode::Native,
            &notifier,
        );
        match result {
            Err(ProviderError::RenameFailed(message)) => {
                assert!(message.contains("ambiguous selector"));
                assert!(message.starts_with("Rename failed: "));
                assert!(!message.contains('\n'));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_failure_message_without_stderr() {
        assert_eq!(failure_message(""), "Rename failed");
        assert_eq!(failure_message("a\nb"), "Rename failed: a b");
    }

    #[test]
    fn test_missing_tool_notifies_and_does_nothing() {
        let notifier = RecordingNotifier::default();
        let outcome = Err(ExecutionError::NotFound {
            program: "gorename".to_string(),
        });
        let result = rename_from_outcome(outcome, true, &ExecutionMode::Native, &notifier).unwrap();

        assert!(result.is_none());
        assert_eq!(notifier.missing(), vec!["gorename"]);
    }

    #[test]
    fn test_cancelled_rename_does_nothing() {
        let notifier = RecordingNotifier::default();
        let result =
            rename_from_outcome(Err(ExecutionError::Cancelled), true, &ExecutionMode::Native, &notifier)
                .unwrap();
        assert!(result.is_none());
        assert!(notifier.missing().is_empty());
    }

    #[test]
    fn test_diff_becomes_workspace_edit_with_native_paths() {
        let notifier = RecordingNotifier::default();
        let mode = ExecutionMode::Alternate {
            shell: PathBuf::from("bash.exe"),
        };
        let edit = rename_from_outcome(success(DIFF), true, &mode, &notifier)
            .unwrap()
            .unwrap();

        let edits = edit.changes.get(Path::new(r"C:\src\app\main.go")).unwrap();
        assert_eq!(
            edits,
            &vec![TextEdit {
                range: Range::new(2, 0, 3, 0),
                new_text: "func greet() {}\n".to_string(),
            }]
        );
    }

    #[test]
    fn test_without_diff_the_edit_is_empty() {
        let notifier = RecordingNotifier::default();
        let edit = rename_from_outcome(success("Renamed 2 occurrences in 1 file.\n"), false, &ExecutionMode::Native, &notifier)
            .unwrap()
            .unwrap();
        assert!(edit.is_empty());
    }

    #[test]
    fn test_malformed_diff_is_an_error() {
        let notifier = RecordingNotifier::default();
        let result = rename_from_outcome(
            success("--- a.go\n+++ a.go\n@@ -1,4 +1,4 @@\n-x\n"),
            true,
            &ExecutionMode::Native,
            &notifier,
        );
        assert!(matches!(result, Err(ProviderError::Diff(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rename_end_to_end_with_fake_tools() {
        use crate::core::tools::ToolLocator;
        use crate::models::ToolsConfig;
        use crate::system::executor::ProcessShim;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Arc;

        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("main.go");
        std::fs::write(&doc_path, "package main\n\nfunc helloWorld() {}\n").unwrap();

        // Prints a diff only when asked for one with -d, like gorename.
        let script = dir.path().join("fake-gorename");
        let body = format!(
            "#!/bin/sh\n[ \"$7\" = \"-d\" ] || exit 9\n[ \"$4\" = \"greet\" ] || exit 8\n\
             cat <<'EOF'\n--- {path}\n+++ {path}.new\n@@ -3 +3 @@\n\
             -func helloWorld() {{}}\n+func greet() {{}}\nEOF\n",
            path = doc_path.display()
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        std::fs::write(bin.join("diff"), "").unwrap();

        let tools = ToolsConfig {
            gorename: Some(script.display().to_string()),
            ..ToolsConfig::default()
        };
        let mode = ExecutionMode::Native;
        let path_value = bin.display().to_string();
        let locator = ToolLocator::with_lookup(
            &tools,
            &mode,
            move |key| (key == "PATH").then(|| path_value.clone()),
            None,
        );
        let notifier = Arc::new(RecordingNotifier::default());
        let provider = RenameProvider::new(ToolRunner::new(ProcessShim::new(mode), locator, "", notifier));

        let doc = TextDocument::open(&doc_path).unwrap();
        let edit = provider
            .rename(&doc, Position::new(2, 9), "greet", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(edit.file_count(), 1);
        let edits = edit.changes.get(&doc_path).unwrap();
        assert_eq!(edits[0].range, Range::new(2, 0, 3, 0));
        assert_eq!(edits[0].new_text, "func greet() {}\n");
    }
}
