// src/core/notify.rs

/// Receives user-facing events from the providers. The CLI prints them; an
/// editor host would show them in its own UI.
pub trait Notifier: Send + Sync {
    /// `tool` could not be found, in the host or the alternate environment.
    fn tool_missing(&self, tool: &str);

    fn error(&self, message: &str);
}

/// Drops every event. Useful for library callers that report on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn tool_missing(&self, tool: &str) {
        log::debug!("Tool '{}' is missing (notification suppressed).", tool);
    }

    fn error(&self, message: &str) {
        log::debug!("Error notification suppressed: {}", message);
    }
}
