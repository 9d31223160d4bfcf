/// Progress and state-change notification.
///
/// Long operations (full lattice rebuild, full re-render) block the caller;
/// these events are an advisory side channel so a host can show busy state.
/// They are delivered synchronously from within the triggering call and are
/// not a cancellation mechanism. The pipeline owns its listener lists; there
/// is no global registry.

use colored::Colorize;

/// A start or finish notice for a potentially long operation.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    /// `true` announces work in progress; `false` clears a previously shown
    /// message.
    pub busy: bool,
}

impl ProgressEvent {
    pub fn start(message: &str) -> Self {
        Self {
            message: message.to_string(),
            busy: true,
        }
    }

    pub fn finish(message: &str) -> Self {
        Self {
            message: message.to_string(),
            busy: false,
        }
    }
}

/// Receives progress events.
pub trait ProgressListener {
    fn progress_update(&self, event: &ProgressEvent);
}

/// Notified when something important about the view changes, for example a
/// new SOM being loaded.
pub trait ViewObserver {
    fn view_updated(&self);
}

/// Progress listener that reports to the console.
pub struct ConsoleProgress;

impl ProgressListener for ConsoleProgress {
    fn progress_update(&self, event: &ProgressEvent) {
        if event.busy {
            println!("{}", event.message.yellow());
        } else {
            println!("{}", event.message.green());
        }
    }
}
