//! Console notifier

use host::Notifier;
use tracing::info;

/// Prints status lines to stderr; stdout stays free for piping.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show(&self, message: &str) {
        info!(notice = message, "notification");
        eprintln!("{message}");
    }
}
