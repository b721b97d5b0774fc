//! Launching the user's default browser.

use tracing::{debug, warn};

/// Host capabilities the login flow needs.
pub trait Runtime: Send + Sync {
    /// Opens `url` in the default browser. Best-effort: failures are
    /// logged, never returned.
    fn open(&self, url: &str);
}

/// Opens URLs with the platform's default handler
/// (`open` on macOS, `xdg-open` on Linux, the URL protocol handler on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRuntime;

impl SystemRuntime {
    pub fn new() -> Self {
        Self
    }
}

impl Runtime for SystemRuntime {
    fn open(&self, url: &str) {
        debug!(%url, "opening browser");
        if let Err(e) = open::that_detached(url) {
            warn!(%url, error = %e, "failed to open browser");
        }
    }
}
