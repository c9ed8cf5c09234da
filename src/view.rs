//! UI surfaces the workflow drives.
//!
//! The controller never touches a concrete UI. It calls a
//! [`WorkflowView`]: a browser binding, the terminal view of the CLI, or a
//! recording view in tests.
//!
//! # Example
//!
//! ```rust
//! use aadhaar_gen_client::WorkflowView;
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct Toasts(Mutex<Vec<String>>);
//!
//! impl WorkflowView for Toasts {
//!     fn toast(&self, message: &str, _visible_for: std::time::Duration) {
//!         self.0.lock().unwrap().push(message.to_string());
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The three independently tracked busy controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indicator {
    /// The main "generate" button.
    Submit,
    /// Confirm/cancel inside the date-of-birth prompt.
    Dob,
    /// The "download PDF" button.
    Pdf,
}

impl Indicator {
    pub fn busy_label(self) -> &'static str {
        match self {
            Indicator::Submit | Indicator::Dob => "Generating...",
            Indicator::Pdf => "Creating PDF...",
        }
    }

    pub fn idle_label(self) -> &'static str {
        match self {
            Indicator::Submit => "Generate Aadhaar Card",
            Indicator::Dob => "Confirm",
            Indicator::Pdf => "Download Aadhaar PDF",
        }
    }
}

/// Called by the workflow as it moves between states.
///
/// All methods default to no-ops so implementations only override what they
/// render.
pub trait WorkflowView: Send + Sync {
    /// Disable the control and show its spinner, or the reverse.
    fn set_busy(&self, indicator: Indicator, busy: bool) {
        let _ = (indicator, busy);
    }

    fn show_password_error(&self, message: &str) {
        let _ = message;
    }

    fn clear_password_error(&self) {}

    /// Make the manual password field visible and focus it.
    fn reveal_password_input(&self) {}

    fn open_dob_modal(&self, subtitle: &str) {
        let _ = subtitle;
    }

    fn show_dob_error(&self, message: &str) {
        let _ = message;
    }

    fn close_dob_modal(&self) {}

    /// Point the two preview surfaces at absolute URLs.
    fn set_previews(&self, front_url: &str, back_url: &str) {
        let _ = (front_url, back_url);
    }

    /// Mirror the preview URLs onto the per-face download links.
    fn set_download_links(&self, front_url: &str, back_url: &str) {
        let _ = (front_url, back_url);
    }

    fn reveal_preview(&self) {}

    /// Hide the instructions panel for the rest of the session.
    fn hide_instructions(&self) {}

    /// Transient notification that dismisses itself after `visible_for`.
    fn toast(&self, message: &str, visible_for: Duration) {
        let _ = (message, visible_for);
    }

    /// Blocking, generic failure notice.
    fn alert(&self, message: &str) {
        let _ = message;
    }

    /// A file was saved on the user's behalf.
    fn save_download(&self, path: &Path) {
        let _ = path;
    }
}

/// A view that renders nothing.
pub struct NoopView;

impl WorkflowView for NoopView {}

/// Shared handle stored by the controller.
pub type SharedView = Arc<dyn WorkflowView>;

/// Holds one indicator busy until dropped.
///
/// Released on every exit path, including early returns and `?`.
#[must_use = "the indicator is released as soon as the guard is dropped"]
pub struct BusyGuard {
    view: SharedView,
    indicator: Indicator,
}

impl BusyGuard {
    pub fn acquire(view: &SharedView, indicator: Indicator) -> Self {
        view.set_busy(indicator, true);
        Self {
            view: Arc::clone(view),
            indicator,
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.view.set_busy(self.indicator, false);
    }
}
