use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::{failure, pending, success};

/// Spinner shown on stderr while waiting for GitLab.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn start(message: impl std::fmt::Display) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_draw_target(ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("  {msg} {spinner}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(pending(message).to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn succeed(self, message: impl std::fmt::Display) {
        self.pb
            .finish_with_message(success(format!("{message} ✓")).to_string());
    }

    pub fn fail(self, message: impl std::fmt::Display) {
        self.pb
            .finish_with_message(failure(format!("{message} ✗")).to_string());
    }
}
