mod presenter;
mod progress;
mod tables;

use console::{style, StyledObject};
use std::fmt::Display;

pub use presenter::Presenter;
pub use progress::Spinner;
pub use tables::{OutputFormat, TableOptions};

/// Resource names and section titles.
pub fn heading(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().bold().underlined()
}

/// The label half of a `label: value` detail line.
pub fn label(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// IDs, paths and URLs shown next to a label.
pub fn value(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

/// Names the user should notice, like the signed-in account.
pub fn emphasis(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().bold()
}

pub fn success(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn failure(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

/// Work in progress and warnings.
pub fn pending(text: impl Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

/// Prints the `devops` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        style("🦊 devops").magenta().bold(),
        label(env!("CARGO_PKG_VERSION")),
        label("GitLab groups, projects and CI/CD variables")
    );
}

/// Prints a non-fatal warning to stderr.
pub fn warn(message: impl Display) {
    log::warn!("{message}");
    eprintln!("{} {}", pending("warning:"), message);
}
