use log::debug;
use std::path::Path;
use tokio::process::Command;

/// Infers a `namespace/project` identifier from the `origin` remote of the
/// repository containing `dir`.
///
/// Missing git, no repository or no `origin` all yield `None`.
pub async fn origin_project_path(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(dir)
        .output()
        .await
        .inspect_err(|e| debug!("Could not run git: {e}"))
        .ok()?;

    if !output.status.success() {
        debug!("No origin remote in {}", dir.display());
        return None;
    }

    let remote = String::from_utf8_lossy(&output.stdout);
    let path = namespace_from_remote(remote.trim());
    debug!("origin {} -> {path:?}", remote.trim());
    path
}

/// Extracts the namespace path from a remote URL.
///
/// Accepts scp-like (`git@host:group/project.git`), `ssh://` and `http(s)://`
/// remotes.
pub fn namespace_from_remote(remote: &str) -> Option<String> {
    let remote = remote.trim();

    let path = if let Some((_, rest)) = remote.split_once("://") {
        // scheme://[user@]host[:port]/path
        rest.split_once('/').map(|(_, path)| path)?
    } else {
        // [user@]host:path
        remote.split_once(':').map(|(_, path)| path)?
    };

    let path = path
        .trim_matches('/')
        .trim_end_matches(".git")
        .trim_end_matches('/');

    if path.is_empty() || !path.contains('/') {
        return None;
    }
    Some(path.to_string())
}
