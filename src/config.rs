use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::Token;
use crate::error::{DevopsError, Result};

pub const CONFIG_FILE: &str = "gitlab.config.json";
const APP_DIR: &str = "devops";

/// Credentials as persisted on disk.
///
/// Both fields are optional so that a reset can be written as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// An effective host/token pair, ready to build a client with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub token: Token,
}

impl StoredConfig {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            token: Some(token.into()),
        }
    }
}

/// Per-user credential file.
///
/// Lives at `<config dir>/devops/gitlab.config.json`:
/// - Linux: `~/.config/devops/gitlab.config.json`
/// - macOS: `~/Library/Application Support/devops/gitlab.config.json`
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Opens the store in the platform-specific config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform has no config directory.
    pub fn default_location() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| DevopsError::Config("No config directory found".into()))?
            .join(APP_DIR);
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Reads the stored config.
    ///
    /// A missing file (or directory) is not an error: it means nothing has
    /// been configured yet and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read(&self) -> Result<Option<StoredConfig>> {
        let path = self.path();
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&contents).map(Some).map_err(|e| {
            DevopsError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Replaces the stored config.
    ///
    /// The directory is created when missing and the file is swapped in with
    /// a rename, so readers never see a half-written document.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write(&self, config: &StoredConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let path = self.path();
        let tmp_path = self.dir.join(format!(".{CONFIG_FILE}.tmp"));
        let contents = serde_json::to_string(config)?;

        write_private(&tmp_path, contents.as_bytes())?;
        fs::rename(&tmp_path, &path)?;

        debug!("Config written to {}", path.display());
        Ok(())
    }

    /// Forgets host and token by writing an empty document.
    pub fn reset(&self) -> Result<()> {
        self.write(&StoredConfig::default())
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_directory_is_unconfigured() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("does-not-exist"));

        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_write_creates_directory_and_round_trips() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path().join("nested").join("devops"));

        let config = StoredConfig::new("https://gitlab.example.com", "glpat-test");
        store.write(&config).unwrap();

        let loaded = store.read().unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_reset_writes_empty_object() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path());

        store
            .write(&StoredConfig::new("https://gitlab.com", "glpat-test"))
            .unwrap();
        store.reset().unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{}");

        assert_eq!(store.read().unwrap(), Some(StoredConfig::default()));
    }

    #[test]
    fn test_written_document_uses_host_and_token_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path());

        store
            .write(&StoredConfig::new("https://gitlab.com", "glpat-test"))
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["host"], "https://gitlab.com");
        assert_eq!(raw["token"], "glpat-test");
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.read().unwrap_err();
        assert!(matches!(err, DevopsError::Config(_)));
        assert!(err.to_string().contains(CONFIG_FILE));
    }

    #[cfg(unix)]
    #[test]
    fn test_config_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(temp_dir.path());
        store
            .write(&StoredConfig::new("https://gitlab.com", "glpat-test"))
            .unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
