use log::info;
use std::process::Command;

use crate::error::{DevopsError, Result};

/// Opens URLs for the user.
pub trait Browser {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands URLs to the platform's default opener.
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        info!("Opening {url}");

        let output = if cfg!(target_os = "macos") {
            Command::new("open").arg(url).output()
        } else if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", "start", "", url]).output()
        } else {
            Command::new("xdg-open").arg(url).output()
        }?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DevopsError::Browser(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}
