// Settings: defaults for prompts and a few knobs, read from an optional
// JSON file in the user's config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Suggested server for the connect prompt.
    pub server: Option<String>,
    pub port: u16,
    pub use_tls: bool,
    /// Suggested user name for the login prompt.
    pub username: Option<String>,
    /// How many of the newest messages `fetch` shows.
    pub fetch_limit: usize,
    pub preview_chars: usize,
    pub attachments_dir: PathBuf,
    pub connect_timeout_secs: u64,
    pub upload_folder: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: None,
            port: 993,
            use_tls: true,
            username: None,
            fetch_limit: 10,
            preview_chars: 50,
            attachments_dir: PathBuf::from("attachments"),
            connect_timeout_secs: 30,
            upload_folder: "Sent".into(),
        }
    }
}

impl Settings {
    /// `<config dir>/imap-shell/config.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("imap-shell").join("config.json"))
    }

    /// Load from `path`, or the default location when `None`. A missing
    /// file gives the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Settings::default()),
        };
        if !path.exists() {
            return Ok(Settings::default());
        }
        let data = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("Parsing config {}", path.display()))
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(data)?;
        Ok(settings)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
