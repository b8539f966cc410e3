use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://story.snapchat.com";

/// Runtime settings, read from a JSON file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub snapchat_base_url: String,
    pub request_timeout_seconds: u64,
    /// Scheme ("http" / "https") to proxy URL.
    pub proxies: Option<HashMap<String, String>>,
    pub verify_ssl: bool,
    pub max_retries: u32,
    pub concurrency: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapchat_base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: 15,
            proxies: None,
            verify_ssl: true,
            max_retries: 2,
            concurrency: 4,
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        warn!(
            "Settings file '{}' not found. Falling back to built-in defaults.",
            path.display()
        );
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse settings JSON {}", path.display()))?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// One username per line; blank lines and `#` comments are ignored.
pub fn load_usernames(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        bail!("Usernames file '{}' does not exist", path.display());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read usernames file {}", path.display()))?;
    let usernames: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect();

    if usernames.is_empty() {
        bail!("No usernames found in '{}'", path.display());
    }

    info!("Loaded {} usernames from {}", usernames.len(), path.display());
    Ok(usernames)
}
