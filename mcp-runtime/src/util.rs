use std::io::Write;

use serde::{Deserialize, Serialize};

use tassel_core::canvas::CanvasCredentials;

/// Credentials written by `tassel-mcp connect` (0600, user config dir).
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub base_url: String,
    pub access_token: String,
}

pub fn config_path() -> std::path::PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("tassel");
    config_dir.join("config.json")
}

pub fn load_credentials() -> Option<StoredCredentials> {
    let path = config_path();
    let data = std::fs::read_to_string(&path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn save_credentials(creds: &StoredCredentials) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_string_pretty(creds)?;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(&path)?;
    file.write_all(data.as_bytes())?;

    Ok(())
}

/// Resolution order: explicit values, then environment, then stored config.
/// `None` means "not connected" — callers surface that as a tool error, not
/// a crash.
pub fn resolve_credentials(
    explicit_url: Option<String>,
    explicit_token: Option<String>,
) -> Option<CanvasCredentials> {
    let stored = load_credentials();

    let base_url = explicit_url
        .or_else(|| std::env::var("TASSEL_CANVAS_URL").ok())
        .or_else(|| stored.as_ref().map(|creds| creds.base_url.clone()))?;
    let access_token = explicit_token
        .or_else(|| std::env::var("TASSEL_CANVAS_TOKEN").ok())
        .or_else(|| stored.map(|creds| creds.access_token))?;

    Some(CanvasCredentials {
        base_url,
        access_token,
    })
}

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

#[cfg(not(unix))]
trait OpenOptionsExt {
    fn mode(&mut self, _mode: u32) -> &mut Self;
}

#[cfg(not(unix))]
impl OpenOptionsExt for std::fs::OpenOptions {
    fn mode(&mut self, _mode: u32) -> &mut Self {
        self
    }
}
