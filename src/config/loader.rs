// Settings loader
// Reads ./codemend.toml when present; the OLLAMA_HOST environment variable
// overrides the server address afterwards.

use anyhow::{Context, Result};
use std::fs;
use std::io;

use super::settings::{Settings, SETTINGS_FILE};

/// Load settings from the working directory.
///
/// A missing file means defaults. An unreadable or malformed file is logged
/// and also means defaults; a broken settings file never keeps the tool from
/// running. Values that parsed but make no sense (a zero attempt budget, a
/// schemeless URL) are rejected up front instead.
pub fn load_settings() -> Result<Settings> {
    let mut settings = match fs::read_to_string(SETTINGS_FILE) {
        Ok(contents) => match toml::from_str::<Settings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring malformed {}: {}", SETTINGS_FILE, e);
                Settings::default()
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => Settings::default(),
        Err(e) => {
            tracing::warn!("Could not read {}: {}", SETTINGS_FILE, e);
            Settings::default()
        }
    };

    if let Ok(host) = std::env::var("OLLAMA_HOST") {
        if !host.trim().is_empty() {
            settings.base_url = normalize_host(host.trim());
        }
    }
    settings.base_url = settings.base_url.trim_end_matches('/').to_string();

    settings
        .validate()
        .with_context(|| format!("Invalid settings (check {})", SETTINGS_FILE))?;

    Ok(settings)
}

/// `OLLAMA_HOST` is commonly set to a bare `host:port`; give it a scheme.
fn normalize_host(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}
