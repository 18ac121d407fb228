//! Application settings storage
//!
//! Stores configuration like the backend URL and catalog source in a JSON file in
//! the app data directory. Environment variables take precedence over stored values.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "laeringsassistent";

pub const ENV_BACKEND_URL: &str = "LAERINGSASSISTENT_BACKEND_URL";
pub const ENV_API_KEY: &str = "LAERINGSASSISTENT_API_KEY";

const DEFAULT_BACKEND_URL: &str = "https://fjwpfesqfwtozaciphnc.supabase.co/functions/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the summary/suggestion functions
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Optional bearer token sent with backend requests
    #[serde(default)]
    pub api_key: Option<String>,
    /// Goal catalog: file path or http(s) URL
    #[serde(default = "default_catalog_source")]
    pub catalog_source: String,
    #[serde(default)]
    pub database_path: Option<String>,
    /// Where exported PDFs land (None = current directory)
    #[serde(default)]
    pub export_dir: Option<String>,
    #[serde(default = "default_wrap_columns")]
    pub wrap_columns: usize,
    /// No timeout unless set
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_catalog_source() -> String {
    "kompetencemal.json".to_string()
}

fn default_wrap_columns() -> usize {
    90
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            api_key: None,
            catalog_source: default_catalog_source(),
            database_path: None,
            export_dir: None,
            wrap_columns: default_wrap_columns(),
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    /// Load settings from disk or fall back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                Settings::default()
            }),
            Err(e) => {
                log::warn!("Could not read settings file {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    /// Save settings to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;

        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Backend base URL (env var first, then stored setting), validated
    pub fn backend_url(&self) -> Result<String> {
        let raw = env_override(ENV_BACKEND_URL).unwrap_or_else(|| self.backend_url.clone());
        validate_backend_url(&raw)
    }

    /// Bearer token (env var first, then stored setting)
    pub fn api_key(&self) -> Option<String> {
        env_override(ENV_API_KEY).or_else(|| self.api_key.clone().filter(|k| !k.is_empty()))
    }

    /// Masked API key for display (shows first 8 / last 4 chars)
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key().map(|key| mask_key(&key))
    }

    pub fn set_backend_url(&mut self, url: &str) -> Result<()> {
        self.backend_url = validate_backend_url(url)?;
        Ok(())
    }

    /// Database path: explicit setting, else `activities.db` in the data dir
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("activities.db"))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Platform data directory for this app
/// Counts characters, not bytes, so multi-byte keys never split mid-char
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 12 {
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Accepts http/https URLs; strips trailing slashes so endpoints join cleanly
fn validate_backend_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::Config(format!("backend URL '{}': {}", raw, e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Config(format!(
            "backend URL '{}' must use http or https",
            raw
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mask_key_ascii() {
        assert_eq!(mask_key("sk-abcdefghijklmnop"), "sk-abcde...mnop");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn test_mask_key_multibyte() {
        // 'æ' sits on the 8th character boundary
        assert_eq!(mask_key("abcdefgæhijklmnop"), "abcdefgæ...mnop");
        assert_eq!(mask_key("nøgleøæå"), "********");
        assert_eq!(mask_key("abcdefghijklmnoæøå"), "abcdefgh...oæøå");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json"));
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.wrap_columns, 90);
        assert!(settings.request_timeout_secs.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"catalog_source": "goals.json"}"#).unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.catalog_source, "goals.json");
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let settings = Settings::load(&path);
        assert_eq!(settings.catalog_source, "kompetencemal.json");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        settings.set_backend_url("http://localhost:54321/functions/v1/").unwrap();
        settings.wrap_columns = 70;
        settings.save(&path).unwrap();

        let reloaded = Settings::load(&path);
        assert_eq!(reloaded.backend_url, "http://localhost:54321/functions/v1");
        assert_eq!(reloaded.wrap_columns, 70);
    }

    #[test]
    fn test_rejects_non_http_backend() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set_backend_url("ftp://example.com"),
            Err(Error::Config(_))
        ));
        assert!(settings.set_backend_url("not a url").is_err());
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
    }

    #[test]
    fn test_database_path_default() {
        let settings = Settings::default();
        let dir = PathBuf::from("/tmp/data");
        assert_eq!(settings.database_path(&dir), dir.join("activities.db"));
    }
}
